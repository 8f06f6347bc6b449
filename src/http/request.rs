//! Request identity and per-request context.
//!
//! # Responsibilities
//! - Assign a UUID request ID to requests that arrive without one
//! - Echo the request ID on the response
//! - Carry operation, deadline and span from dispatch to codec to handler
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The context is read-only; cancellation is the future being dropped

use std::time::{Duration, Instant};

use axum::http::{HeaderName, Method, Request, Uri};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

use crate::routing::OperationDescriptor;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that assigns a request ID when the client sent none.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Layer that copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Read the request ID header from a request.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
    }
}

/// Context for one dispatched operation.
///
/// Handed to the codec and the business handler. It carries the active span
/// so work done on behalf of the request can be parented to it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    operation: &'static OperationDescriptor,
    method: Method,
    uri: Uri,
    request_id: Option<String>,
    deadline: Option<Instant>,
    span: Span,
}

impl RequestContext {
    pub fn new<B>(
        operation: &'static OperationDescriptor,
        request: &Request<B>,
        timeout: Option<Duration>,
        span: Span,
    ) -> Self {
        Self {
            operation,
            method: request.method().clone(),
            uri: request.uri().clone(),
            request_id: request.request_id().map(str::to_string),
            deadline: timeout.map(|timeout| Instant::now() + timeout),
            span,
        }
    }

    pub fn operation(&self) -> &'static OperationDescriptor {
        self.operation
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
