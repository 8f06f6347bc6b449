//! The metered round-tripper.
//!
//! # Responsibilities
//! - Label every outgoing call with method, server address and port
//! - Add operation and route labels when the Route Finder knows the call
//! - Count the request before it is sent
//! - Record one duration sample per call, with `status` when a response exists
//! - Count transport failures with the same labels as the request
//!
//! # Design Decisions
//! - Purely observes: responses and errors are returned untouched
//! - Non-2xx responses are not errors at this layer

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, Uri};
use tracing::Instrument;

use crate::client::transport::{Transport, TransportError};
use crate::dispatch::Stage;
use crate::observability::tracing as spans;
use crate::observability::{Instrumentation, Labels, RequestScope, Role};
use crate::routing::RouteFinder;

/// A `Transport` wrapper that records request telemetry.
#[derive(Clone)]
pub struct MeteredRoundTripper<T> {
    inner: T,
    instruments: Arc<Instrumentation>,
    routes: Option<Arc<dyn RouteFinder>>,
    base_path: String,
}

impl<T: Transport> MeteredRoundTripper<T> {
    pub fn new(inner: T, instruments: Arc<Instrumentation>) -> Self {
        Self {
            inner,
            instruments,
            routes: None,
            base_path: String::new(),
        }
    }

    /// Label calls with the operation they target.
    pub fn with_route_finder(mut self, routes: Arc<dyn RouteFinder>) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Path prefix of the API, stripped before asking the Route Finder.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into().trim_end_matches('/').to_string();
        self
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn route_uri(&self, uri: &Uri) -> Option<Uri> {
        if self.base_path.is_empty() {
            return Some(uri.clone());
        }
        let path_and_query = uri.path_and_query()?.as_str();
        let rest = path_and_query.strip_prefix(self.base_path.as_str())?;
        if !rest.starts_with('/') {
            return None;
        }
        rest.parse().ok()
    }
}

/// Method, server address and port labels for an outgoing request.
pub(crate) fn base_labels<B>(request: &Request<B>) -> Labels {
    let uri = request.uri();
    let mut labels = vec![("method", request.method().to_string())];
    if let Some(host) = uri.host() {
        labels.push(("server_address", host.to_string()));
    }
    if let Some(port) = server_port(uri) {
        labels.push(("server_port", port.to_string()));
    }
    labels
}

fn server_port(uri: &Uri) -> Option<u16> {
    uri.port_u16().or_else(|| match uri.scheme_str() {
        Some("https") => Some(443),
        Some("http") => Some(80),
        _ => None,
    })
}

#[async_trait]
impl<T: Transport> Transport for MeteredRoundTripper<T> {
    async fn round_trip(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let span = spans::client_span(request.method(), request.uri());
        let mut labels = base_labels(&request);

        let operation = match (&self.routes, self.route_uri(request.uri())) {
            (Some(routes), Some(uri)) => routes.find_route(request.method(), &uri),
            _ => None,
        };
        if let Some(operation) = operation {
            spans::record_operation(&span, operation);
            labels.push(("operation", operation.id.to_string()));
            labels.push(("route", operation.path_pattern.to_string()));
        }

        let mut scope = RequestScope::begin(
            Role::Client,
            self.instruments.clone(),
            labels,
            span.clone(),
        );

        match self.inner.round_trip(request).instrument(span).await {
            Ok(response) => {
                scope.finish(Some(response.status()));
                Ok(response)
            }
            Err(error) => {
                scope.record_error(Stage::Transport.as_str(), &error);
                scope.finish(None);
                Err(error)
            }
        }
    }
}
