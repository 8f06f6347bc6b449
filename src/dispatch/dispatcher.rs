//! The instrumented dispatcher.
//!
//! # Responsibilities
//! - Open a server span and start the stopwatch for every request
//! - Count the request before any decoding happens
//! - Run decode, handler call and encode inside the span
//! - On failure: record the stage on span and counters, then delegate to
//!   the error handler
//! - Record exactly one duration sample and end the span

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use tracing::Instrument;

use crate::dispatch::endpoint::Endpoint;
use crate::dispatch::error::{DispatchError, OperationContext};
use crate::dispatch::error_handler::{ErrorHandler, JsonErrorHandler};
use crate::http::RequestContext;
use crate::observability::tracing as spans;
use crate::observability::{Instrumentation, Labels, RequestScope, Role};
use crate::routing::{OperationDescriptor, PathArgs};

/// Runs endpoints against a business handler with full instrumentation.
pub struct Dispatcher<H: ?Sized> {
    handler: Arc<H>,
    instruments: Arc<Instrumentation>,
    errors: Arc<dyn ErrorHandler>,
    request_timeout: Option<Duration>,
}

impl<H: ?Sized> Clone for Dispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            instruments: self.instruments.clone(),
            errors: self.errors.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<H> Dispatcher<H>
where
    H: ?Sized + Send + Sync + 'static,
{
    pub fn new(handler: Arc<H>, instruments: Arc<Instrumentation>) -> Self {
        Self {
            handler,
            instruments,
            errors: Arc::new(JsonErrorHandler),
            request_timeout: None,
        }
    }

    /// Replace the default JSON error handler.
    pub fn with_error_handler(mut self, errors: impl ErrorHandler) -> Self {
        self.errors = Arc::new(errors);
        self
    }

    /// Deadline exposed to codecs and handlers through [`RequestContext`].
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    pub fn instruments(&self) -> &Arc<Instrumentation> {
        &self.instruments
    }

    /// Handle one request for `endpoint`.
    ///
    /// Never fails: every error becomes telemetry plus the error handler's
    /// response. Dropping the returned future records a canceled request.
    pub async fn dispatch<E>(
        &self,
        endpoint: &E,
        args: PathArgs,
        request: Request<Body>,
    ) -> Response<Body>
    where
        E: Endpoint<H> + ?Sized,
    {
        let operation = endpoint.descriptor();
        let span = spans::server_span(operation);
        let mut scope = RequestScope::begin(
            Role::Server,
            self.instruments.clone(),
            server_labels(operation),
            span.clone(),
        );
        let ctx = RequestContext::new(operation, &request, self.request_timeout, span.clone());

        let response = match self
            .run(endpoint, &ctx, args, request)
            .instrument(span.clone())
            .await
        {
            Ok(response) => response,
            Err(error) => {
                scope.record_error(error.stage().as_str(), &error);
                self.errors.handle(&ctx, &error)
            }
        };

        scope.finish(Some(response.status()));
        response
    }

    async fn run<E>(
        &self,
        endpoint: &E,
        ctx: &RequestContext,
        args: PathArgs,
        request: Request<Body>,
    ) -> Result<Response<Body>, DispatchError>
    where
        E: Endpoint<H> + ?Sized,
    {
        let context = OperationContext::from(ctx.operation());

        let decoded = endpoint
            .decode(ctx, args, request)
            .await
            .map_err(|e| DispatchError::decode(context, e))?;
        // Held until encoding is done.
        let (request, _release) = decoded.into_parts();

        let response = endpoint
            .call(&*self.handler, ctx, request)
            .await
            .map_err(|e| DispatchError::internal(context, e))?;

        endpoint
            .encode(ctx, response)
            .map_err(|e| DispatchError::encode(context, e))
    }
}

fn server_labels(operation: &OperationDescriptor) -> Labels {
    vec![
        ("operation", operation.id.to_string()),
        ("route", operation.path_pattern.to_string()),
        ("method", operation.method.to_string()),
    ]
}
