//! Error-to-response conversion.

use axum::body::Body;
use axum::http::Response;
use serde::Serialize;

use crate::dispatch::error::DispatchError;
use crate::http::response::json;
use crate::http::RequestContext;

/// Turns a dispatch failure into the response sent to the caller.
///
/// Called after the failure has been recorded on the span and counters.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(&self, ctx: &RequestContext, error: &DispatchError) -> Response<Body>;
}

impl<F> ErrorHandler for F
where
    F: Fn(&RequestContext, &DispatchError) -> Response<Body> + Send + Sync + 'static,
{
    fn handle(&self, ctx: &RequestContext, error: &DispatchError) -> Response<Body> {
        self(ctx, error)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_message: String,
}

/// Default handler: `{"error_message": "..."}` with 400 for decode
/// failures and 500 for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorHandler;

impl ErrorHandler for JsonErrorHandler {
    fn handle(&self, _ctx: &RequestContext, error: &DispatchError) -> Response<Body> {
        json(
            error.status_code(),
            &ErrorBody {
                error_message: error.to_string(),
            },
        )
    }
}
