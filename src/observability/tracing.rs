//! Request span construction and annotation.
//!
//! # Responsibilities
//! - Create one span per inbound (server) or outbound (client) request
//! - Name fields after OpenTelemetry conventions so a bridge layer can export them
//! - Annotate spans with the failing stage and error
//!
//! # Design Decisions
//! - Spans are plain `tracing` spans; ending a span means dropping its last handle
//! - Fields recorded later are declared up front as `Empty`
//! - `otel.status_message` carries the stage label, the error text goes into an event

use axum::http::{Method, StatusCode, Uri};
use tracing::field::Empty;
use tracing::Span;

use crate::routing::OperationDescriptor;

/// Span for one server-side operation dispatch.
pub fn server_span(operation: &OperationDescriptor) -> Span {
    tracing::info_span!(
        "operation",
        otel.name = operation.name,
        otel.kind = "server",
        operation.id = operation.id,
        http.route = operation.path_pattern,
        http.request.method = %operation.method,
        http.response.status_code = Empty,
        otel.status_code = Empty,
        otel.status_message = Empty,
        error.stage = Empty,
    )
}

/// Span for one outbound HTTP call.
pub fn client_span(method: &Method, uri: &Uri) -> Span {
    tracing::info_span!(
        "http_client_request",
        otel.kind = "client",
        http.request.method = %method,
        url.full = %uri,
        operation.id = Empty,
        http.route = Empty,
        http.response.status_code = Empty,
        otel.status_code = Empty,
        otel.status_message = Empty,
        error.stage = Empty,
    )
}

/// Attach the matched operation to a client span.
pub fn record_operation(span: &Span, operation: &OperationDescriptor) {
    span.record("operation.id", operation.id);
    span.record("http.route", operation.path_pattern);
}

pub fn record_status(span: &Span, status: StatusCode) {
    span.record("http.response.status_code", status.as_u16());
}

/// Mark the span as failed at `stage` and attach the error as an event.
pub fn record_error(span: &Span, stage: &'static str, error: &dyn std::error::Error) {
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_message", stage);
    span.record("error.stage", stage);
    tracing::warn!(parent: span, error = %error, stage, "Request failed");
}
