//! Response builders shared by the dispatcher, codecs and router fallbacks.
//!
//! # Design Decisions
//! - Builders never fail; a body that cannot be serialized becomes an empty 500
//! - JSON responses always carry `Content-Type: application/json`

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Response, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;

pub const APPLICATION_JSON: &str = "application/json";

/// Serialize `value` as the JSON body of a response.
pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            empty(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub fn empty(status: StatusCode) -> Response<Body> {
    status.into_response()
}

pub fn not_found() -> Response<Body> {
    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}

/// 405 with an `Allow` header listing the methods the path does accept.
pub fn method_not_allowed(allowed: &[Method]) -> Response<Body> {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut response = empty(StatusCode::METHOD_NOT_ALLOWED);
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}
