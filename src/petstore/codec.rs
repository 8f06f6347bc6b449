//! Request decoding and response encoding for the petstore operations.
//!
//! # Responsibilities
//! - Parse and validate path and query parameters (`DecodeParams` failures)
//! - Read and parse JSON request bodies (`DecodeRequest` failures)
//! - Serialize responses (`EncodeResponse` failures)

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, HeaderMap, Request, Response, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::dispatch::{BoxError, DecodeError};
use crate::http::response::APPLICATION_JSON;
use crate::petstore::types::{PetStatus, UpdatePetQuery};
use crate::routing::PathArgs;

/// A parameter that is missing or malformed.
#[derive(Debug, Error)]
#[error("{location} parameter {name:?}: {reason}")]
pub struct ParamError {
    pub location: &'static str,
    pub name: &'static str,
    pub reason: String,
}

impl ParamError {
    fn path(name: &'static str, reason: impl ToString) -> Self {
        Self {
            location: "path",
            name,
            reason: reason.to_string(),
        }
    }

    fn query(name: &'static str, reason: impl ToString) -> Self {
        Self {
            location: "query",
            name,
            reason: reason.to_string(),
        }
    }
}

/// Body-level decoding failure.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("unexpected Content-Type {0:?}, expected application/json")]
    ContentType(String),

    #[error("request body is required")]
    Empty,

    #[error("failed to read body: {0}")]
    Read(#[source] axum::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid field {field:?}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl BodyError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        BodyError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Parse the `petId` path parameter.
pub fn decode_pet_id(args: &PathArgs) -> Result<i64, DecodeError> {
    let raw = args
        .get("petId")
        .ok_or_else(|| DecodeError::params(ParamError::path("petId", "missing")))?;
    raw.parse::<i64>()
        .map_err(|e| DecodeError::params(ParamError::path("petId", e)))
}

/// Parse the `name` and `status` query parameters of `updatePet`.
pub fn decode_update_query(uri: &Uri) -> Result<(Option<String>, Option<PetStatus>), DecodeError> {
    let Query(query) = Query::<UpdatePetQuery>::try_from_uri(uri)
        .map_err(|e| DecodeError::params(ParamError::query("*", e.body_text())))?;

    let status = query
        .status
        .map(|raw| raw.parse::<PetStatus>())
        .transpose()
        .map_err(|e| DecodeError::params(ParamError::query("status", e)))?;

    Ok((query.name, status))
}

/// Read a JSON body of at most `limit` bytes.
pub async fn decode_json<T: DeserializeOwned>(
    request: Request<Body>,
    limit: usize,
) -> Result<T, DecodeError> {
    check_content_type(request.headers()).map_err(DecodeError::request)?;

    let bytes = axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|e| DecodeError::request(BodyError::Read(e)))?;
    if bytes.is_empty() {
        return Err(DecodeError::request(BodyError::Empty));
    }

    serde_json::from_slice(&bytes).map_err(|e| DecodeError::request(BodyError::Json(e)))
}

fn check_content_type(headers: &HeaderMap) -> Result<(), BodyError> {
    let value = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let mime = value.split(';').next().unwrap_or("").trim();
    if mime.eq_ignore_ascii_case(APPLICATION_JSON) {
        Ok(())
    } else {
        Err(BodyError::ContentType(value.to_string()))
    }
}

/// `200` with a JSON body.
pub fn encode_json<T: Serialize>(value: &T) -> Result<Response<Body>, BoxError> {
    let bytes = serde_json::to_vec(value)?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, APPLICATION_JSON)
        .body(Body::from(bytes))?)
}

/// A body-less response with `status`.
pub fn encode_empty(status: StatusCode) -> Result<Response<Body>, BoxError> {
    Ok(Response::builder().status(status).body(Body::empty())?)
}
