use axum::http::StatusCode;
use thiserror::Error;

use crate::client::transport::TransportError;
use crate::routing::PatternError;

/// Error returned by [`PetClient`](crate::client::PetClient) calls.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("invalid route table: {0}")]
    Routes(#[from] PatternError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to read response body: {0}")]
    Body(#[source] axum::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
}
