//! Dispatch error taxonomy.
//!
//! Every failure is wrapped with the operation it happened in before it is
//! recorded or surfaced.

use axum::http::StatusCode;
use thiserror::Error;

use crate::routing::OperationDescriptor;

/// Boxed error used at the codec and handler seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Operation name and id attached to every dispatch error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationContext {
    pub name: &'static str,
    pub id: &'static str,
}

impl From<&OperationDescriptor> for OperationContext {
    fn from(operation: &OperationDescriptor) -> Self {
        Self {
            name: operation.name,
            id: operation.id,
        }
    }
}

impl std::fmt::Display for OperationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Pipeline stage at which a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    DecodeParams,
    DecodeRequest,
    Internal,
    EncodeResponse,
    Transport,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DecodeParams => "DecodeParams",
            Stage::DecodeRequest => "DecodeRequest",
            Stage::Internal => "Internal",
            Stage::EncodeResponse => "EncodeResponse",
            Stage::Transport => "Transport",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by an endpoint's decoder.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Path, query or header parameters could not be decoded.
    #[error("{0}")]
    Params(#[source] BoxError),

    /// The request body could not be decoded.
    #[error("{0}")]
    Request(#[source] BoxError),
}

impl DecodeError {
    pub fn params(error: impl Into<BoxError>) -> Self {
        DecodeError::Params(error.into())
    }

    pub fn request(error: impl Into<BoxError>) -> Self {
        DecodeError::Request(error.into())
    }
}

/// Error returned by handlers that want a specific HTTP status.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StatusError {
    pub status: StatusCode,
    pub message: String,
}

impl StatusError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// A failed dispatch, tagged with the operation and stage.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("operation {context}: decode params: {source}")]
    DecodeParams {
        context: OperationContext,
        #[source]
        source: BoxError,
    },

    #[error("operation {context}: decode request: {source}")]
    DecodeRequest {
        context: OperationContext,
        #[source]
        source: BoxError,
    },

    #[error("operation {context}: {source}")]
    Internal {
        context: OperationContext,
        #[source]
        source: BoxError,
    },

    #[error("operation {context}: encode response: {source}")]
    EncodeResponse {
        context: OperationContext,
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    pub fn decode(context: OperationContext, error: DecodeError) -> Self {
        match error {
            DecodeError::Params(source) => DispatchError::DecodeParams { context, source },
            DecodeError::Request(source) => DispatchError::DecodeRequest { context, source },
        }
    }

    pub fn internal(context: OperationContext, source: BoxError) -> Self {
        DispatchError::Internal { context, source }
    }

    pub fn encode(context: OperationContext, source: BoxError) -> Self {
        DispatchError::EncodeResponse { context, source }
    }

    pub fn stage(&self) -> Stage {
        match self {
            DispatchError::DecodeParams { .. } => Stage::DecodeParams,
            DispatchError::DecodeRequest { .. } => Stage::DecodeRequest,
            DispatchError::Internal { .. } => Stage::Internal,
            DispatchError::EncodeResponse { .. } => Stage::EncodeResponse,
        }
    }

    pub fn context(&self) -> OperationContext {
        match self {
            DispatchError::DecodeParams { context, .. }
            | DispatchError::DecodeRequest { context, .. }
            | DispatchError::Internal { context, .. }
            | DispatchError::EncodeResponse { context, .. } => *context,
        }
    }

    /// Status to answer with: 400 for decode failures, 500 otherwise.
    ///
    /// Handlers can pick a different status by returning a [`StatusError`].
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::DecodeParams { .. } | DispatchError::DecodeRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            DispatchError::Internal { source, .. } => source
                .downcast_ref::<StatusError>()
                .map(|e| e.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            DispatchError::EncodeResponse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
