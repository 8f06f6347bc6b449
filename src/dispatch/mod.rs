//! Instrumented operation dispatch.
//!
//! # Data Flow
//! ```text
//! Matched request (operation, path args, request)
//!     → service.rs (route table lookup, 404/405, endpoint table)
//!     → dispatcher.rs
//!         span start → stopwatch → request counter
//!         → Endpoint::decode     (DecodeParams / DecodeRequest on failure)
//!         → Endpoint::call       (Internal on failure)
//!         → Endpoint::encode     (EncodeResponse on failure)
//!     → failure: error.rs wraps with operation context
//!                → ErrorHandler writes the response
//!     → scope drop: one duration sample, span ends
//! ```
//!
//! # Design Decisions
//! - One generic dispatcher for every operation; endpoints only supply codec + call
//! - Errors never escape as panics; each becomes telemetry plus an HTTP response
//! - Decoded resources are released on every exit path via `Release`

pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod error_handler;
pub mod service;

pub use dispatcher::Dispatcher;
pub use endpoint::{Decoded, Endpoint, Release, Route};
pub use error::{BoxError, DecodeError, DispatchError, OperationContext, Stage, StatusError};
pub use error_handler::{ErrorHandler, JsonErrorHandler};
pub use service::{ApiService, ApiServiceBuilder, ServiceError};
