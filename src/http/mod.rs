//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → request.rs (request ID, per-request context)
//!     → [dispatch::ApiService picks the operation]
//!     → response.rs (JSON bodies, 404/405)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestContext, RequestIdExt, X_REQUEST_ID};
pub use server::ApiServer;
