//! Outbound HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! PetClient (typed call)
//!     → builds Request<Body> against the configured base URL
//!     → round_tripper.rs (client span, labels, request counter, stopwatch)
//!         → RouteFinder adds operation/route labels when the path matches
//!     → transport.rs (hyper-util client with per-call timeout)
//!     → response or TransportError, returned unchanged
//! ```
//!
//! # Design Decisions
//! - The round-tripper is itself a `Transport`, so wrappers compose
//! - Observation never alters the response or the error

pub mod error;
pub mod pets;
pub mod round_tripper;
pub mod transport;

pub use error::ClientError;
pub use pets::PetClient;
pub use round_tripper::MeteredRoundTripper;
pub use transport::{HyperTransport, Transport, TransportError};
