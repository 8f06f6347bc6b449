//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Operation table (static OperationDescriptor per API operation)
//!     → matcher.rs (compile path patterns into segments)
//!     → router.rs (RouteTable, ordered by specificity)
//!
//! Inbound request (method, path)
//!     → RouteTable::lookup
//!     → Found(RouteMatch) | MethodNotAllowed(allowed) | NotFound
//!
//! Outbound request (method, URL)
//!     → RouteFinder::find_route
//!     → Some(descriptor) only adds telemetry attributes, never blocks the call
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Literal segments win over parameter segments
//! - No regex in the hot path
//! - Path parameters are percent-decoded before reaching the codec

pub mod matcher;
pub mod operation;
pub mod router;

pub use matcher::{PathArgs, PathPattern, PatternError};
pub use operation::OperationDescriptor;
pub use router::{Lookup, RouteFinder, RouteMatch, RouteTable};
