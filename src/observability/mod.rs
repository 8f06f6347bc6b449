//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     config.observability
//!     → logging.rs (tracing subscriber: env filter + fmt layer)
//!     → metrics.rs (Instrumentation bundle, Prometheus exporter)
//!
//! Every inbound or outbound request:
//!     → tracing.rs (server/client span with OpenTelemetry field names)
//!     → scope.rs (request counter +1, stopwatch, error recording)
//!     → on scope drop: one duration sample, span handle released
//! ```
//!
//! # Design Decisions
//! - One Instrumentation bundle per process, shared via Arc
//! - Metric writes go through the `metrics` facade (atomic, lock-free)
//! - Durations are fractional milliseconds for both roles
//! - Cleanup runs from Drop so every exit path is covered, including cancellation

pub mod logging;
pub mod metrics;
pub mod scope;
pub mod tracing;

pub use self::metrics::{Instrumentation, Labels, Role};
pub use self::scope::RequestScope;
