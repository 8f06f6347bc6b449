//! Instrumented OpenAPI request pipeline.
//!
//! Server side: route table → instrumented dispatcher → endpoint codec and
//! business handler. Client side: typed client → metered round-tripper →
//! hyper transport. Both sides share one metrics bundle and emit
//! OpenTelemetry-shaped tracing spans.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod http;
pub mod routing;

// API surface
pub mod client;
pub mod petstore;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ApiConfig;
pub use http::ApiServer;
pub use lifecycle::Shutdown;
pub use observability::Instrumentation;
