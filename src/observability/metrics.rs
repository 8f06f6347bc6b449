//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Own the names of the three request instruments
//! - Record request count, error count and duration with role labels
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `oas_request_count` (counter): requests started, by operation/route/method/role
//! - `oas_errors_count` (counter): requests that ended on a failure path
//! - `oas_request_duration_ms` (histogram): latency in fractional milliseconds
//!
//! An optional prefix is joined with `_` in front of every name.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::config::ObservabilityConfig;

pub const REQUEST_COUNT: &str = "oas_request_count";
pub const ERRORS_COUNT: &str = "oas_errors_count";
pub const REQUEST_DURATION: &str = "oas_request_duration_ms";

/// Label set attached to one request's measurements.
pub type Labels = Vec<(&'static str, String)>;

/// Which side of the HTTP exchange is being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
        }
    }
}

/// The process-wide bundle of request instruments.
///
/// Built once at startup and shared by every dispatcher and round-tripper.
/// Recording is delegated to whatever `metrics` recorder is installed.
#[derive(Debug, Clone)]
pub struct Instrumentation {
    requests: String,
    errors: String,
    duration: String,
}

impl Instrumentation {
    pub fn new(prefix: Option<&str>) -> Self {
        let name = |base: &str| match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}_{base}"),
            _ => base.to_string(),
        };
        Self {
            requests: name(REQUEST_COUNT),
            errors: name(ERRORS_COUNT),
            duration: name(REQUEST_DURATION),
        }
    }

    /// Instruments named with the configured `metric_prefix`.
    pub fn from_config(config: &ObservabilityConfig) -> Self {
        Self::new(config.metric_prefix.as_deref())
    }

    pub fn request_count_name(&self) -> &str {
        &self.requests
    }

    pub fn errors_count_name(&self) -> &str {
        &self.errors
    }

    pub fn duration_name(&self) -> &str {
        &self.duration
    }

    /// Register descriptions and units with the installed recorder.
    pub fn describe(&self) {
        describe_counter!(self.requests.clone(), Unit::Count, "Requests started");
        describe_counter!(self.errors.clone(), Unit::Count, "Requests that ended with an error");
        describe_histogram!(
            self.duration.clone(),
            Unit::Milliseconds,
            "Request duration in milliseconds"
        );
    }

    pub fn record_request(&self, labels: &Labels) {
        counter!(self.requests.clone(), labels).increment(1);
    }

    pub fn record_error(&self, labels: &Labels) {
        counter!(self.errors.clone(), labels).increment(1);
    }

    pub fn record_duration(&self, labels: &Labels, millis: f64) {
        histogram!(self.duration.clone(), labels).record(millis);
    }
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Convert an elapsed duration to fractional milliseconds without truncation.
pub fn elapsed_millis(elapsed: Duration) -> f64 {
    elapsed.as_nanos() as f64 / 1_000_000.0
}

/// Error raised while installing the metrics exporter.
#[derive(Debug, thiserror::Error)]
pub enum MetricsInitError {
    #[error("failed to build Prometheus exporter: {0}")]
    Build(#[from] BuildError),

    #[error("a global metrics recorder is already installed")]
    AlreadyInstalled,
}

/// Install the Prometheus recorder globally and serve scrapes on `addr`.
///
/// Must be called from within a Tokio runtime; the scrape listener runs as a
/// background task.
pub fn init_metrics(
    addr: SocketAddr,
    instruments: &Instrumentation,
) -> Result<PrometheusHandle, MetricsInitError> {
    let (recorder, exporter) = PrometheusBuilder::new().with_http_listener(addr).build()?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|_| MetricsInitError::AlreadyInstalled)?;
    instruments.describe();

    tokio::spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "Metrics exporter stopped");
        }
    });

    tracing::info!(
        address = %addr,
        requests = instruments.request_count_name(),
        errors = instruments.errors_count_name(),
        duration = instruments.duration_name(),
        "Metrics exporter listening"
    );
    Ok(handle)
}
