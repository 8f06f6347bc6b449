//! Request-scoped measurement guard.
//!
//! # Responsibilities
//! - Increment the request counter as soon as a request begins
//! - Run the stopwatch and record exactly one duration sample
//! - Record failures (span annotation + error counter) at most once per request
//! - Treat a scope dropped before `finish` as a canceled request
//!
//! # Design Decisions
//! - All cleanup lives in `Drop`, so early returns, cancellation and unwinding
//!   are covered by the same code path
//! - Server error samples carry a `stage` label; client error samples reuse the
//!   request label set unchanged
//! - The duration sample carries `status` only when a response exists

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use tracing::Span;

use crate::observability::metrics::{elapsed_millis, Instrumentation, Labels, Role};
use crate::observability::tracing as spans;

/// Stage label used when a request is abandoned before completion.
pub const CANCELED_STAGE: &str = "Canceled";

#[derive(Debug, thiserror::Error)]
#[error("request canceled before completion")]
struct Canceled;

/// Measures one request from begin to drop.
#[derive(Debug)]
pub struct RequestScope {
    role: Role,
    instruments: Arc<Instrumentation>,
    labels: Labels,
    span: Span,
    started: Instant,
    status: Option<StatusCode>,
    failed: bool,
    finished: bool,
}

impl RequestScope {
    /// Start measuring. The request counter is incremented immediately.
    pub fn begin(role: Role, instruments: Arc<Instrumentation>, mut labels: Labels, span: Span) -> Self {
        labels.insert(0, ("role", role.as_str().to_string()));
        let started = Instant::now();
        instruments.record_request(&labels);

        Self {
            role,
            instruments,
            labels,
            span,
            started,
            status: None,
            failed: false,
            finished: false,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Whether an error has already been recorded.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Annotate the span and increment the error counter.
    ///
    /// Only the first call per request has an effect.
    pub fn record_error(&mut self, stage: &'static str, error: &dyn std::error::Error) {
        if self.failed {
            return;
        }
        self.failed = true;

        spans::record_error(&self.span, stage, error);
        match self.role {
            Role::Server => {
                let mut labels = self.labels.clone();
                labels.push(("stage", stage.to_string()));
                self.instruments.record_error(&labels);
            }
            Role::Client => self.instruments.record_error(&self.labels),
        }
    }

    /// Complete the request. The duration is recorded when `self` drops here.
    pub fn finish(mut self, status: Option<StatusCode>) {
        if let Some(status) = status {
            spans::record_status(&self.span, status);
        }
        self.status = status;
        self.finished = true;
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if !self.finished && !self.failed {
            self.record_error(CANCELED_STAGE, &Canceled);
        }

        let millis = elapsed_millis(self.started.elapsed());
        match self.status {
            Some(status) => {
                let mut labels = self.labels.clone();
                labels.push(("status", status.as_u16().to_string()));
                self.instruments.record_duration(&labels, millis);
            }
            None => self.instruments.record_duration(&self.labels, millis),
        }

        tracing::debug!(
            parent: &self.span,
            role = self.role.as_str(),
            duration_ms = millis,
            status = self.status.map(|s| s.as_u16()),
            failed = self.failed,
            "Request measured"
        );
    }
}
