//! Shared utilities for integration tests.
//!
//! - `MetricsProbe`: a thread-local (or, once per binary, global) Prometheus
//!   recorder plus a parser for its rendered text, queried by metric name and
//!   label subset
//! - `SpanProbe`: a `tracing_subscriber` layer that records span fields and
//!   counts how often each span is closed

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::subscriber::DefaultGuard;
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// One parsed sample line.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub value: f64,
}

impl Sample {
    fn has_labels(&self, wanted: &[(&str, &str)]) -> bool {
        wanted
            .iter()
            .all(|(k, v)| self.labels.get(*k).map(String::as_str) == Some(*v))
    }
}

pub struct MetricsProbe {
    recorder: Option<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl MetricsProbe {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        Self {
            recorder: Some(recorder),
            handle,
        }
    }

    /// Install a fresh probe as the process-wide recorder, for work that runs
    /// on runtime worker threads. Threads with a local probe keep using theirs.
    /// At most once per test binary.
    pub fn install_global() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        assert!(
            metrics::set_global_recorder(recorder).is_ok(),
            "a global recorder is already installed"
        );
        Self {
            recorder: None,
            handle,
        }
    }

    /// Make this probe the recorder for the current thread.
    pub fn install(&self) -> metrics::LocalRecorderGuard<'_> {
        metrics::set_default_local_recorder(
            self.recorder
                .as_ref()
                .expect("probe is installed globally"),
        )
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.render().lines().filter_map(parse_line).collect()
    }

    /// Sum of a counter over every series carrying `labels`.
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> f64 {
        let total = format!("{name}_total");
        self.sum(|s| s.name == name || s.name == total, labels)
    }

    /// Number of histogram observations over every series carrying `labels`.
    pub fn histogram_count(&self, name: &str, labels: &[(&str, &str)]) -> f64 {
        let count = format!("{name}_count");
        self.sum(|s| s.name == count, labels)
    }

    /// Label sets of every histogram series, for absence checks.
    pub fn histogram_series(&self, name: &str) -> Vec<HashMap<String, String>> {
        let count = format!("{name}_count");
        self.samples()
            .into_iter()
            .filter(|s| s.name == count)
            .map(|s| s.labels)
            .collect()
    }

    fn sum(&self, matches: impl Fn(&Sample) -> bool, labels: &[(&str, &str)]) -> f64 {
        self.samples()
            .iter()
            .filter(|s| matches(s) && s.has_labels(labels))
            .map(|s| s.value)
            .sum()
    }
}

fn parse_line(line: &str) -> Option<Sample> {
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (series, value) = line.rsplit_once(' ')?;
    let value = value.parse().ok()?;

    let (name, labels) = match series.find('{') {
        Some(open) => {
            let body = series[open + 1..].strip_suffix('}')?;
            (&series[..open], parse_labels(body))
        }
        None => (series, HashMap::new()),
    };

    Some(Sample {
        name: name.to_string(),
        labels,
        value,
    })
}

/// Parse `k="v",k2="v2"`, honouring `\"`, `\\` and `\n` escapes.
fn parse_labels(body: &str) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    let mut chars = body.chars().peekable();

    loop {
        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        if key.is_empty() {
            break;
        }
        if chars.next() != Some('"') {
            break;
        }

        let mut value = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('n') => value.push('\n'),
                    Some(other) => value.push(other),
                    None => break,
                },
                '"' => break,
                other => value.push(other),
            }
        }
        labels.insert(key.trim_start_matches(',').to_string(), value);

        if chars.peek() == Some(&',') {
            chars.next();
        }
    }

    labels
}

// ---------------------------------------------------------------------------
// Spans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SpanRecord {
    pub name: &'static str,
    pub fields: HashMap<String, String>,
    pub closed: usize,
    id: u64,
}

impl SpanRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Layer recording every span the code under test opens.
#[derive(Clone, Default)]
pub struct SpanProbe {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl SpanProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the default subscriber for the current thread.
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    /// Spans with the given name, in creation order.
    pub fn spans(&self, name: &str) -> Vec<SpanRecord> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S: Subscriber> Layer<S> for SpanProbe {
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        self.spans.lock().unwrap().push(SpanRecord {
            name: attrs.metadata().name(),
            fields,
            closed: 0,
            id: id.into_u64(),
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut spans = self.spans.lock().unwrap();
        // Ids are reused after close, so only match open spans.
        if let Some(span) = spans
            .iter_mut()
            .rev()
            .find(|s| s.id == id.into_u64() && s.closed == 0)
        {
            values.record(&mut FieldVisitor(&mut span.fields));
        }
    }

    fn on_close(&self, id: Id, _ctx: Context<'_, S>) {
        let mut spans = self.spans.lock().unwrap();
        if let Some(span) = spans
            .iter_mut()
            .rev()
            .find(|s| s.id == id.into_u64() && s.closed == 0)
        {
            span.closed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_with_tricky_labels() {
        let sample =
            parse_line(r#"oas_request_count{route="/pet/{petId}",method="GET",note="a\"b"} 3"#)
                .unwrap();
        assert_eq!(sample.name, "oas_request_count");
        assert_eq!(sample.labels["route"], "/pet/{petId}");
        assert_eq!(sample.labels["method"], "GET");
        assert_eq!(sample.labels["note"], "a\"b");
        assert_eq!(sample.value, 3.0);
    }
}
