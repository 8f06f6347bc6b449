//! Server-side pipeline tests: one synthetic operation driven through
//! `ApiService` with a thread-local metrics recorder and span probe.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};

use common::{MetricsProbe, SpanProbe};
use oas_pipeline::dispatch::{
    ApiService, BoxError, DecodeError, Decoded, DispatchError, Dispatcher, Endpoint, Release,
    StatusError,
};
use oas_pipeline::http::RequestContext;
use oas_pipeline::observability::Instrumentation;
use oas_pipeline::routing::{OperationDescriptor, PathArgs};

const REQUESTS: &str = "test_oas_request_count";
const ERRORS: &str = "test_oas_errors_count";
const DURATION: &str = "test_oas_request_duration_ms";

static ECHO: OperationDescriptor =
    OperationDescriptor::new("echoNumber", "EchoNumber", Method::POST, "/echo/{n}");

/// Business side: counts handler calls.
#[derive(Default)]
struct Counters {
    handled: AtomicUsize,
}

/// `n < 0` fails in the handler, `n == 404` fails with a status,
/// `n == 13` fails in encode, `n == 999` sleeps.
struct EchoNumber;

#[async_trait]
impl Endpoint<Counters> for EchoNumber {
    type Request = i64;
    type Response = i64;

    fn descriptor(&self) -> &'static OperationDescriptor {
        &ECHO
    }

    async fn decode(
        &self,
        _ctx: &RequestContext,
        args: PathArgs,
        _request: Request<Body>,
    ) -> Result<Decoded<i64>, DecodeError> {
        let n = args
            .get("n")
            .unwrap_or_default()
            .parse::<i64>()
            .map_err(DecodeError::params)?;
        Ok(Decoded::new(n))
    }

    async fn call(&self, counters: &Counters, _ctx: &RequestContext, n: i64) -> Result<i64, BoxError> {
        counters.handled.fetch_add(1, Ordering::SeqCst);
        match n {
            999 => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(n)
            }
            404 => Err(Box::new(StatusError::new(StatusCode::NOT_FOUND, "no such number"))),
            n if n < 0 => Err("negative numbers are not supported".into()),
            n => Ok(n),
        }
    }

    fn encode(&self, _ctx: &RequestContext, n: i64) -> Result<Response<Body>, BoxError> {
        if n == 13 {
            return Err("unlucky number".into());
        }
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(n.to_string()))?)
    }
}

/// Same operation, but the decoded value holds a resource guard.
struct GuardedEcho;

#[async_trait]
impl Endpoint<Counters> for GuardedEcho {
    type Request = i64;
    type Response = i64;

    fn descriptor(&self) -> &'static OperationDescriptor {
        &ECHO
    }

    async fn decode(
        &self,
        ctx: &RequestContext,
        args: PathArgs,
        request: Request<Body>,
    ) -> Result<Decoded<i64>, DecodeError> {
        let (n, _) = EchoNumber.decode(ctx, args, request).await?.into_parts();
        Ok(Decoded::with_release(n, Release::new(|| {
            RELEASED.fetch_add(1, Ordering::SeqCst);
        })))
    }

    async fn call(&self, counters: &Counters, ctx: &RequestContext, n: i64) -> Result<i64, BoxError> {
        EchoNumber.call(counters, ctx, n).await
    }

    fn encode(&self, ctx: &RequestContext, n: i64) -> Result<Response<Body>, BoxError> {
        ENCODED.fetch_add(1, Ordering::SeqCst);
        EchoNumber.encode(ctx, n)
    }
}

// Only `GuardedEcho` touches these.
static RELEASED: AtomicUsize = AtomicUsize::new(0);
static ENCODED: AtomicUsize = AtomicUsize::new(0);

struct Harness {
    service: ApiService<Counters>,
    counters: Arc<Counters>,
}

fn harness() -> Harness {
    let counters = Arc::new(Counters::default());
    let dispatcher = Dispatcher::new(
        counters.clone(),
        Arc::new(Instrumentation::new(Some("test"))),
    );
    let service = ApiService::builder(dispatcher)
        .endpoint(EchoNumber)
        .build()
        .unwrap();
    Harness { service, counters }
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const OP: (&str, &str) = ("operation", "echoNumber");

#[tokio::test]
async fn test_success_records_request_and_duration_only() {
    let metrics = MetricsProbe::new();
    let _m = metrics.install();
    let spans = SpanProbe::new();
    let _s = spans.install();
    let h = harness();

    let response = h.service.handle(post("/echo/7")).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        metrics.counter(
            REQUESTS,
            &[
                ("role", "server"),
                OP,
                ("route", "/echo/{n}"),
                ("method", "POST")
            ]
        ),
        1.0
    );
    assert_eq!(metrics.counter(ERRORS, &[]), 0.0);
    assert_eq!(metrics.histogram_count(DURATION, &[OP, ("status", "200")]), 1.0);
    assert_eq!(metrics.histogram_count(DURATION, &[]), 1.0);

    let recorded = spans.spans("operation");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].closed, 1);
    assert_eq!(recorded[0].field("otel.name"), Some("EchoNumber"));
    assert_eq!(recorded[0].field("otel.kind"), Some("server"));
    assert_eq!(recorded[0].field("operation.id"), Some("echoNumber"));
    assert_eq!(recorded[0].field("http.response.status_code"), Some("200"));
    assert_eq!(recorded[0].field("error.stage"), None);

    assert_eq!(h.counters.handled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_path_param_fails_in_decode_params() {
    let metrics = MetricsProbe::new();
    let _m = metrics.install();
    let spans = SpanProbe::new();
    let _s = spans.install();
    let h = harness();

    let response = h.service.handle(post("/echo/seven")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error_message"]
        .as_str()
        .unwrap()
        .starts_with("operation EchoNumber (echoNumber): decode params:"));

    assert_eq!(metrics.counter(REQUESTS, &[OP]), 1.0);
    assert_eq!(metrics.counter(ERRORS, &[OP, ("stage", "DecodeParams")]), 1.0);
    assert_eq!(metrics.counter(ERRORS, &[]), 1.0);
    assert_eq!(metrics.histogram_count(DURATION, &[("status", "400")]), 1.0);

    // Handler never called.
    assert_eq!(h.counters.handled.load(Ordering::SeqCst), 0);

    let recorded = spans.spans("operation");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].closed, 1);
    assert_eq!(recorded[0].field("error.stage"), Some("DecodeParams"));
    assert_eq!(recorded[0].field("otel.status_code"), Some("ERROR"));
}

#[tokio::test]
async fn test_handler_error_is_internal_stage() {
    let metrics = MetricsProbe::new();
    let _m = metrics.install();
    let h = harness();

    let response = h.service.handle(post("/echo/-3")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error_message"],
        "operation EchoNumber (echoNumber): negative numbers are not supported"
    );

    assert_eq!(metrics.counter(ERRORS, &[("stage", "Internal")]), 1.0);
    assert_eq!(metrics.counter(ERRORS, &[]), 1.0);
    assert_eq!(metrics.histogram_count(DURATION, &[("status", "500")]), 1.0);
    assert_eq!(h.counters.handled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_status_error_sets_response_status() {
    let metrics = MetricsProbe::new();
    let _m = metrics.install();
    let h = harness();

    let response = h.service.handle(post("/echo/404")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(metrics.counter(ERRORS, &[("stage", "Internal")]), 1.0);
    assert_eq!(metrics.histogram_count(DURATION, &[("status", "404")]), 1.0);
}

#[tokio::test]
async fn test_encode_failure_is_encode_response_stage() {
    let metrics = MetricsProbe::new();
    let _m = metrics.install();
    let spans = SpanProbe::new();
    let _s = spans.install();
    let h = harness();

    let response = h.service.handle(post("/echo/13")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(metrics.counter(ERRORS, &[("stage", "EncodeResponse")]), 1.0);
    assert_eq!(metrics.counter(ERRORS, &[]), 1.0);
    assert_eq!(metrics.histogram_count(DURATION, &[]), 1.0);

    let recorded = spans.spans("operation");
    assert_eq!(recorded[0].field("error.stage"), Some("EncodeResponse"));
    assert_eq!(recorded[0].closed, 1);
}

#[tokio::test]
async fn test_canceled_request_still_measured() {
    let metrics = MetricsProbe::new();
    let _m = metrics.install();
    let spans = SpanProbe::new();
    let _s = spans.install();
    let h = harness();

    let outcome =
        tokio::time::timeout(Duration::from_millis(20), h.service.handle(post("/echo/999"))).await;
    assert!(outcome.is_err());

    assert_eq!(metrics.counter(REQUESTS, &[OP]), 1.0);
    assert_eq!(metrics.counter(ERRORS, &[OP, ("stage", "Canceled")]), 1.0);
    assert_eq!(metrics.histogram_count(DURATION, &[OP]), 1.0);
    // No response, so no status label.
    assert!(metrics
        .histogram_series(DURATION)
        .iter()
        .all(|labels| !labels.contains_key("status")));

    let recorded = spans.spans("operation");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].closed, 1);
    assert_eq!(recorded[0].field("error.stage"), Some("Canceled"));
}

#[tokio::test]
async fn test_release_runs_on_every_exit_path() {
    let counters = Arc::new(Counters::default());
    let dispatcher = Dispatcher::new(counters, Arc::new(Instrumentation::default()));
    let service = ApiService::builder(dispatcher)
        .endpoint(GuardedEcho)
        .build()
        .unwrap();

    let before = RELEASED.load(Ordering::SeqCst);

    // success, handler failure, encode failure
    for uri in ["/echo/1", "/echo/-1", "/echo/13"] {
        service.handle(post(uri)).await;
    }
    assert_eq!(RELEASED.load(Ordering::SeqCst) - before, 3);

    // cancellation
    let _ = tokio::time::timeout(Duration::from_millis(20), service.handle(post("/echo/999"))).await;
    assert_eq!(RELEASED.load(Ordering::SeqCst) - before, 4);

    // decode failure: nothing was acquired
    service.handle(post("/echo/x")).await;
    assert_eq!(RELEASED.load(Ordering::SeqCst) - before, 4);

    // encode ran for success and the encode failure only
    assert_eq!(ENCODED.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unmatched_requests_are_not_instrumented() {
    let metrics = MetricsProbe::new();
    let _m = metrics.install();
    let h = harness();

    let response = h.service.handle(post("/nothing/here")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::get("/echo/1").body(Body::empty()).unwrap();
    let response = h.service.handle(request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");

    assert_eq!(metrics.counter(REQUESTS, &[]), 0.0);
    assert_eq!(metrics.histogram_count(DURATION, &[]), 0.0);
}

#[tokio::test]
async fn test_custom_error_handler_status_is_recorded() {
    let metrics = MetricsProbe::new();
    let _m = metrics.install();

    let dispatcher = Dispatcher::new(
        Arc::new(Counters::default()),
        Arc::new(Instrumentation::new(Some("test"))),
    )
    .with_error_handler(|_: &RequestContext, error: &DispatchError| {
        Response::builder()
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .body(Body::from(error.stage().to_string()))
            .unwrap()
    });
    let service = ApiService::builder(dispatcher)
        .endpoint(EchoNumber)
        .build()
        .unwrap();

    let response = service.handle(post("/echo/nope")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(metrics.histogram_count(DURATION, &[("status", "422")]), 1.0);
    assert_eq!(metrics.counter(ERRORS, &[("stage", "DecodeParams")]), 1.0);
}

#[tokio::test]
async fn test_duplicate_operation_is_rejected() {
    let dispatcher = Dispatcher::new(
        Arc::new(Counters::default()),
        Arc::new(Instrumentation::default()),
    );
    let result = ApiService::builder(dispatcher)
        .endpoint(EchoNumber)
        .endpoint(GuardedEcho)
        .build();
    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_instrumentation() {
    const PARALLEL: usize = 32;

    let metrics = MetricsProbe::install_global();
    let Harness { service, counters } = harness();
    let service = Arc::new(service);

    let tasks: Vec<_> = (0..PARALLEL)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .handle(post(&format!("/echo/{}", 100 + i)))
                    .await
                    .status()
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let expected = PARALLEL as f64;
    assert_eq!(metrics.counter(REQUESTS, &[("role", "server"), OP]), expected);
    assert_eq!(metrics.histogram_count(DURATION, &[OP, ("status", "200")]), expected);
    assert_eq!(metrics.counter(ERRORS, &[]), 0.0);
    assert_eq!(counters.handled.load(Ordering::SeqCst), PARALLEL);
}
