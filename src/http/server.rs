//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `/health` plus the API service as fallback
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener
//! - Stop accepting and drain in-flight requests on shutdown

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::dispatch::ApiService;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

/// HTTP server for the API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    pub fn new<H>(service: Arc<ApiService<H>>, config: &ApiConfig) -> Self
    where
        H: ?Sized + Send + Sync + 'static,
    {
        Self {
            router: Self::build_router(service, config),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<H>(service: Arc<ApiService<H>>, config: &ApiConfig) -> Router
    where
        H: ?Sized + Send + Sync + 'static,
    {
        Router::new()
            .route("/health", get(health_handler))
            .fallback(api_handler::<H>)
            .with_state(service)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn api_handler<H>(
    State(service): State<Arc<ApiService<H>>>,
    request: Request<Body>,
) -> Response<Body>
where
    H: ?Sized + Send + Sync + 'static,
{
    service.handle(request).await
}

async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
