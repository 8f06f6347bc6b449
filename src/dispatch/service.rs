//! Request entry point: route lookup plus endpoint table.
//!
//! # Responsibilities
//! - Resolve the operation for an inbound request
//! - Answer unknown paths with 404 and known paths under the wrong method
//!   with 405 plus an `Allow` header
//! - Hand matched requests to the dispatcher
//!
//! Unmatched requests never reach the dispatcher, so they produce no
//! operation telemetry.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use thiserror::Error;

use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::endpoint::{Endpoint, Route};
use crate::http::response;
use crate::routing::{Lookup, PatternError, RouteTable};

/// Error building an [`ApiService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid route: {0}")]
    Pattern(#[from] PatternError),

    #[error("operation {0:?} registered twice")]
    DuplicateOperation(&'static str),
}

/// Routes requests to instrumented endpoints.
pub struct ApiService<H: ?Sized> {
    routes: RouteTable,
    endpoints: HashMap<&'static str, Arc<dyn Route<H>>>,
    dispatcher: Dispatcher<H>,
}

impl<H> ApiService<H>
where
    H: ?Sized + Send + Sync + 'static,
{
    pub fn builder(dispatcher: Dispatcher<H>) -> ApiServiceBuilder<H> {
        ApiServiceBuilder {
            dispatcher,
            endpoints: Vec::new(),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn dispatcher(&self) -> &Dispatcher<H> {
        &self.dispatcher
    }

    /// Serve one request.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        match self.routes.lookup(request.method(), request.uri().path()) {
            Lookup::Found(found) => match self.endpoints.get(found.operation.id) {
                Some(endpoint) => endpoint.serve(&self.dispatcher, found.args, request).await,
                None => {
                    tracing::error!(
                        operation = found.operation.id,
                        "Route matched an operation without an endpoint"
                    );
                    response::not_found()
                }
            },
            Lookup::MethodNotAllowed(allowed) => {
                tracing::debug!(
                    method = %request.method(),
                    path = request.uri().path(),
                    "Method not allowed"
                );
                response::method_not_allowed(&allowed)
            }
            Lookup::NotFound => {
                tracing::debug!(path = request.uri().path(), "No route matched");
                response::not_found()
            }
        }
    }
}

/// Collects endpoints before the route table is compiled.
pub struct ApiServiceBuilder<H: ?Sized> {
    dispatcher: Dispatcher<H>,
    endpoints: Vec<Arc<dyn Route<H>>>,
}

impl<H> ApiServiceBuilder<H>
where
    H: ?Sized + Send + Sync + 'static,
{
    pub fn endpoint<E>(mut self, endpoint: E) -> Self
    where
        E: Endpoint<H>,
    {
        self.endpoints.push(Arc::new(endpoint));
        self
    }

    pub fn build(self) -> Result<ApiService<H>, ServiceError> {
        let routes = RouteTable::new(self.endpoints.iter().map(|e| e.operation()))?;

        let mut endpoints = HashMap::with_capacity(self.endpoints.len());
        for endpoint in self.endpoints {
            let id = endpoint.operation().id;
            if endpoints.insert(id, endpoint).is_some() {
                return Err(ServiceError::DuplicateOperation(id));
            }
        }

        tracing::info!(operations = routes.len(), "API service ready");

        Ok(ApiService {
            routes,
            endpoints,
            dispatcher: self.dispatcher,
        })
    }
}
