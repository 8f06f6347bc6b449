//! The per-operation seam between the generic dispatcher and generated code.
//!
//! An [`Endpoint`] supplies the three operation-specific pieces of a request:
//! decoding, calling the business handler, and encoding the result. The
//! dispatcher wraps all three in telemetry and error handling.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};

use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::error::{BoxError, DecodeError};
use crate::http::RequestContext;
use crate::routing::{OperationDescriptor, PathArgs};

/// Cleanup to run once the request has been fully handled.
///
/// Runs when dropped, so it fires on success, on failure and when the
/// request future is abandoned mid-flight.
pub struct Release(Option<Box<dyn FnOnce() + Send>>);

impl Release {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(f)))
    }
}

impl Drop for Release {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Release")
            .field("pending", &self.0.is_some())
            .finish()
    }
}

/// A decoded request plus any resources that must outlive encoding.
#[derive(Debug)]
pub struct Decoded<T> {
    value: T,
    release: Option<Release>,
}

impl<T> Decoded<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            release: None,
        }
    }

    pub fn with_release(value: T, release: Release) -> Self {
        Self {
            value,
            release: Some(release),
        }
    }

    pub fn into_parts(self) -> (T, Option<Release>) {
        (self.value, self.release)
    }
}

/// Codec and handler binding for one operation.
///
/// `H` is the business handler the endpoint calls into.
#[async_trait]
pub trait Endpoint<H>: Send + Sync + 'static
where
    H: ?Sized + Send + Sync + 'static,
{
    type Request: Send + 'static;
    type Response: Send + 'static;

    fn descriptor(&self) -> &'static OperationDescriptor;

    /// Decode path arguments, query, headers and body.
    async fn decode(
        &self,
        ctx: &RequestContext,
        args: PathArgs,
        request: Request<Body>,
    ) -> Result<Decoded<Self::Request>, DecodeError>;

    async fn call(
        &self,
        handler: &H,
        ctx: &RequestContext,
        request: Self::Request,
    ) -> Result<Self::Response, BoxError>;

    fn encode(
        &self,
        ctx: &RequestContext,
        response: Self::Response,
    ) -> Result<Response<Body>, BoxError>;
}

/// Type-erased endpoint, so one table can hold every operation.
#[async_trait]
pub trait Route<H>: Send + Sync
where
    H: ?Sized + Send + Sync + 'static,
{
    fn operation(&self) -> &'static OperationDescriptor;

    async fn serve(
        &self,
        dispatcher: &Dispatcher<H>,
        args: PathArgs,
        request: Request<Body>,
    ) -> Response<Body>;
}

#[async_trait]
impl<H, E> Route<H> for E
where
    H: ?Sized + Send + Sync + 'static,
    E: Endpoint<H>,
{
    fn operation(&self) -> &'static OperationDescriptor {
        self.descriptor()
    }

    async fn serve(
        &self,
        dispatcher: &Dispatcher<H>,
        args: PathArgs,
        request: Request<Body>,
    ) -> Response<Body> {
        dispatcher.dispatch(self, args, request).await
    }
}
