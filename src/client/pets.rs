//! Typed petstore client.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::client::error::ClientError;
use crate::client::round_tripper::MeteredRoundTripper;
use crate::client::transport::{HyperTransport, Transport};
use crate::config::ClientConfig;
use crate::http::response::APPLICATION_JSON;
use crate::observability::Instrumentation;
use crate::petstore::{self, Pet, PetStatus};

const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Calls the petstore API through any [`Transport`].
#[derive(Clone)]
pub struct PetClient<T> {
    transport: T,
    base: Url,
}

impl PetClient<MeteredRoundTripper<HyperTransport>> {
    /// Metered hyper client for the `[client]` section: base URL, per-call
    /// timeout, and petstore route labels relative to the base path.
    pub fn from_config(
        config: &ClientConfig,
        instruments: Arc<Instrumentation>,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(&config.base_url)?;
        let transport = MeteredRoundTripper::new(HyperTransport::from_config(config), instruments)
            .with_route_finder(Arc::new(petstore::route_table()?))
            .with_base_path(base.path());
        Ok(Self { transport, base })
    }
}

impl<T: Transport> PetClient<T> {
    pub fn new(transport: T, base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            transport,
            base: Url::parse(base_url)?,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Path component of the base URL, without a trailing slash.
    pub fn base_path(&self) -> &str {
        self.base.path().trim_end_matches('/')
    }

    /// `POST /pet`
    pub async fn add_pet(&self, pet: &Pet) -> Result<Pet, ClientError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.url("/pet")?.as_str())
            .header(header::CONTENT_TYPE, APPLICATION_JSON)
            .body(Body::from(serde_json::to_vec(pet)?))?;

        let response = self.send(request).await?;
        match response.status() {
            StatusCode::OK => json_body(response).await,
            _ => Err(unexpected(response).await),
        }
    }

    /// `DELETE /pet/{petId}`
    pub async fn delete_pet(&self, pet_id: i64) -> Result<(), ClientError> {
        let request = self.empty_request(Method::DELETE, self.url(&format!("/pet/{pet_id}"))?)?;
        let response = self.send(request).await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            _ => Err(unexpected(response).await),
        }
    }

    /// `GET /pet/{petId}`; `None` when the store does not know the pet.
    pub async fn get_pet_by_id(&self, pet_id: i64) -> Result<Option<Pet>, ClientError> {
        let request = self.empty_request(Method::GET, self.url(&format!("/pet/{pet_id}"))?)?;
        let response = self.send(request).await?;
        match response.status() {
            StatusCode::OK => json_body(response).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(unexpected(response).await),
        }
    }

    /// `POST /pet/{petId}?name=..&status=..`
    pub async fn update_pet(
        &self,
        pet_id: i64,
        name: Option<&str>,
        status: Option<PetStatus>,
    ) -> Result<(), ClientError> {
        let mut url = self.url(&format!("/pet/{pet_id}"))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(name) = name {
                query.append_pair("name", name);
            }
            if let Some(status) = status {
                query.append_pair("status", status.as_str());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let request = self.empty_request(Method::POST, url)?;
        let response = self.send(request).await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            _ => Err(unexpected(response).await),
        }
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(Url::parse(&format!(
            "{}{}",
            self.base.as_str().trim_end_matches('/'),
            path
        ))?)
    }

    fn empty_request(&self, method: Method, url: Url) -> Result<Request<Body>, ClientError> {
        Ok(Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(Body::empty())?)
    }

    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, ClientError> {
        tracing::debug!(method = %request.method(), uri = %request.uri(), "Sending request");
        Ok(self.transport.round_trip(request).await?)
    }
}

async fn read_body(response: Response<Body>) -> Result<Bytes, ClientError> {
    axum::body::to_bytes(response.into_body(), MAX_RESPONSE_BYTES)
        .await
        .map_err(ClientError::Body)
}

async fn json_body<V: DeserializeOwned>(response: Response<Body>) -> Result<V, ClientError> {
    let bytes = read_body(response).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn unexpected(response: Response<Body>) -> ClientError {
    let status = response.status();
    let body = match read_body(response).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => e.to_string(),
    };
    ClientError::UnexpectedStatus { status, body }
}
