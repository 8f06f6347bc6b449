//! Business handler seam.

use async_trait::async_trait;
use axum::http::StatusCode;
use thiserror::Error;

use crate::dispatch::{BoxError, StatusError};
use crate::http::RequestContext;
use crate::petstore::types::{
    DeletePetParams, GetPetByIdParams, GetPetByIdResponse, Pet, UpdatePetParams,
};

/// Error returned by a [`Handler`].
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("pet {0} not found")]
    PetNotFound(i64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Other(#[from] BoxError),
}

impl HandlerError {
    /// HTTP status implied by the error, `None` for internal failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HandlerError::PetNotFound(_) => Some(StatusCode::NOT_FOUND),
            HandlerError::InvalidInput(_) => Some(StatusCode::BAD_REQUEST),
            HandlerError::Other(_) => None,
        }
    }

    /// Box the error for the dispatcher, keeping its HTTP status visible.
    pub fn into_boxed(self) -> BoxError {
        match self.status() {
            Some(status) => Box::new(StatusError::new(status, self.to_string())),
            None => Box::new(self),
        }
    }
}

/// Business logic for every petstore operation.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// `addPet`: store a new pet and return it with its id.
    async fn add_pet(&self, ctx: &RequestContext, pet: Pet) -> Result<Pet, HandlerError>;

    async fn delete_pet(
        &self,
        ctx: &RequestContext,
        params: DeletePetParams,
    ) -> Result<(), HandlerError>;

    async fn get_pet_by_id(
        &self,
        ctx: &RequestContext,
        params: GetPetByIdParams,
    ) -> Result<GetPetByIdResponse, HandlerError>;

    async fn update_pet(
        &self,
        ctx: &RequestContext,
        params: UpdatePetParams,
    ) -> Result<(), HandlerError>;
}
