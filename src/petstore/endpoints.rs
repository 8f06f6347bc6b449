//! Operation table and endpoint bindings for the petstore API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};

use crate::config::ApiConfig;
use crate::dispatch::{ApiService, BoxError, DecodeError, Decoded, Dispatcher, Endpoint, ServiceError};
use crate::http::RequestContext;
use crate::observability::Instrumentation;
use crate::petstore::codec::{self, BodyError};
use crate::petstore::handler::Handler;
use crate::petstore::types::{
    DeletePetParams, GetPetByIdParams, GetPetByIdResponse, Pet, UpdatePetParams,
};
use crate::routing::{OperationDescriptor, PathArgs, PatternError, RouteTable};

pub static ADD_PET: OperationDescriptor =
    OperationDescriptor::new("addPet", "AddPet", Method::POST, "/pet");
pub static DELETE_PET: OperationDescriptor =
    OperationDescriptor::new("deletePet", "DeletePet", Method::DELETE, "/pet/{petId}");
pub static GET_PET_BY_ID: OperationDescriptor =
    OperationDescriptor::new("getPetById", "GetPetById", Method::GET, "/pet/{petId}");
pub static UPDATE_PET: OperationDescriptor =
    OperationDescriptor::new("updatePet", "UpdatePet", Method::POST, "/pet/{petId}");

/// Every petstore operation, in declaration order.
pub static OPERATIONS: [&OperationDescriptor; 4] = [&ADD_PET, &DELETE_PET, &GET_PET_BY_ID, &UPDATE_PET];

/// Route table over [`OPERATIONS`], also usable as a client Route Finder.
pub fn route_table() -> Result<RouteTable, PatternError> {
    RouteTable::new(OPERATIONS.iter().copied())
}

/// Build the instrumented petstore service around `handler`.
pub fn service<H>(
    handler: Arc<H>,
    instruments: Arc<Instrumentation>,
    config: &ApiConfig,
) -> Result<ApiService<H>, ServiceError>
where
    H: Handler + ?Sized,
{
    let dispatcher = Dispatcher::new(handler, instruments)
        .with_request_timeout(Duration::from_secs(config.timeouts.request_secs));

    ApiService::builder(dispatcher)
        .endpoint(AddPet {
            max_body_size: config.limits.max_body_size,
        })
        .endpoint(DeletePet)
        .endpoint(GetPetById)
        .endpoint(UpdatePet)
        .build()
}

/// `POST /pet`
#[derive(Debug, Clone, Copy)]
pub struct AddPet {
    pub max_body_size: usize,
}

#[async_trait]
impl<H: Handler + ?Sized> Endpoint<H> for AddPet {
    type Request = Pet;
    type Response = Pet;

    fn descriptor(&self) -> &'static OperationDescriptor {
        &ADD_PET
    }

    async fn decode(
        &self,
        _ctx: &RequestContext,
        _args: PathArgs,
        request: Request<Body>,
    ) -> Result<Decoded<Pet>, DecodeError> {
        let pet: Pet = codec::decode_json(request, self.max_body_size).await?;
        if pet.name.trim().is_empty() {
            return Err(DecodeError::request(BodyError::invalid("name", "must not be empty")));
        }
        Ok(Decoded::new(pet))
    }

    async fn call(&self, handler: &H, ctx: &RequestContext, pet: Pet) -> Result<Pet, BoxError> {
        handler.add_pet(ctx, pet).await.map_err(|e| e.into_boxed())
    }

    fn encode(&self, _ctx: &RequestContext, pet: Pet) -> Result<Response<Body>, BoxError> {
        codec::encode_json(&pet)
    }
}

/// `DELETE /pet/{petId}`
#[derive(Debug, Clone, Copy)]
pub struct DeletePet;

#[async_trait]
impl<H: Handler + ?Sized> Endpoint<H> for DeletePet {
    type Request = DeletePetParams;
    type Response = ();

    fn descriptor(&self) -> &'static OperationDescriptor {
        &DELETE_PET
    }

    async fn decode(
        &self,
        _ctx: &RequestContext,
        args: PathArgs,
        _request: Request<Body>,
    ) -> Result<Decoded<DeletePetParams>, DecodeError> {
        Ok(Decoded::new(DeletePetParams {
            pet_id: codec::decode_pet_id(&args)?,
        }))
    }

    async fn call(
        &self,
        handler: &H,
        ctx: &RequestContext,
        params: DeletePetParams,
    ) -> Result<(), BoxError> {
        handler.delete_pet(ctx, params).await.map_err(|e| e.into_boxed())
    }

    fn encode(&self, _ctx: &RequestContext, _: ()) -> Result<Response<Body>, BoxError> {
        codec::encode_empty(StatusCode::OK)
    }
}

/// `GET /pet/{petId}`
#[derive(Debug, Clone, Copy)]
pub struct GetPetById;

#[async_trait]
impl<H: Handler + ?Sized> Endpoint<H> for GetPetById {
    type Request = GetPetByIdParams;
    type Response = GetPetByIdResponse;

    fn descriptor(&self) -> &'static OperationDescriptor {
        &GET_PET_BY_ID
    }

    async fn decode(
        &self,
        _ctx: &RequestContext,
        args: PathArgs,
        _request: Request<Body>,
    ) -> Result<Decoded<GetPetByIdParams>, DecodeError> {
        Ok(Decoded::new(GetPetByIdParams {
            pet_id: codec::decode_pet_id(&args)?,
        }))
    }

    async fn call(
        &self,
        handler: &H,
        ctx: &RequestContext,
        params: GetPetByIdParams,
    ) -> Result<GetPetByIdResponse, BoxError> {
        handler.get_pet_by_id(ctx, params).await.map_err(|e| e.into_boxed())
    }

    fn encode(
        &self,
        _ctx: &RequestContext,
        response: GetPetByIdResponse,
    ) -> Result<Response<Body>, BoxError> {
        match response {
            GetPetByIdResponse::Found(pet) => codec::encode_json(&pet),
            GetPetByIdResponse::NotFound => codec::encode_empty(StatusCode::NOT_FOUND),
        }
    }
}

/// `POST /pet/{petId}?name=..&status=..`
#[derive(Debug, Clone, Copy)]
pub struct UpdatePet;

#[async_trait]
impl<H: Handler + ?Sized> Endpoint<H> for UpdatePet {
    type Request = UpdatePetParams;
    type Response = ();

    fn descriptor(&self) -> &'static OperationDescriptor {
        &UPDATE_PET
    }

    async fn decode(
        &self,
        _ctx: &RequestContext,
        args: PathArgs,
        request: Request<Body>,
    ) -> Result<Decoded<UpdatePetParams>, DecodeError> {
        let pet_id = codec::decode_pet_id(&args)?;
        let (name, status) = codec::decode_update_query(request.uri())?;
        Ok(Decoded::new(UpdatePetParams {
            pet_id,
            name,
            status,
        }))
    }

    async fn call(
        &self,
        handler: &H,
        ctx: &RequestContext,
        params: UpdatePetParams,
    ) -> Result<(), BoxError> {
        handler.update_pet(ctx, params).await.map_err(|e| e.into_boxed())
    }

    fn encode(&self, _ctx: &RequestContext, _: ()) -> Result<Response<Body>, BoxError> {
        codec::encode_empty(StatusCode::OK)
    }
}
