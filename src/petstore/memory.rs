//! In-memory pet store.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::http::RequestContext;
use crate::petstore::handler::{Handler, HandlerError};
use crate::petstore::types::{
    DeletePetParams, GetPetByIdParams, GetPetByIdResponse, Pet, UpdatePetParams,
};

/// Thread-safe [`Handler`] keeping pets in a `DashMap`.
///
/// Pets without an id get the next value of a monotonic counter. Pets stored
/// with an explicit id move the counter past that id. An id is never reused:
/// adding a pet under a taken id fails, and so does allocation once the
/// counter reaches `i64::MAX`.
#[derive(Debug)]
pub struct MemoryPetStore {
    pets: DashMap<i64, Pet>,
    next_id: AtomicI64,
}

impl MemoryPetStore {
    pub fn new() -> Self {
        Self {
            pets: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.pets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pets.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<Pet> {
        self.pets.get(&id).map(|entry| entry.value().clone())
    }

    fn allocate_id(&self) -> Result<i64, HandlerError> {
        self.next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| next.checked_add(1))
            .map_err(|_| HandlerError::InvalidInput("pet ids exhausted".into()))
    }

    fn reserve_past(&self, id: i64) {
        // i64::MAX stays in the counter and is then refused by allocate_id.
        self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }
}

impl Default for MemoryPetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for MemoryPetStore {
    async fn add_pet(&self, ctx: &RequestContext, mut pet: Pet) -> Result<Pet, HandlerError> {
        let id = match pet.id {
            Some(id) => {
                self.reserve_past(id);
                id
            }
            None => self.allocate_id()?,
        };
        pet.id = Some(id);
        match self.pets.entry(id) {
            Entry::Occupied(_) => {
                return Err(HandlerError::InvalidInput(format!("pet {id} already exists")));
            }
            Entry::Vacant(slot) => {
                slot.insert(pet.clone());
            }
        }

        tracing::info!(
            request_id = ctx.request_id().unwrap_or("-"),
            pet_id = id,
            name = %pet.name,
            "Pet added"
        );
        Ok(pet)
    }

    async fn delete_pet(
        &self,
        ctx: &RequestContext,
        params: DeletePetParams,
    ) -> Result<(), HandlerError> {
        let removed = self.pets.remove(&params.pet_id).is_some();
        tracing::info!(
            request_id = ctx.request_id().unwrap_or("-"),
            pet_id = params.pet_id,
            removed,
            "Pet deleted"
        );
        Ok(())
    }

    async fn get_pet_by_id(
        &self,
        _ctx: &RequestContext,
        params: GetPetByIdParams,
    ) -> Result<GetPetByIdResponse, HandlerError> {
        Ok(match self.get(params.pet_id) {
            Some(pet) => GetPetByIdResponse::Found(pet),
            None => GetPetByIdResponse::NotFound,
        })
    }

    async fn update_pet(
        &self,
        ctx: &RequestContext,
        params: UpdatePetParams,
    ) -> Result<(), HandlerError> {
        if params.name.as_deref() == Some("") {
            return Err(HandlerError::InvalidInput("name must not be empty".into()));
        }

        let mut pet = self
            .pets
            .get_mut(&params.pet_id)
            .ok_or(HandlerError::PetNotFound(params.pet_id))?;
        if let Some(name) = params.name {
            pet.name = name;
        }
        if let Some(status) = params.status {
            pet.status = Some(status);
        }

        tracing::info!(
            request_id = ctx.request_id().unwrap_or("-"),
            pet_id = params.pet_id,
            "Pet updated"
        );
        Ok(())
    }
}
