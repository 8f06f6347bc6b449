//! The petstore API: types, business handler seam, codec and endpoints.
//!
//! # Data Flow
//! ```text
//! ApiService (route matched)
//!     → endpoints.rs (one Endpoint per operation)
//!         → codec.rs decode  (path args, query, JSON body)
//!         → handler.rs       (Handler trait, e.g. memory.rs)
//!         → codec.rs encode  (JSON or empty body)
//! ```

pub mod codec;
pub mod endpoints;
pub mod handler;
pub mod memory;
pub mod types;

pub use endpoints::{route_table, service, OPERATIONS};
pub use handler::{Handler, HandlerError};
pub use memory::MemoryPetStore;
pub use types::{
    DeletePetParams, GetPetByIdParams, GetPetByIdResponse, InvalidStatus, Pet, PetStatus,
    UpdatePetParams,
};
