//! Petstore API types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pet in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PetStatus>,
}

impl Pet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            photo_urls: Vec::new(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: PetStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Pet status in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Pending,
    Sold,
}

impl PetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetStatus::Available => "available",
            PetStatus::Pending => "pending",
            PetStatus::Sold => "sold",
        }
    }
}

impl fmt::Display for PetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pet status {0:?}, expected one of available, pending, sold")]
pub struct InvalidStatus(pub String);

impl FromStr for PetStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(PetStatus::Available),
            "pending" => Ok(PetStatus::Pending),
            "sold" => Ok(PetStatus::Sold),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePetParams {
    pub pet_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetPetByIdParams {
    pub pet_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePetParams {
    pub pet_id: i64,
    pub name: Option<String>,
    pub status: Option<PetStatus>,
}

/// Query string of `updatePet`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UpdatePetQuery {
    pub name: Option<String>,
    pub status: Option<String>,
}

/// Responses of `getPetById`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetPetByIdResponse {
    Found(Pet),
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pet_wire_format() {
        let pet = Pet {
            id: Some(10),
            name: "doggie".into(),
            photo_urls: vec!["http://img/1.png".into()],
            status: Some(PetStatus::Available),
        };
        let json = serde_json::to_value(&pet).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 10,
                "name": "doggie",
                "photoUrls": ["http://img/1.png"],
                "status": "available"
            })
        );
    }

    #[test]
    fn test_optional_fields_omitted() {
        let pet: Pet = serde_json::from_str(r#"{"name":"rex"}"#).unwrap();
        assert_eq!(pet, Pet::new("rex"));
        assert_eq!(serde_json::to_string(&pet).unwrap(), r#"{"name":"rex","photoUrls":[]}"#);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("sold".parse::<PetStatus>(), Ok(PetStatus::Sold));
        assert_eq!(
            "lost".parse::<PetStatus>(),
            Err(InvalidStatus("lost".into()))
        );
        assert_eq!(PetStatus::Pending.to_string(), "pending");
    }
}
