//! Static metadata describing one API operation.

use axum::http::Method;

use crate::routing::matcher::{PathPattern, PatternError};

/// Identifies one API operation: its id, display name, method and path pattern.
///
/// Descriptors are defined once as `static` items next to the endpoint that
/// serves them and are shared by reference everywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Operation id as written in the API document (e.g. `getPetById`).
    pub id: &'static str,
    /// Display name used for spans (e.g. `GetPetById`).
    pub name: &'static str,
    /// HTTP method the operation is bound to.
    pub method: Method,
    /// Path pattern with `{param}` segments (e.g. `/pet/{petId}`).
    pub path_pattern: &'static str,
}

impl OperationDescriptor {
    pub const fn new(
        id: &'static str,
        name: &'static str,
        method: Method,
        path_pattern: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            method,
            path_pattern,
        }
    }

    /// Number of path parameters in the pattern, as the route table compiles it.
    pub fn param_arity(&self) -> Result<usize, PatternError> {
        PathPattern::parse(self.path_pattern).map(|pattern| pattern.arity())
    }
}

impl std::fmt::Display for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.method, self.path_pattern, self.id)
    }
}
