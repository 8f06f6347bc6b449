//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes for every operation
//! - Look up the operation for an inbound request (server dispatch)
//! - Find the operation for an outbound request (client telemetry)
//! - Return explicit NotFound / MethodNotAllowed rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over routes (acceptable for API-sized tables)
//! - Routes with more literal segments are checked first

use axum::http::{Method, Uri};

use crate::routing::matcher::{PathArgs, PathPattern, PatternError};
use crate::routing::operation::OperationDescriptor;

/// Finds the operation a request targets.
///
/// Used by the client round-tripper to label outgoing calls. A `None` result
/// only means fewer telemetry attributes; it must never fail the request.
pub trait RouteFinder: Send + Sync {
    fn find_route(&self, method: &Method, uri: &Uri) -> Option<&'static OperationDescriptor>;
}

/// A successful route match.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub operation: &'static OperationDescriptor,
    pub args: PathArgs,
}

/// Outcome of a route table lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(RouteMatch),
    /// The path exists but not under the requested method.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    operation: &'static OperationDescriptor,
    pattern: PathPattern,
}

/// Immutable table of compiled operation routes.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile the routes of the given operations.
    pub fn new<I>(operations: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = &'static OperationDescriptor>,
    {
        let mut routes = operations
            .into_iter()
            .map(|operation| {
                Ok(CompiledRoute {
                    operation,
                    pattern: PathPattern::parse(operation.path_pattern)?,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        // Stable sort keeps declaration order among equally specific routes.
        routes.sort_by(|a, b| b.pattern.literal_count().cmp(&a.pattern.literal_count()));

        tracing::debug!(routes = routes.len(), "Route table compiled");
        Ok(Self { routes })
    }

    /// Look up the operation serving `method` + `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let mut allowed = Vec::new();

        for route in &self.routes {
            let Some(args) = route.pattern.matches(path) else {
                continue;
            };
            if route.operation.method == *method {
                return Lookup::Found(RouteMatch {
                    operation: route.operation,
                    args,
                });
            }
            if !allowed.contains(&route.operation.method) {
                allowed.push(route.operation.method.clone());
            }
        }

        if allowed.is_empty() {
            Lookup::NotFound
        } else {
            Lookup::MethodNotAllowed(allowed)
        }
    }

    /// All operations in lookup order.
    pub fn operations(&self) -> impl Iterator<Item = &'static OperationDescriptor> + '_ {
        self.routes.iter().map(|route| route.operation)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteFinder for RouteTable {
    fn find_route(&self, method: &Method, uri: &Uri) -> Option<&'static OperationDescriptor> {
        match self.lookup(method, uri.path()) {
            Lookup::Found(found) => Some(found.operation),
            Lookup::MethodNotAllowed(_) | Lookup::NotFound => None,
        }
    }
}
