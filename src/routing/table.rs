//! Route registration with conflict detection.
//!
//! # Responsibilities
//! - Collect handlers from every collaborator into one table
//! - Reject a (method, path) pair claimed twice
//! - Reject templates that differ only in parameter names
//! - Freeze into an immutable `axum::Router` with the selected fallback
//!
//! # Design Decisions
//! - Conflicts are errors at composition time, never silent overrides
//! - Handlers registered for different methods on one path are merged
//! - The frozen router is cloned into every listener

use std::collections::{BTreeMap, HashMap};

use axum::{
    handler::Handler,
    http::Method,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};

use crate::error::{OrchestratorError, Result};
use crate::routing::fallback::Fallback;

/// Mutable route registry used while the router is being composed.
#[derive(Default)]
pub struct RouteTable {
    /// Path template -> merged method router.
    routes: BTreeMap<String, MethodRouter>,
    /// Normalized template -> template as first registered.
    shapes: HashMap<String, String>,
    /// (method, normalized template) pairs already claimed.
    claimed: HashMap<(Method, String), String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register handlers that share `state`.
    pub fn scope<S>(&mut self, state: S) -> Scope<'_, S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Scope { table: self, state }
    }

    /// Number of (method, path) pairs registered.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Whether `method` on `path` has been claimed.
    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.claimed.contains_key(&(method.clone(), shape_of(path)))
    }

    fn insert(&mut self, path: &str, method: Method, route: MethodRouter) -> Result<()> {
        let shape = shape_of(path);

        if let Some(existing) = self.shapes.get(&shape) {
            if existing != path {
                return Err(OrchestratorError::RouteConflict {
                    method,
                    path: path.to_string(),
                    existing: existing.clone(),
                });
            }
        }
        let key = (method, shape);
        if let Some(existing) = self.claimed.get(&key) {
            return Err(OrchestratorError::RouteConflict {
                method: key.0,
                path: path.to_string(),
                existing: existing.clone(),
            });
        }

        tracing::debug!(method = %key.0, path = %path, "Route registered");
        self.shapes.insert(key.1.clone(), path.to_string());
        self.claimed.insert(key, path.to_string());

        let merged = match self.routes.remove(path) {
            Some(existing) => existing.merge(route),
            None => route,
        };
        self.routes.insert(path.to_string(), merged);
        Ok(())
    }

    /// Freeze the table into a router, with `fallback` handling every
    /// request no registered route matches.
    pub fn into_router(self, fallback: Fallback) -> Router {
        let router = self
            .routes
            .into_iter()
            .fold(Router::new(), |router, (path, route)| router.route(&path, route));
        fallback.attach(router)
    }
}

/// A view of a [`RouteTable`] whose handlers share one state value.
pub struct Scope<'a, S> {
    table: &'a mut RouteTable,
    state: S,
}

impl<S> Scope<'_, S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Register `handler` for `method` on `path`.
    pub fn route<H, T>(&mut self, path: &str, method: Method, handler: H) -> Result<&mut Self>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone()).map_err(|_| OrchestratorError::Construction {
            subsystem: "router",
            reason: format!("unsupported method {} for {}", method, path),
        })?;
        let route = on(filter, handler).with_state(self.state.clone());
        self.table.insert(path, method, route)?;
        Ok(self)
    }
}

/// Replace parameter names so `/a/{x}` and `/a/{y}` compare equal.
fn shape_of(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") && segment.ends_with('}') {
                "{*}"
            } else if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
