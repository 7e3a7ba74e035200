//! High-level router API.

use thiserror::Error;

use crate::key::{PathTemplate, RouteKey};
use crate::method::HttpMethod;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::RouteMatch;

/// Errors raised while inserting a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// The method already has an operation at this path shape under other
    /// parameter names, e.g. `GET /a/:id` followed by `GET /a/:key`.
    #[error("parameter ':{conflicting}' in '{path}' conflicts with existing ':{existing}'")]
    ConflictingParam {
        /// The path being inserted.
        path: String,
        /// The name already in the tree.
        existing: String,
        /// The name that was rejected.
        conflicting: String,
    },

    /// The method already has an operation at this path.
    #[error("{method} {path} is already registered")]
    DuplicateMethod {
        /// The method that collided.
        method: HttpMethod,
        /// The path being inserted.
        path: String,
    },
}

/// A radix tree router over [`PathTemplate`]s.
///
/// # Example
///
/// ```rust
/// use tokendsl_router::{HttpMethod, RouteKey, Router};
///
/// let mut router = Router::new();
/// let key = RouteKey::parse("GET /users/:id").unwrap();
/// router.route(&key, key.to_string()).unwrap();
///
/// let found = router.match_route(HttpMethod::Get, "/users/42").unwrap();
/// assert_eq!(found.operation_id, "GET /users/:id");
/// assert_eq!(found.params.get("id"), Some("42"));
/// ```
///
/// # Route Priority
///
/// Literal segments win over parameters: with `/users/me` and `/users/:id`
/// both registered, `/users/me` selects the literal route.
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a method table at a path template.
    ///
    /// If the path already exists its methods are merged. Any method set in
    /// both is an error.
    pub fn insert(
        &mut self,
        template: &PathTemplate,
        methods: MethodRouter,
    ) -> Result<(), InsertError> {
        let added = methods.allowed_methods().len();
        self.root
            .insert(template.segments(), methods, &template.to_string())?;
        self.route_count += added;
        Ok(())
    }

    /// Registers a single operation under a parsed route key.
    pub fn route(
        &mut self,
        key: &RouteKey,
        operation_id: impl Into<String>,
    ) -> Result<(), InsertError> {
        self.insert(
            key.template(),
            MethodRouter::new().method(key.method(), operation_id),
        )
    }

    /// Matches a method and concrete path.
    #[must_use]
    pub fn match_route(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        let (operation_id, params) = self.root.find(method, path)?;
        Some(RouteMatch::new(operation_id, params))
    }

    /// Matches a path regardless of method.
    ///
    /// Used to tell "no such path" (404) apart from "path exists, method
    /// not registered" (405).
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RouteKey {
        RouteKey::parse(s).unwrap()
    }

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_len_counts_operations() {
        let mut router = Router::new();
        router
            .insert(
                &PathTemplate::parse("/users").unwrap(),
                MethodRouter::new().get("list").post("create"),
            )
            .unwrap();
        router.route(&key("GET /users/:id"), "get").unwrap();
        assert_eq!(router.len(), 3);
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut router = Router::new();
        router.route(&key("GET /users/:id"), "getUser").unwrap();
        router.route(&key("GET /users/me"), "getMe").unwrap();

        let me = router.match_route(HttpMethod::Get, "/users/me").unwrap();
        assert_eq!(me.operation_id, "getMe");
        assert!(me.params.is_empty());

        let other = router.match_route(HttpMethod::Get, "/users/42").unwrap();
        assert_eq!(other.operation_id, "getUser");
        assert_eq!(other.params.get("id"), Some("42"));
    }

    #[test]
    fn test_method_mismatch_still_matches_path() {
        let mut router = Router::new();
        router.route(&key("GET /users"), "list").unwrap();

        assert!(router.match_route(HttpMethod::Delete, "/users").is_none());
        let (methods, _) = router.match_path("/users").unwrap();
        assert_eq!(methods.allow_header(), "GET");
    }

    #[test]
    fn test_shared_param_across_methods() {
        let mut router = Router::new();
        router.route(&key("GET /users/:id"), "get").unwrap();
        router.route(&key("PUT /users/:id"), "put").unwrap();
        router.route(&key("DELETE /users/:id"), "delete").unwrap();

        let (methods, params) = router.match_path("/users/7").unwrap();
        assert_eq!(methods.allow_header(), "GET, PUT, DELETE");
        assert_eq!(params.get("id"), Some("7"));
    }

    #[test]
    fn test_conflicting_param_rejected() {
        let mut router = Router::new();
        router.route(&key("GET /a/:id"), "one").unwrap();
        let err = router.route(&key("GET /a/:key"), "two").unwrap_err();
        assert!(matches!(err, InsertError::ConflictingParam { .. }));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_param_names_differ_across_methods() {
        let mut router = Router::new();
        router.route(&key("GET /users/:id"), "get").unwrap();
        router.route(&key("DELETE /users/:userId"), "delete").unwrap();

        let get = router.match_route(HttpMethod::Get, "/users/7").unwrap();
        assert_eq!(get.params.get("id"), Some("7"));

        let delete = router.match_route(HttpMethod::Delete, "/users/7").unwrap();
        assert_eq!(delete.operation_id, "delete");
        assert_eq!(delete.params.get("userId"), Some("7"));

        let (methods, _) = router.match_path("/users/7").unwrap();
        assert_eq!(methods.allow_header(), "GET, DELETE");
    }

    #[test]
    fn test_no_match() {
        let mut router = Router::new();
        router.route(&key("GET /users"), "list").unwrap();
        assert!(router.match_path("/posts").is_none());
    }
}
