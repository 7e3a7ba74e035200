//! Route keys and radix tree routing for TokenDSL.
//!
//! An endpoint is declared under a route key such as `"GET /users/:id"`.
//! This crate parses those keys into a [`RouteKey`] and matches concrete
//! request paths against the registered templates.
//!
//! # Example
//!
//! ```rust
//! use tokendsl_router::{HttpMethod, RouteKey, Router};
//!
//! let mut router = Router::new();
//! for key in ["GET /users", "POST /users", "GET /users/:id"] {
//!     let key = RouteKey::parse(key).unwrap();
//!     router.route(&key, key.to_string()).unwrap();
//! }
//!
//! let found = router.match_route(HttpMethod::Get, "/users/123").unwrap();
//! assert_eq!(found.operation_id, "GET /users/:id");
//! assert_eq!(found.params.get("id"), Some("123"));
//! ```
//!
//! # Tree layout
//!
//! ```text
//!            (root)
//!              │
//!           "users"  [GET, POST]
//!              │
//!            ":id"   [GET]
//! ```

mod key;
mod method;
mod method_router;
mod node;
mod params;
mod router;

pub use key::{PathTemplate, RouteKey, RouteKeyError, Segment};
pub use method::HttpMethod;
pub use method_router::MethodRouter;
pub use node::Node;
pub use params::Params;
pub use router::{InsertError, Router};

/// A matched route with its operation ID and captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The operation ID registered for the route
    pub operation_id: &'a str,
    /// Captured path parameters
    pub params: Params,
}

impl<'a> RouteMatch<'a> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(operation_id: &'a str, params: Params) -> Self {
        Self {
            operation_id,
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_routing() {
        let mut router = Router::new();
        router
            .route(&RouteKey::parse("GET /users").unwrap(), "listUsers")
            .unwrap();
        router
            .route(&RouteKey::parse("GET /users/:id").unwrap(), "getUser")
            .unwrap();

        let m = router.match_route(HttpMethod::Get, "/users").unwrap();
        assert_eq!(m.operation_id, "listUsers");
        assert!(m.params.is_empty());

        let m = router.match_route(HttpMethod::Get, "/users/123").unwrap();
        assert_eq!(m.operation_id, "getUser");
        assert_eq!(m.params.get("id"), Some("123"));
    }

    #[test]
    fn test_multiple_params() {
        let mut router = Router::new();
        router
            .route(
                &RouteKey::parse("GET /orgs/:org_id/users/:user_id").unwrap(),
                "getOrgUser",
            )
            .unwrap();

        let m = router
            .match_route(HttpMethod::Get, "/orgs/acme/users/123")
            .unwrap();
        assert_eq!(m.params.get("org_id"), Some("acme"));
        assert_eq!(m.params.get("user_id"), Some("123"));
    }
}
