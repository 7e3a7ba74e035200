//! Per-path method table.
//!
//! [`MethodRouter`] maps each [`HttpMethod`] to the operation registered for
//! one path template.

use crate::method::HttpMethod;

/// Maps HTTP methods to operation IDs for a single path template.
///
/// # Example
///
/// ```rust
/// use tokendsl_router::{HttpMethod, MethodRouter};
///
/// let router = MethodRouter::new()
///     .get("GET /users")
///     .post("POST /users");
///
/// assert_eq!(router.operation(HttpMethod::Get), Some("GET /users"));
/// assert_eq!(router.operation(HttpMethod::Delete), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodRouter {
    get: Option<String>,
    post: Option<String>,
    put: Option<String>,
    delete: Option<String>,
    patch: Option<String>,
}

impl MethodRouter {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET operation.
    #[must_use]
    pub fn get(mut self, operation_id: impl Into<String>) -> Self {
        self.get = Some(operation_id.into());
        self
    }

    /// Registers a POST operation.
    #[must_use]
    pub fn post(mut self, operation_id: impl Into<String>) -> Self {
        self.post = Some(operation_id.into());
        self
    }

    /// Registers a PUT operation.
    #[must_use]
    pub fn put(mut self, operation_id: impl Into<String>) -> Self {
        self.put = Some(operation_id.into());
        self
    }

    /// Registers a DELETE operation.
    #[must_use]
    pub fn delete(mut self, operation_id: impl Into<String>) -> Self {
        self.delete = Some(operation_id.into());
        self
    }

    /// Registers a PATCH operation.
    #[must_use]
    pub fn patch(mut self, operation_id: impl Into<String>) -> Self {
        self.patch = Some(operation_id.into());
        self
    }

    /// Registers an operation for a specific method, replacing any previous one.
    #[must_use]
    pub fn method(mut self, method: HttpMethod, operation_id: impl Into<String>) -> Self {
        *self.slot_mut(method) = Some(operation_id.into());
        self
    }

    /// Returns the operation ID registered for `method`.
    #[must_use]
    pub fn operation(&self, method: HttpMethod) -> Option<&str> {
        match method {
            HttpMethod::Get => self.get.as_deref(),
            HttpMethod::Post => self.post.as_deref(),
            HttpMethod::Put => self.put.as_deref(),
            HttpMethod::Delete => self.delete.as_deref(),
            HttpMethod::Patch => self.patch.as_deref(),
        }
    }

    /// Merges another method router into this one.
    ///
    /// Fails with the first method that is set in both routers. On failure
    /// `self` is left unchanged.
    ///
    /// ```rust
    /// use tokendsl_router::{HttpMethod, MethodRouter};
    ///
    /// let mut router = MethodRouter::new().get("list");
    /// router.merge(MethodRouter::new().post("create")).unwrap();
    /// assert_eq!(router.operation(HttpMethod::Post), Some("create"));
    ///
    /// let conflict = router.merge(MethodRouter::new().get("other"));
    /// assert_eq!(conflict, Err(HttpMethod::Get));
    /// ```
    pub fn merge(&mut self, other: MethodRouter) -> Result<(), HttpMethod> {
        if let Some(method) = HttpMethod::ALL
            .into_iter()
            .find(|m| self.operation(*m).is_some() && other.operation(*m).is_some())
        {
            return Err(method);
        }

        for method in HttpMethod::ALL {
            let incoming = other.slot(method).clone();
            if incoming.is_some() {
                *self.slot_mut(method) = incoming;
            }
        }
        Ok(())
    }

    /// Returns the methods that have an operation, in canonical order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<HttpMethod> {
        HttpMethod::ALL
            .into_iter()
            .filter(|m| self.operation(*m).is_some())
            .collect()
    }

    /// Renders the allowed methods as an `Allow` header value.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.allowed_methods()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns true if no method has an operation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        HttpMethod::ALL.iter().all(|m| self.operation(*m).is_none())
    }

    fn slot(&self, method: HttpMethod) -> &Option<String> {
        match method {
            HttpMethod::Get => &self.get,
            HttpMethod::Post => &self.post,
            HttpMethod::Put => &self.put,
            HttpMethod::Delete => &self.delete,
            HttpMethod::Patch => &self.patch,
        }
    }

    fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<String> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_router() {
        let router = MethodRouter::new();
        assert!(router.is_empty());
        assert!(router.allowed_methods().is_empty());
        assert_eq!(router.allow_header(), "");
    }

    #[test]
    fn test_builder_methods() {
        let router = MethodRouter::new()
            .get("g")
            .post("po")
            .put("pu")
            .delete("d")
            .patch("pa");

        assert_eq!(router.operation(HttpMethod::Get), Some("g"));
        assert_eq!(router.operation(HttpMethod::Post), Some("po"));
        assert_eq!(router.operation(HttpMethod::Put), Some("pu"));
        assert_eq!(router.operation(HttpMethod::Delete), Some("d"));
        assert_eq!(router.operation(HttpMethod::Patch), Some("pa"));
        assert_eq!(router.allowed_methods(), HttpMethod::ALL.to_vec());
    }

    #[test]
    fn test_method_by_enum() {
        let router = MethodRouter::new().method(HttpMethod::Patch, "patchUser");
        assert_eq!(router.operation(HttpMethod::Patch), Some("patchUser"));
        assert_eq!(router.allowed_methods(), vec![HttpMethod::Patch]);
    }

    #[test]
    fn test_merge_disjoint() {
        let mut router = MethodRouter::new().get("list");
        router
            .merge(MethodRouter::new().post("create").delete("purge"))
            .unwrap();

        assert_eq!(router.allow_header(), "GET, POST, DELETE");
    }

    #[test]
    fn test_merge_conflict_leaves_router_unchanged() {
        let mut router = MethodRouter::new().get("list");
        let before = router.clone();

        let result = router.merge(MethodRouter::new().post("create").get("again"));
        assert_eq!(result, Err(HttpMethod::Get));
        assert_eq!(router, before);
    }
}
