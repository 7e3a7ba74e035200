//! Response hooks.
//!
//! A hook replaces the default response mapping for one outcome. It receives
//! the request context and the handler value or error, and returns the whole
//! response.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::response::EndpointResponse;

/// Hook run after a successful handler.
pub type SuccessHook = Arc<dyn Fn(&RequestContext, &Value) -> EndpointResponse + Send + Sync>;

/// Hook run after any error, including validation failures.
pub type ErrorHook = Arc<dyn Fn(&RequestContext, &ApiError) -> EndpointResponse + Send + Sync>;

/// An optional pair of response hooks.
///
/// Attached to the registry it applies to every endpoint. Attached to an
/// endpoint it replaces the registry-level set for that endpoint entirely,
/// so an endpoint set with only `on_error` uses the default success mapping.
///
/// ```
/// use http::StatusCode;
/// use serde_json::json;
/// use tokendsl_core::{EndpointResponse, HookSet};
///
/// let hooks = HookSet::new().on_error(|_ctx, err| {
///     EndpointResponse::new(StatusCode::UNPROCESSABLE_ENTITY, json!({"reason": err.message()}))
/// });
/// assert!(hooks.has_on_error());
/// assert!(!hooks.has_on_success());
/// ```
#[derive(Clone, Default)]
pub struct HookSet {
    on_success: Option<SuccessHook>,
    on_error: Option<ErrorHook>,
}

impl HookSet {
    /// Creates an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the success hook.
    #[must_use]
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestContext, &Value) -> EndpointResponse + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    /// Sets the error hook.
    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestContext, &ApiError) -> EndpointResponse + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Returns the success hook, if set.
    #[must_use]
    pub fn success_hook(&self) -> Option<&SuccessHook> {
        self.on_success.as_ref()
    }

    /// Returns the error hook, if set.
    #[must_use]
    pub fn error_hook(&self) -> Option<&ErrorHook> {
        self.on_error.as_ref()
    }

    /// Returns true if a success hook is set.
    #[must_use]
    pub fn has_on_success(&self) -> bool {
        self.on_success.is_some()
    }

    /// Returns true if an error hook is set.
    #[must_use]
    pub fn has_on_error(&self) -> bool {
        self.on_error.is_some()
    }

    /// Returns true if neither hook is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_success.is_none() && self.on_error.is_none()
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("on_success", &self.has_on_success())
            .field("on_error", &self.has_on_error())
            .finish()
    }
}
