//! Endpoint definitions.
//!
//! An [`Endpoint`] is the value declared for one route key: the input schema,
//! the handler and optional documentation and hooks. Definitions are checked
//! and frozen by [`Registry::from_definitions`](crate::Registry::from_definitions).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::hooks::HookSet;
use crate::schema::{Schema, ValidationIssues, ROOT_PATH};
use crate::ui::UiSchema;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased handler.
///
/// Receives the validated input and the request context.
pub type HandlerFn =
    Arc<dyn Fn(Value, RequestContext) -> BoxFuture<'static, ApiResult<Value>> + Send + Sync>;

/// Documentation carried by an endpoint. Never consulted by dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointDocs {
    /// Human readable summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form grouping tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Rendering hints for front ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_schema: Option<UiSchema>,
    /// Sample request input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_input: Option<Value>,
    /// Sample response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_output: Option<Value>,
    /// Suggested commit message for changes to this endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hint: Option<String>,
}

impl EndpointDocs {
    /// Returns the description if it contains more than whitespace.
    #[must_use]
    pub fn non_blank_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// The declaration of one endpoint.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tokendsl_core::{Endpoint, JsonSchema};
///
/// let endpoint = Endpoint::new()
///     .description("Echo the name back")
///     .input(JsonSchema::object(vec![("name", JsonSchema::string().required())]))
///     .handler(|input, _ctx| async move { Ok(json!({ "hello": input["name"] })) });
///
/// assert!(endpoint.has_handler());
/// ```
#[derive(Clone, Default)]
pub struct Endpoint {
    pub(crate) input: Option<Arc<dyn Schema>>,
    pub(crate) handler: Option<HandlerFn>,
    pub(crate) docs: EndpointDocs,
    pub(crate) hooks: Option<HookSet>,
}

impl Endpoint {
    /// Creates an empty definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the input schema.
    #[must_use]
    pub fn input(mut self, schema: impl Schema + 'static) -> Self {
        self.input = Some(Arc::new(schema));
        self
    }

    /// Sets the handler.
    #[must_use]
    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |input, ctx| Box::pin(handler(input, ctx))));
        self
    }

    /// Sets a handler with typed input and output.
    ///
    /// The validated value is deserialized into `Req`; a mismatch is a
    /// validation error at `$`. The returned `Res` is serialized back to JSON;
    /// a failure there is an internal error.
    #[must_use]
    pub fn typed_handler<Req, Res, F, Fut>(mut self, handler: F) -> Self
    where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(Req, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Res>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.handler = Some(Arc::new(move |input, ctx| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let request: Req = serde_json::from_value(input).map_err(|e| {
                    ApiError::validation(ValidationIssues::single(ROOT_PATH, e.to_string()))
                })?;
                let response = handler(request, ctx).await?;
                serde_json::to_value(response).map_err(|e| {
                    ApiError::internal_with_source("failed to serialize handler output", e)
                })
            })
        }));
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.docs.description = Some(description.into());
        self
    }

    /// Adds one tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.docs.tags.push(tag.into());
        self
    }

    /// Adds several tags.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.docs.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Attaches a UI schema.
    #[must_use]
    pub fn ui_schema(mut self, ui: UiSchema) -> Self {
        self.docs.ui_schema = Some(ui);
        self
    }

    /// Sets the example input.
    #[must_use]
    pub fn example_input(mut self, example: Value) -> Self {
        self.docs.example_input = Some(example);
        self
    }

    /// Sets the example output.
    #[must_use]
    pub fn example_output(mut self, example: Value) -> Self {
        self.docs.example_output = Some(example);
        self
    }

    /// Sets the commit hint.
    #[must_use]
    pub fn commit_hint(mut self, hint: impl Into<String>) -> Self {
        self.docs.commit_hint = Some(hint.into());
        self
    }

    /// Attaches a hook set that replaces the registry-level one.
    #[must_use]
    pub fn hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Returns true if a handler is set.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Returns the documentation.
    #[must_use]
    pub const fn docs(&self) -> &EndpointDocs {
        &self.docs
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("input", &self.input.is_some())
            .field("handler", &self.handler.is_some())
            .field("docs", &self.docs)
            .field("hooks", &self.hooks)
            .finish()
    }
}
