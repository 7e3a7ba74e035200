//! # TokenDSL Core
//!
//! Declarative endpoint registry and validated request dispatch.
//!
//! - [`Endpoint`] - One declared endpoint: schema, handler, docs, hooks
//! - [`Registry`] - Ordered, checked set of endpoints built once at startup
//! - [`Dispatcher`] - Per-request pipeline and binding to a [`RouteRegistrar`]
//! - [`Schema`] / [`JsonSchema`] - Input validation with coercion
//! - [`ApiError`] / [`RegistryError`] - Request-time and startup errors
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tokendsl_core::{DispatchConfig, Dispatcher, Endpoint, JsonSchema, Registry, RegistryConfig};
//!
//! let registry = Registry::from_definitions(
//!     [(
//!         "POST /users",
//!         Endpoint::new()
//!             .description("Create a user")
//!             .input(JsonSchema::object(vec![("name", JsonSchema::string().required())]))
//!             .handler(|input, _ctx| async move { Ok(json!({"id": "1", "name": input["name"]})) }),
//!     )],
//!     &RegistryConfig::default(),
//! )
//! .unwrap();
//!
//! let dispatcher = Dispatcher::new(Arc::new(registry), DispatchConfig::default());
//! assert_eq!(dispatcher.registry().len(), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/tokendsl-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod dispatch;
mod endpoint;
mod error;
mod hooks;
pub mod merge;
mod registry;
mod response;
pub mod schema;
pub mod ui;

pub use context::{RequestContext, RequestId, REQUEST_ID_HEADER};
pub use dispatch::{
    BoundHandler, DispatchConfig, DispatchRequest, Dispatcher, Phase, RouteRegistrar,
    HANDLER_PANICKED,
};
pub use endpoint::{BoxFuture, Endpoint, EndpointDocs, HandlerFn};
pub use error::{ApiError, ApiResult, ErrorCategory, RegistryError};
pub use hooks::{ErrorHook, HookSet, SuccessHook};
pub use registry::{
    CatalogEntry, DuplicateRoutePolicy, RegisteredEndpoint, Registry, RegistryConfig,
};
pub use response::{
    error_response, is_not_found, success_response, EndpointResponse, INTERNAL_ERROR_MESSAGE,
};
pub use schema::{JsonSchema, Pattern, Schema, ValidationIssue, ValidationIssues};
pub use ui::{UiField, UiLayout, UiSchema};
