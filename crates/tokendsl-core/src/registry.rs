//! The endpoint registry.
//!
//! A [`Registry`] is built once at startup from the declared definitions and
//! is immutable afterwards. Construction checks each definition in
//! declaration order and stops at the first problem:
//!
//! 1. the route key parses
//! 2. a handler is present
//! 3. in strict mode, a non-blank description is present
//! 4. an attached UI schema has both `layout` and `fields`
//! 5. the key was not seen before, subject to [`DuplicateRoutePolicy`]
//! 6. the method is not already bound to the same path shape under other
//!    parameter names
//!
//! Iteration order is declaration order, and that is the binding order.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokendsl_router::{RouteKey, Router};

use crate::endpoint::{Endpoint, EndpointDocs, HandlerFn};
use crate::error::RegistryError;
use crate::hooks::HookSet;
use crate::schema::Schema;

/// What to do when the same route key is declared twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateRoutePolicy {
    /// Fail with [`RegistryError::DuplicateRoute`].
    #[default]
    Reject,
    /// Keep the first definition and skip later ones.
    FirstWins,
    /// Replace the earlier definition, keeping its position.
    LastWins,
}

/// Registry construction options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Require a non-blank description on every endpoint.
    pub strict: bool,
    /// Duplicate key handling.
    pub duplicate_policy: DuplicateRoutePolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict: true,
            duplicate_policy: DuplicateRoutePolicy::Reject,
        }
    }
}

impl RegistryConfig {
    /// Strict mode with the default duplicate policy.
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// Descriptions optional.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Sets the duplicate policy.
    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicateRoutePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

/// A definition that passed every check.
#[derive(Clone)]
pub struct RegisteredEndpoint {
    key: RouteKey,
    handler: HandlerFn,
    input: Option<Arc<dyn Schema>>,
    docs: EndpointDocs,
    hooks: Option<HookSet>,
}

impl RegisteredEndpoint {
    /// Returns the route key.
    #[must_use]
    pub const fn key(&self) -> &RouteKey {
        &self.key
    }

    /// Returns the handler.
    #[must_use]
    pub const fn handler(&self) -> &HandlerFn {
        &self.handler
    }

    /// Returns the input schema.
    #[must_use]
    pub fn input(&self) -> Option<&dyn Schema> {
        self.input.as_deref()
    }

    /// Returns the documentation.
    #[must_use]
    pub const fn docs(&self) -> &EndpointDocs {
        &self.docs
    }

    /// Returns the endpoint's own hook set.
    #[must_use]
    pub const fn hooks(&self) -> Option<&HookSet> {
        self.hooks.as_ref()
    }
}

impl fmt::Debug for RegisteredEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredEndpoint")
            .field("key", &self.key.to_string())
            .field("input", &self.input.is_some())
            .field("docs", &self.docs)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// One line of [`Registry::catalog`].
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry<'a> {
    /// Canonical route key, e.g. `GET /users/:id`.
    pub route: String,
    /// Whether the endpoint validates its input.
    pub validated: bool,
    /// Documentation fields.
    #[serde(flatten)]
    pub docs: &'a EndpointDocs,
}

/// The validated, ordered set of endpoints.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tokendsl_core::{Endpoint, Registry, RegistryConfig};
///
/// let registry = Registry::from_definitions(
///     [
///         ("GET /health", Endpoint::new()
///             .description("Liveness probe")
///             .handler(|_, _| async { Ok(json!({"ok": true})) })),
///     ],
///     &RegistryConfig::default(),
/// )
/// .unwrap();
///
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: IndexMap<RouteKey, RegisteredEndpoint>,
    hooks: HookSet,
}

impl Registry {
    /// Builds a registry from `(route key, definition)` pairs.
    pub fn from_definitions<I, S>(api: I, config: &RegistryConfig) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (S, Endpoint)>,
        S: AsRef<str>,
    {
        let mut entries: IndexMap<RouteKey, RegisteredEndpoint> = IndexMap::new();
        let mut shapes = Router::new();

        for (declared, endpoint) in api {
            let declared = declared.as_ref();
            let entry = check_definition(declared, endpoint, config)?;

            if entries.contains_key(&entry.key) {
                match config.duplicate_policy {
                    DuplicateRoutePolicy::Reject => {
                        return Err(RegistryError::DuplicateRoute {
                            key: declared.to_string(),
                        })
                    }
                    DuplicateRoutePolicy::FirstWins => {
                        tracing::debug!(route = declared, "skipping duplicate endpoint");
                    }
                    DuplicateRoutePolicy::LastWins => {
                        tracing::debug!(route = declared, "replacing duplicate endpoint");
                        // `insert` on an existing key keeps its position.
                        entries.insert(entry.key.clone(), entry);
                    }
                }
                continue;
            }

            shapes
                .route(&entry.key, declared)
                .map_err(|source| RegistryError::ConflictingRoute {
                    key: declared.to_string(),
                    source,
                })?;
            entries.insert(entry.key.clone(), entry);
        }

        tracing::debug!(endpoints = entries.len(), "registry built");
        Ok(Self {
            entries,
            hooks: HookSet::default(),
        })
    }

    /// Sets the registry-level hook set.
    #[must_use]
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Returns the registry-level hook set.
    #[must_use]
    pub const fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// Returns the hooks that apply to `entry`.
    ///
    /// An endpoint hook set replaces the registry one as a whole.
    #[must_use]
    pub fn effective_hooks<'a>(&'a self, entry: &'a RegisteredEndpoint) -> &'a HookSet {
        entry.hooks.as_ref().unwrap_or(&self.hooks)
    }

    /// Looks up an endpoint by key.
    #[must_use]
    pub fn get(&self, key: &RouteKey) -> Option<&RegisteredEndpoint> {
        self.entries.get(key)
    }

    /// Iterates in binding order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredEndpoint> {
        self.entries.values()
    }

    /// Returns the number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lists every endpoint with its documentation, in binding order.
    #[must_use]
    pub fn catalog(&self) -> Vec<CatalogEntry<'_>> {
        self.iter()
            .map(|entry| CatalogEntry {
                route: entry.key.to_string(),
                validated: entry.input.is_some(),
                docs: &entry.docs,
            })
            .collect()
    }
}

fn check_definition(
    declared: &str,
    endpoint: Endpoint,
    config: &RegistryConfig,
) -> Result<RegisteredEndpoint, RegistryError> {
    let key = RouteKey::parse(declared).map_err(|source| RegistryError::MalformedRouteKey {
        key: declared.to_string(),
        source,
    })?;

    let Endpoint {
        input,
        handler,
        docs,
        hooks,
    } = endpoint;

    let handler = handler.ok_or_else(|| RegistryError::MissingHandler {
        key: declared.to_string(),
    })?;

    if config.strict && docs.non_blank_description().is_none() {
        return Err(RegistryError::MissingDescription {
            key: declared.to_string(),
        });
    }

    if let Some(missing) = docs.ui_schema.as_ref().and_then(|ui| ui.missing_part()) {
        return Err(RegistryError::MalformedUiSchema {
            key: declared.to_string(),
            missing,
        });
    }

    Ok(RegisteredEndpoint {
        key,
        handler,
        input,
        docs,
        hooks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JsonSchema;
    use crate::ui::{UiField, UiLayout, UiSchema};
    use serde_json::json;
    use tokendsl_router::{InsertError, RouteKeyError};

    fn endpoint(description: &str) -> Endpoint {
        Endpoint::new()
            .description(description)
            .handler(|_, _| async { Ok(json!(null)) })
    }

    fn keys(registry: &Registry) -> Vec<String> {
        registry.iter().map(|e| e.key().to_string()).collect()
    }

    #[test]
    fn test_preserves_declaration_order() {
        let registry = Registry::from_definitions(
            [
                ("POST /users", endpoint("create")),
                ("GET /users", endpoint("list")),
                ("GET /users/:id", endpoint("get")),
                ("DELETE /users/:id", endpoint("delete")),
            ],
            &RegistryConfig::default(),
        )
        .unwrap();

        assert_eq!(
            keys(&registry),
            ["POST /users", "GET /users", "GET /users/:id", "DELETE /users/:id"]
        );
    }

    #[test]
    fn test_malformed_key_is_first_check() {
        let err = Registry::from_definitions(
            [("FETCH /users", Endpoint::new())],
            &RegistryConfig::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            RegistryError::MalformedRouteKey {
                key: "FETCH /users".to_string(),
                source: RouteKeyError::UnknownMethod {
                    method: "FETCH".to_string()
                },
            }
        );
    }

    #[test]
    fn test_missing_handler_before_description() {
        let err = Registry::from_definitions(
            [("GET /users", Endpoint::new())],
            &RegistryConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::MissingHandler { .. }));
    }

    #[test]
    fn test_strict_requires_description() {
        let undocumented = Endpoint::new().handler(|_, _| async { Ok(json!(null)) });

        let err = Registry::from_definitions(
            [("GET /users", undocumented.clone())],
            &RegistryConfig::strict(),
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::MissingDescription { .. }));

        let blank = Registry::from_definitions(
            [("GET /users", endpoint("  \t"))],
            &RegistryConfig::strict(),
        );
        assert!(blank.is_err());

        let lenient =
            Registry::from_definitions([("GET /users", undocumented)], &RegistryConfig::lenient());
        assert!(lenient.is_ok());
    }

    #[test]
    fn test_ui_schema_requires_layout_and_fields() {
        let incomplete = UiSchema {
            layout: Some(UiLayout::Form),
            fields: None,
        };
        let err = Registry::from_definitions(
            [("POST /users", endpoint("create").ui_schema(incomplete))],
            &RegistryConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::MalformedUiSchema {
                key: "POST /users".to_string(),
                missing: "fields",
            }
        );

        let complete = UiSchema::new(UiLayout::Form).field("name", UiField::new("text", "Name"));
        assert!(Registry::from_definitions(
            [("POST /users", endpoint("create").ui_schema(complete))],
            &RegistryConfig::default(),
        )
        .is_ok());
    }

    #[test]
    fn test_duplicate_rejected_by_default() {
        let err = Registry::from_definitions(
            [("GET /users", endpoint("a")), ("GET  /users", endpoint("b"))],
            &RegistryConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateRoute {
                key: "GET  /users".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_first_wins() {
        let config = RegistryConfig::default().with_duplicate_policy(DuplicateRoutePolicy::FirstWins);
        let registry = Registry::from_definitions(
            [
                ("GET /users", endpoint("first")),
                ("GET /health", endpoint("health")),
                ("GET /users", endpoint("second")),
            ],
            &config,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        let key = RouteKey::parse("GET /users").unwrap();
        assert_eq!(
            registry.get(&key).unwrap().docs().description.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_duplicate_last_wins_keeps_position() {
        let config = RegistryConfig::default().with_duplicate_policy(DuplicateRoutePolicy::LastWins);
        let registry = Registry::from_definitions(
            [
                ("GET /users", endpoint("first")),
                ("GET /health", endpoint("health")),
                ("GET /users", endpoint("second")),
            ],
            &config,
        )
        .unwrap();

        assert_eq!(keys(&registry), ["GET /users", "GET /health"]);
        let key = RouteKey::parse("GET /users").unwrap();
        assert_eq!(
            registry.get(&key).unwrap().docs().description.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_conflicting_param_names() {
        let err = Registry::from_definitions(
            [
                ("GET /users/:id", endpoint("get")),
                ("GET /users/:key", endpoint("get by key")),
            ],
            &RegistryConfig::default(),
        )
        .unwrap_err();

        match err {
            RegistryError::ConflictingRoute { key, source } => {
                assert_eq!(key, "GET /users/:key");
                assert!(matches!(source, InsertError::ConflictingParam { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_param_names_may_differ_across_methods() {
        let registry = Registry::from_definitions(
            [
                ("GET /users/:id", endpoint("get")),
                ("DELETE /users/:userId", endpoint("delete")),
                ("PUT /users/:user_id/avatar", endpoint("avatar")),
                ("GET /users/:id/avatar", endpoint("read avatar")),
            ],
            &RegistryConfig::default(),
        )
        .unwrap();

        assert_eq!(
            keys(&registry),
            [
                "GET /users/:id",
                "DELETE /users/:userId",
                "PUT /users/:user_id/avatar",
                "GET /users/:id/avatar"
            ]
        );
    }

    #[test]
    fn test_checks_run_in_declaration_order() {
        let err = Registry::from_definitions(
            [
                ("GET /ok", endpoint("fine")),
                ("GET /bad", Endpoint::new()),
                ("BROKEN", Endpoint::new()),
            ],
            &RegistryConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.key(), "GET /bad");
    }

    #[test]
    fn test_endpoint_hooks_replace_registry_hooks() {
        let own = HookSet::new().on_error(|_, _| crate::EndpointResponse::ok(json!("own")));
        let registry = Registry::from_definitions(
            [
                ("GET /a", endpoint("a").hooks(own)),
                ("GET /b", endpoint("b")),
            ],
            &RegistryConfig::default(),
        )
        .unwrap()
        .with_hooks(HookSet::new().on_success(|_, v| crate::EndpointResponse::ok(v.clone())));

        let a = registry.get(&RouteKey::parse("GET /a").unwrap()).unwrap();
        let b = registry.get(&RouteKey::parse("GET /b").unwrap()).unwrap();

        assert!(!registry.effective_hooks(a).has_on_success());
        assert!(registry.effective_hooks(a).has_on_error());
        assert!(registry.effective_hooks(b).has_on_success());
    }

    #[test]
    fn test_catalog() {
        let registry = Registry::from_definitions(
            [
                (
                    "POST /users",
                    endpoint("Create a user")
                        .tag("users")
                        .input(JsonSchema::object(vec![("name", JsonSchema::string())])),
                ),
                ("GET /users", endpoint("List users")),
            ],
            &RegistryConfig::default(),
        )
        .unwrap();

        let catalog = serde_json::to_value(registry.catalog()).unwrap();
        assert_eq!(
            catalog,
            json!([
                {"route": "POST /users", "validated": true, "description": "Create a user", "tags": ["users"]},
                {"route": "GET /users", "validated": false, "description": "List users"}
            ])
        );
    }

    #[test]
    fn test_config_deserialize() {
        let config: RegistryConfig =
            serde_json::from_value(json!({"duplicate_policy": "last_wins"})).unwrap();
        assert!(config.strict);
        assert_eq!(config.duplicate_policy, DuplicateRoutePolicy::LastWins);

        let unknown: Result<RegistryConfig, _> = serde_json::from_value(json!({"strcit": false}));
        assert!(unknown.is_err());
    }
}
