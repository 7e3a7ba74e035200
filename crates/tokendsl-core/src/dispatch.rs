//! Request dispatch.
//!
//! The [`Dispatcher`] runs the per-request pipeline for one endpoint:
//!
//! ```text
//! Pending ─► Validating ─► Handling ─► Responding ─► Done
//!                │             │            ▲
//!                └─────────────┴── error ───┘
//! ```
//!
//! Every request produces exactly one [`EndpointResponse`]. Handler errors
//! never escape; they are classified by [`error_response`] or handed to the
//! effective `on_error` hook. A panicking handler is reported as an internal
//! error with the message [`HANDLER_PANICKED`].

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokendsl_router::{Params, RouteKey};
use tokendsl_telemetry::metrics::{record_request, record_validation_failure};
use tokendsl_telemetry::InFlightGuard;

use crate::context::RequestContext;
use crate::endpoint::{BoxFuture, HandlerFn};
use crate::error::{ApiError, ApiResult};
use crate::hooks::HookSet;
use crate::merge::{merge, parse_query};
use crate::registry::{RegisteredEndpoint, Registry};
use crate::response::{error_response, success_response, EndpointResponse};
use crate::schema::{ValidationIssues, ROOT_PATH};

/// Message of the internal error that replaces a handler panic.
pub const HANDLER_PANICKED: &str = "handler panicked";

/// Error classification options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Include the error message in 500 bodies.
    pub expose_internal_messages: bool,
    /// Messages that turn an otherwise internal error into a 404.
    pub not_found_messages: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            expose_internal_messages: false,
            not_found_messages: vec!["Not found".to_string()],
        }
    }
}

/// The stage a request is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Received, nothing done yet.
    Pending,
    /// Merging parameters and checking them against the schema.
    Validating,
    /// The handler is running.
    Handling,
    /// Building the response.
    Responding,
    /// Response produced.
    Done,
}

impl Phase {
    /// Returns the phase name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Handling => "handling",
            Self::Responding => "responding",
            Self::Done => "done",
        }
    }

    /// Returns true if `next` may follow `self`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Validating)
                | (Self::Validating, Self::Handling | Self::Responding)
                | (Self::Handling, Self::Responding)
                | (Self::Responding, Self::Done)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the phase of one request and logs each transition.
#[derive(Debug)]
struct PhaseTracker<'a> {
    phase: Phase,
    ctx: &'a RequestContext,
}

impl<'a> PhaseTracker<'a> {
    const fn new(ctx: &'a RequestContext) -> Self {
        Self {
            phase: Phase::Pending,
            ctx,
        }
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid phase transition {} -> {}",
            self.phase,
            next
        );
        tracing::trace!(
            request_id = %self.ctx.request_id(),
            from = %self.phase,
            phase = %next,
            "phase transition"
        );
        self.phase = next;
    }
}

/// The raw parts of a matched request.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Request context.
    pub ctx: RequestContext,
    /// Path captures from the router.
    pub captures: Params,
    /// Raw query string without the `?`.
    pub query: String,
    /// Raw body. Parsed as JSON only for methods that carry one.
    pub body: Bytes,
}

impl DispatchRequest {
    /// Creates a request with no captures, query or body.
    #[must_use]
    pub fn new(ctx: RequestContext) -> Self {
        Self {
            ctx,
            captures: Params::new(),
            query: String::new(),
            body: Bytes::new(),
        }
    }

    /// Sets the path captures.
    #[must_use]
    pub fn captures(mut self, captures: Params) -> Self {
        self.captures = captures;
        self
    }

    /// Sets the query string.
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// A fully wired endpoint, ready for the server to call.
pub type BoundHandler =
    Arc<dyn Fn(DispatchRequest) -> BoxFuture<'static, EndpointResponse> + Send + Sync>;

/// The server-side registration surface.
///
/// The dispatcher calls [`register`](Self::register) once per endpoint in
/// registry order. Implementations typically use
/// [`HttpMethod::as_lowercase`](tokendsl_router::HttpMethod::as_lowercase) and
/// the key's template to hook the handler into their own routing.
pub trait RouteRegistrar {
    /// Error raised when the server refuses a route.
    type Error;

    /// Registers one endpoint.
    fn register(&mut self, key: &RouteKey, handler: BoundHandler) -> Result<(), Self::Error>;
}

/// Runs the request pipeline against a [`Registry`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    config: Arc<DispatchConfig>,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(registry: Arc<Registry>, config: DispatchConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
        }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Registers every endpoint with `registrar`, in registry order.
    pub fn bind<R: RouteRegistrar>(&self, registrar: &mut R) -> Result<(), R::Error> {
        for entry in self.registry.iter() {
            let dispatcher = self.clone();
            let key = entry.key().clone();
            let handler: BoundHandler = Arc::new(move |request| {
                let dispatcher = dispatcher.clone();
                let key = key.clone();
                Box::pin(async move {
                    match dispatcher.registry.get(&key) {
                        Some(entry) => dispatcher.dispatch(entry, request).await,
                        None => error_response(
                            &ApiError::internal(format!("endpoint {key} is not registered")),
                            &dispatcher.config,
                        ),
                    }
                })
            });

            tracing::debug!(
                route = %entry.key(),
                method = entry.key().method().as_lowercase(),
                "binding endpoint"
            );
            registrar.register(entry.key(), handler)?;
        }
        Ok(())
    }

    /// Runs one request through merge, validation, the handler and the
    /// response mapping.
    pub async fn dispatch(
        &self,
        entry: &RegisteredEndpoint,
        request: DispatchRequest,
    ) -> EndpointResponse {
        let _in_flight = InFlightGuard::new();
        let DispatchRequest {
            ctx,
            captures,
            query,
            body,
        } = request;
        let route = entry.key().to_string();
        let hooks = self.registry.effective_hooks(entry);
        let mut phase = PhaseTracker::new(&ctx);

        tokendsl_telemetry::log_request_start!(ctx.request_id(), ctx.method(), ctx.path(), route);

        phase.advance(Phase::Validating);
        let outcome = match self.validate(entry, &captures, &query, &body) {
            Ok(input) => {
                phase.advance(Phase::Handling);
                run_handler(entry.handler(), input, ctx.clone()).await
            }
            Err(issues) => {
                record_validation_failure(&route);
                Err(ApiError::validation(issues))
            }
        };

        phase.advance(Phase::Responding);
        let response = self.respond(&ctx, hooks, outcome);
        phase.advance(Phase::Done);

        let elapsed = ctx.elapsed();
        record_request(&route, response.status.as_u16(), elapsed);
        tokendsl_telemetry::log_request_complete!(
            ctx.request_id(),
            response.status.as_u16(),
            elapsed.as_secs_f64() * 1000.0
        );
        response
    }

    fn validate(
        &self,
        entry: &RegisteredEndpoint,
        captures: &Params,
        query: &str,
        body: &Bytes,
    ) -> Result<Value, ValidationIssues> {
        let method = entry.key().method();
        let query = parse_query(query)?;
        let body = if method.carries_body() {
            parse_body(body)?
        } else {
            None
        };

        let merged = Value::Object(merge(entry.key().template(), captures, query, body, method)?);
        match entry.input() {
            Some(schema) => schema.validate(&merged),
            None => Ok(merged),
        }
    }

    fn respond(
        &self,
        ctx: &RequestContext,
        hooks: &HookSet,
        outcome: ApiResult<Value>,
    ) -> EndpointResponse {
        match outcome {
            Ok(value) => match hooks.success_hook() {
                Some(hook) => hook(ctx, &value),
                None => success_response(ctx.method(), value),
            },
            Err(err) => {
                match &err {
                    ApiError::Internal { source, .. } => {
                        tokendsl_telemetry::log_request_error!(ctx.request_id(), err);
                        if let Some(source) = source {
                            tracing::debug!(request_id = %ctx.request_id(), cause = ?source, "error cause");
                        }
                    }
                    ApiError::Validation { issues } => {
                        tracing::debug!(request_id = %ctx.request_id(), issues = %issues, "validation failed");
                    }
                    ApiError::NotFound { message } => {
                        tracing::debug!(request_id = %ctx.request_id(), reason = %message, "not found");
                    }
                }
                match hooks.error_hook() {
                    Some(hook) => hook(ctx, &err),
                    None => error_response(&err, &self.config),
                }
            }
        }
    }
}

async fn run_handler(handler: &HandlerFn, input: Value, ctx: RequestContext) -> ApiResult<Value> {
    let request_id = ctx.request_id();
    let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(input, ctx))) {
        Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
        Err(panic) => Err(panic),
    };

    outcome.unwrap_or_else(|panic| {
        tracing::error!(
            request_id = %request_id,
            panic = panic_message(panic.as_ref()),
            "handler panicked"
        );
        Err(ApiError::internal(HANDLER_PANICKED))
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn parse_body(body: &Bytes) -> Result<Option<Value>, ValidationIssues> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ValidationIssues::single(ROOT_PATH, format!("malformed JSON body: {e}")))
}
