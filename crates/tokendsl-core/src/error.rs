//! Error types.
//!
//! Two families live here:
//!
//! - [`RegistryError`] is raised while a [`Registry`](crate::Registry) is
//!   built. Every variant is fatal to startup.
//! - [`ApiError`] is raised while a request is served. It is always caught
//!   at the dispatch boundary and turned into a response.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokendsl_router::{InsertError, RouteKeyError};

use crate::schema::ValidationIssues;

/// Result type for handlers and dispatch.
pub type ApiResult<T> = Result<T, ApiError>;

/// Classification of a request-time error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Input rejected by the schema or unreadable as JSON.
    Validation,
    /// The addressed resource does not exist.
    NotFound,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// An error returned by a handler or raised during dispatch.
///
/// # Example
///
/// ```
/// use tokendsl_core::{ApiError, ErrorCategory};
///
/// let err = ApiError::not_found("User not found");
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// assert_eq!(err.message(), "User not found");
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// One or more validation issues.
    #[error("Validation error: {issues}")]
    Validation {
        /// The issues, in the order they were found.
        issues: ValidationIssues,
    },

    /// The addressed resource does not exist.
    #[error("{message}")]
    NotFound {
        /// Message sent to the client.
        message: String,
    },

    /// Any other failure.
    #[error("{message}")]
    Internal {
        /// Message, only sent to the client when explicitly enabled.
        message: String,
        /// Underlying cause. Logged, never serialized.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ApiError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(issues: impl Into<ValidationIssues>) -> Self {
        Self::Validation {
            issues: issues.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error carrying its cause.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns the message without the category prefix.
    ///
    /// For validation errors this is the joined issue list.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Validation { issues } => issues.to_string(),
            Self::NotFound { message } | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Returns the validation issues, if this is a validation error.
    #[must_use]
    pub fn issues(&self) -> Option<&ValidationIssues> {
        match self {
            Self::Validation { issues } => Some(issues),
            _ => None,
        }
    }
}

impl From<ValidationIssues> for ApiError {
    fn from(issues: ValidationIssues) -> Self {
        Self::Validation { issues }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Errors raised while building a [`Registry`](crate::Registry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The route key does not parse.
    #[error("malformed route key '{key}': {source}")]
    MalformedRouteKey {
        /// The key as declared.
        key: String,
        /// Why it was rejected.
        #[source]
        source: RouteKeyError,
    },

    /// The definition has no handler.
    #[error("endpoint '{key}' has no handler")]
    MissingHandler {
        /// The route key.
        key: String,
    },

    /// Strict mode is on and the definition has no description.
    #[error("endpoint '{key}' has no description")]
    MissingDescription {
        /// The route key.
        key: String,
    },

    /// The UI schema is attached but incomplete.
    #[error("endpoint '{key}' has a UI schema without '{missing}'")]
    MalformedUiSchema {
        /// The route key.
        key: String,
        /// The absent field, `layout` or `fields`.
        missing: &'static str,
    },

    /// The route key was declared twice under the `reject` policy.
    #[error("endpoint '{key}' is declared more than once")]
    DuplicateRoute {
        /// The route key.
        key: String,
    },

    /// The method is already bound to this path shape under other parameter names.
    #[error("endpoint '{key}' conflicts with an earlier route: {source}")]
    ConflictingRoute {
        /// The route key.
        key: String,
        /// The router's description of the clash.
        #[source]
        source: InsertError,
    },
}

impl RegistryError {
    /// Returns the route key the error refers to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::MalformedRouteKey { key, .. }
            | Self::MissingHandler { key }
            | Self::MissingDescription { key }
            | Self::MalformedUiSchema { key, .. }
            | Self::DuplicateRoute { key }
            | Self::ConflictingRoute { key, .. } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidationIssue;

    #[test]
    fn test_category_status_codes() {
        assert_eq!(
            ErrorCategory::Validation.default_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCategory::NotFound.default_status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCategory::Internal.default_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_error() {
        let err = ApiError::validation(vec![ValidationIssue::new("email", "invalid email")]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.issues().map(ValidationIssues::len), Some(1));
        assert_eq!(err.message(), "email: invalid email");
    }

    #[test]
    fn test_anyhow_conversion_keeps_message_and_source() {
        let err: ApiError = anyhow::anyhow!("store unavailable").into();
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert_eq!(err.message(), "store unavailable");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_not_found_display_is_bare_message() {
        let err = ApiError::not_found("User not found");
        assert_eq!(err.to_string(), "User not found");
    }

    #[test]
    fn test_registry_error_key() {
        let err = RegistryError::MissingHandler {
            key: "GET /users".to_string(),
        };
        assert_eq!(err.key(), "GET /users");
        assert_eq!(err.to_string(), "endpoint 'GET /users' has no handler");
    }
}
