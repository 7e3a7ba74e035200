//! Route key parsing.
//!
//! A route key is the declarative identifier of one endpoint, written as
//! `"METHOD /path/:param"`. Parsing is pure: it validates the lexical shape
//! and produces a [`RouteKey`] whose [`Display`](fmt::Display) form parses
//! back to an equal key.
//!
//! # Grammar
//!
//! ```text
//! key      = method WS+ path
//! method   = "GET" | "POST" | "PUT" | "DELETE" | "PATCH"
//! path     = "/" | ("/" segment)+
//! segment  = literal | ":" name
//! literal  = [A-Za-z0-9_.-]+
//! name     = [A-Za-z_][A-Za-z0-9_]*
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::method::HttpMethod;

/// Reasons a route key can be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteKeyError {
    /// The key was empty or only whitespace.
    #[error("route key is empty")]
    Empty,

    /// No whitespace separates the method from the path.
    #[error("route key '{key}' must have the form 'METHOD /path'")]
    MissingPath {
        /// The offending key.
        key: String,
    },

    /// The method is not one of the supported methods.
    #[error("unsupported method '{method}', expected one of GET, POST, PUT, DELETE, PATCH")]
    UnknownMethod {
        /// The method as written.
        method: String,
    },

    /// The path does not start with `/`.
    #[error("path '{path}' must start with '/'")]
    MissingLeadingSlash {
        /// The path as written.
        path: String,
    },

    /// The path contains `//` or ends with `/`.
    #[error("path '{path}' contains an empty segment")]
    EmptySegment {
        /// The path as written.
        path: String,
    },

    /// A literal segment contains a character outside `[A-Za-z0-9_.-]`.
    #[error("invalid path segment '{segment}'")]
    InvalidSegment {
        /// The segment as written.
        segment: String,
    },

    /// A `:param` segment has an empty or non-identifier name.
    #[error("invalid parameter name in segment '{segment}'")]
    InvalidParamName {
        /// The segment as written.
        segment: String,
    },

    /// The same parameter name appears twice in one path.
    #[error("duplicate path parameter ':{name}'")]
    DuplicateParam {
        /// The repeated name.
        name: String,
    },
}

/// One segment of a [`PathTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A literal segment matched verbatim, e.g. `users`.
    Literal(String),
    /// A named capture, e.g. `:id` (stored without the colon).
    Param(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.write_str(s),
            Self::Param(name) => write!(f, ":{name}"),
        }
    }
}

/// An ordered sequence of literal and parameter segments.
///
/// The root path `/` is a template with no segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parses a path such as `/users/:id`.
    pub fn parse(path: &str) -> Result<Self, RouteKeyError> {
        let rest = path
            .strip_prefix('/')
            .ok_or_else(|| RouteKeyError::MissingLeadingSlash {
                path: path.to_string(),
            })?;

        if rest.is_empty() {
            return Ok(Self::default());
        }

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            if raw.is_empty() {
                return Err(RouteKeyError::EmptySegment {
                    path: path.to_string(),
                });
            }

            let segment = if let Some(name) = raw.strip_prefix(':') {
                if !is_identifier(name) {
                    return Err(RouteKeyError::InvalidParamName {
                        segment: raw.to_string(),
                    });
                }
                if segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(existing) if existing == name))
                {
                    return Err(RouteKeyError::DuplicateParam {
                        name: name.to_string(),
                    });
                }
                Segment::Param(name.to_string())
            } else {
                if !raw.chars().all(is_literal_char) {
                    return Err(RouteKeyError::InvalidSegment {
                        segment: raw.to_string(),
                    });
                }
                Segment::Literal(raw.to_string())
            };
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the parameter names in order of appearance.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns `true` if the template declares a parameter with this name.
    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.param_names().any(|n| n == name)
    }

    /// Returns `true` for the root path `/`.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for PathTemplate {
    type Err = RouteKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A parsed `METHOD /path` pair.
///
/// # Example
///
/// ```rust
/// use tokendsl_router::{HttpMethod, RouteKey};
///
/// let key = RouteKey::parse("GET /users/:id").unwrap();
/// assert_eq!(key.method(), HttpMethod::Get);
/// assert_eq!(key.template().to_string(), "/users/:id");
/// assert_eq!(key.to_string(), "GET /users/:id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    method: HttpMethod,
    template: PathTemplate,
}

impl RouteKey {
    /// Creates a route key from already-validated parts.
    #[must_use]
    pub fn new(method: HttpMethod, template: PathTemplate) -> Self {
        Self { method, template }
    }

    /// Parses a declarative key such as `"POST /users"`.
    ///
    /// Method and path are separated by one or more whitespace characters.
    /// The method is compared case-sensitively.
    pub fn parse(key: &str) -> Result<Self, RouteKeyError> {
        if key.trim().is_empty() {
            return Err(RouteKeyError::Empty);
        }

        let (method, path) = key
            .split_once(char::is_whitespace)
            .ok_or_else(|| RouteKeyError::MissingPath {
                key: key.to_string(),
            })?;

        let method: HttpMethod = method.parse()?;
        let path = path.trim_start();
        if path.is_empty() {
            return Err(RouteKeyError::MissingPath {
                key: key.to_string(),
            });
        }

        Ok(Self {
            method,
            template: PathTemplate::parse(path)?,
        })
    }

    /// Returns the method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the path template.
    #[must_use]
    pub const fn template(&self) -> &PathTemplate {
        &self.template
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

impl FromStr for RouteKey {
    type Err = RouteKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_literal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}
