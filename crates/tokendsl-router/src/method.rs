//! The closed set of HTTP methods an endpoint may be declared with.

use std::fmt;
use std::str::FromStr;

use crate::key::RouteKeyError;

/// An HTTP method accepted in a route key.
///
/// Only these five methods can be declared. Anything else is rejected when
/// the route key is parsed, so an unsupported method never reaches the
/// server's registration API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
}

impl HttpMethod {
    /// Every supported method, in declaration order.
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    /// Returns the canonical upper-case name used in route keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// Returns the lower-case registration name handed to the HTTP server.
    ///
    /// ```rust
    /// use tokendsl_router::HttpMethod;
    ///
    /// assert_eq!(HttpMethod::Delete.as_lowercase(), "delete");
    /// ```
    #[must_use]
    pub const fn as_lowercase(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
        }
    }

    /// Returns `true` for methods whose request body is part of the input.
    #[must_use]
    pub const fn carries_body(self) -> bool {
        match self {
            Self::Post | Self::Put | Self::Patch => true,
            Self::Get | Self::Delete => false,
        }
    }

    /// Maps an [`http::Method`] onto the supported set.
    ///
    /// Returns `None` for `HEAD`, `OPTIONS` and any extension method.
    #[must_use]
    pub fn from_http(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(Self::Get),
            http::Method::POST => Some(Self::Post),
            http::Method::PUT => Some(Self::Put),
            http::Method::DELETE => Some(Self::Delete),
            http::Method::PATCH => Some(Self::Patch),
            _ => None,
        }
    }

    /// Converts into the equivalent [`http::Method`].
    #[must_use]
    pub fn to_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Delete => http::Method::DELETE,
            Self::Patch => http::Method::PATCH,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RouteKeyError;

    /// Parses a method name. Comparison is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            other => Err(RouteKeyError::UnknownMethod {
                method: other.to_string(),
            }),
        }
    }
}
