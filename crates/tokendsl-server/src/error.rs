//! Server errors.

use thiserror::Error;
use tokendsl_router::InsertError;

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An endpoint could not be added to the routing table.
    #[error("failed to bind route: {0}")]
    Route(#[from] InsertError),

    /// Other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokendsl_router::HttpMethod;

    #[test]
    fn test_display() {
        let err = ServerError::from(InsertError::DuplicateMethod {
            method: HttpMethod::Get,
            path: "/x".to_string(),
        });
        assert_eq!(err.to_string(), "failed to bind route: GET /x is already registered");

        let err = ServerError::Bind {
            addr: "127.0.0.1:1".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().starts_with("failed to bind 127.0.0.1:1"));
    }
}
