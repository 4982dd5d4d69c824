//! Error types for influxdb-http.

use thiserror::Error;

/// Error type for influxdb-http operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Client configuration is invalid.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Which setting was rejected and why.
        message: String,
    },

    /// InfluxDB answered with a non-2xx status.
    #[error("{status} on {url}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
        /// Response body, verbatim.
        body: String,
    },

    /// The request never produced a response (connect, DNS, TLS, body read).
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Failed to serialize the request body to JSON.
    #[error("Failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to parse a value from a query response (strict mode only).
    #[error("Failed to parse query response: {message}")]
    Parse {
        /// Description of what failed to parse.
        message: String,
    },

    /// A point cannot be rendered as a line-protocol line.
    #[error("Invalid point: {message}")]
    InvalidPoint {
        /// Description of the problem.
        message: String,
    },
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// HTTP status code, if this is an [`Error::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for influxdb-http operations.
pub type Result<T> = std::result::Result<T, Error>;
