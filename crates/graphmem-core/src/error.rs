//! Error types for graphmem-core.

use thiserror::Error;

/// Result type alias using graphmem-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Longest response body kept in a `Remote` error.
const BODY_SNIPPET_CHARS: usize = 200;

/// Core error types for knowledge-graph operations
#[derive(Error, Debug)]
pub enum Error {
    // Remote service errors
    #[error("Knowledge graph returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Knowledge graph unreachable: {0}")]
    Unreachable(String),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    // Caller contract errors
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a remote error, keeping only a short snippet of the body
    pub fn remote(status: u16, body: impl AsRef<str>) -> Self {
        let body = body.as_ref().trim();
        let snippet: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
        Self::Remote {
            status,
            body: snippet,
        }
    }

    /// Status code of a remote error, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the service could not be reached (including timeouts)
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            // Timeouts and connection failures look the same to callers
            Error::Unreachable(e.to_string())
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
