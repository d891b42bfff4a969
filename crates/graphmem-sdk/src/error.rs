//! SDK Error Types

use thiserror::Error;

/// SDK Result type alias
pub type SdkResult<T> = Result<T, SdkError>;

/// SDK errors
#[derive(Debug, Error)]
pub enum SdkError {
    /// Knowledge graph or configuration error from the core crate
    #[error(transparent)]
    Graph(#[from] graphmem_core::Error),

    /// Malformed hook payload or tool arguments
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SdkError {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Check if the knowledge graph could not be reached
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Graph(e) if e.is_unreachable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SdkError::invalid_input("query is required");
        assert!(err.to_string().contains("query is required"));

        let err = SdkError::from(graphmem_core::Error::Unreachable("refused".into()));
        assert!(err.is_unreachable());
        assert!(err.to_string().contains("refused"));
    }
}
