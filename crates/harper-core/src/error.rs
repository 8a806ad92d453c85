//! Error types for harper-core

use thiserror::Error;

/// Result type alias for harper-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
///
/// Variants fall into four groups: request validation (rejected before any
/// model call), recoverable tool failures (fed back to the model as
/// observations), unrecoverable loop failures, and upstream/internal
/// failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Component initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Model name does not map to a supported model family
    #[error("Unsupported model: {0}")]
    InvalidModel(String),

    /// Iteration bound outside the accepted range
    #[error("max_iterations must be between 1 and {limit}, got {value}")]
    InvalidIterationBound {
        /// Requested bound
        value: i64,
        /// Largest accepted bound
        limit: u32,
    },

    /// Query missing or blank
    #[error("Query must not be empty")]
    EmptyQuery,

    /// Chat request carried no message with role "user"
    #[error("At least one user message is required")]
    NoUserMessage,

    /// Tool name not present in the registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool ran but failed
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution {
        /// Tool name
        tool: String,
        /// Failure description
        message: String,
    },

    /// Model output matched neither a finish nor a tool-call directive
    #[error("Malformed agent output: {0}")]
    MalformedAgentOutput(String),

    /// Language model provider failed
    #[error("Upstream model error: {0}")]
    Upstream(String),

    /// No provider is configured for the requested model family
    #[error("No provider configured for {0} models")]
    ProviderNotConfigured(String),

    /// Request deadline expired
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl Error {
    /// Build a tool execution error
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether the loop should record this error as an observation and
    /// keep going rather than abort
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::ToolExecution { .. })
    }

    /// Whether the error was caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidModel(_)
                | Self::InvalidIterationBound { .. }
                | Self::EmptyQuery
                | Self::NoUserMessage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidIterationBound { value: 0, limit: 25 };
        assert_eq!(err.to_string(), "max_iterations must be between 1 and 25, got 0");

        let err = Error::tool("calculator", "division by zero");
        assert_eq!(err.to_string(), "Tool 'calculator' failed: division by zero");
    }

    #[test]
    fn test_classification() {
        assert!(Error::UnknownTool("x".into()).is_recoverable());
        assert!(Error::tool("x", "y").is_recoverable());
        assert!(!Error::MalformedAgentOutput("?".into()).is_recoverable());

        assert!(Error::EmptyQuery.is_validation());
        assert!(Error::InvalidModel("llama".into()).is_validation());
        assert!(!Error::Upstream("503".into()).is_validation());
    }
}
