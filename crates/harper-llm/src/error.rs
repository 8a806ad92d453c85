//! Provider errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LLMError>;

/// Failure talking to a model backend
#[derive(Error, Debug)]
pub enum LLMError {
    /// Non-success status without a more specific mapping
    #[error("provider request failed: {0}")]
    RequestFailed(String),

    #[error("provider rejected the API key (authentication failed)")]
    AuthenticationFailed,

    #[error("provider rate limit hit: {0}")]
    RateLimitExceeded(String),

    /// HTTP 400 from the provider
    #[error("provider refused the request: {0}")]
    InvalidRequest(String),

    #[error("model '{0}' does not exist")]
    ModelNotFound(String),

    #[error("JSON error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Transport failure, including client-side timeouts
    #[error("transport error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Body arrived but did not have the expected shape
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),

    /// Missing key or bad settings at construction time
    #[error("provider misconfigured: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Map a non-success HTTP status to an error
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String, model: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::AuthenticationFailed,
            429 => Self::RateLimitExceeded(body),
            400 => Self::InvalidRequest(body),
            404 => Self::ModelNotFound(model.to_string()),
            _ => Self::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }
}

/// Provider failures surface to callers as upstream errors
impl From<LLMError> for harper_core::Error {
    fn from(err: LLMError) -> Self {
        harper_core::Error::Upstream(err.to_string())
    }
}
