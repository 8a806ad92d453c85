//! Application error types and Axum response conversion.

use crate::dto::ErrorResponse;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use harper_core::Error;
use tracing::{error, warn};

/// Request failure with HTTP status code mapping
#[derive(Debug)]
pub enum AppError {
    /// Domain, provider or deadline failure
    Core(Error),
    /// Body was not valid JSON for the endpoint's schema
    InvalidBody(String),
}

impl AppError {
    /// Status code and machine-readable kind
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidBody(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request"),
            Self::Core(err) => match err {
                Error::InvalidModel(_) => (StatusCode::BAD_REQUEST, "invalid_model"),
                Error::InvalidIterationBound { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_iteration_bound")
                }
                Error::EmptyQuery => (StatusCode::BAD_REQUEST, "empty_query"),
                Error::NoUserMessage => (StatusCode::BAD_REQUEST, "no_user_message"),
                Error::MalformedAgentOutput(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "malformed_agent_output")
                }
                Error::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
                Error::ProviderNotConfigured(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "provider_not_configured")
                }
                Error::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
        }
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        AppError::Core(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        let detail = match self {
            Self::Core(err) => err.to_string(),
            Self::InvalidBody(detail) => detail,
        };

        if status.is_server_error() {
            error!(%status, kind, %detail, "Request failed");
        } else {
            warn!(%status, kind, %detail, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: kind.to_string(),
                detail,
            }),
        )
            .into_response()
    }
}
