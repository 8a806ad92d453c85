//! Request handlers

pub mod chat;
pub mod react;

use crate::dto::HealthResponse;
use axum::Json;
use harper_core::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Run `fut` under the request deadline
pub(crate) async fn with_deadline<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| Error::Timeout(deadline.as_secs()))?
}
