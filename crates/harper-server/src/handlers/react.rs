//! `POST /react`

use super::with_deadline;
use crate::dto::ReactRequest;
use crate::error::AppError;
use crate::state::AppState;
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use harper_core::{AgentResult, MaxIterations, ModelSelector, Query};
use std::sync::Arc;
use tracing::info;

/// Answer a query with the ReAct loop
///
/// The query is validated first, then the model, then the iteration bound.
/// Nothing reaches a provider until all three are valid.
pub async fn react(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReactRequest>, JsonRejection>,
) -> Result<Json<AgentResult>, AppError> {
    let Json(request) = payload?;
    let config = state.config();

    let query = Query::new(request.query)?;
    let model = ModelSelector::parse(request.model.as_deref().unwrap_or(&config.default_model))?;
    let max_iterations = MaxIterations::new(
        request
            .max_iterations
            .unwrap_or_else(|| i64::from(config.default_max_iterations)),
        config.max_iterations_limit,
    )?;

    info!(
        model = model.name(),
        max_iterations = max_iterations.get(),
        "ReAct request"
    );

    let executor = state.runtime.create_react_executor(&model, max_iterations)?;
    let result = with_deadline(config.request_timeout, executor.run(&query)).await?;

    Ok(Json(result))
}
