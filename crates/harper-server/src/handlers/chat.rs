//! `POST /chat` and its `/chat-gpt-5` alias

use super::with_deadline;
use crate::dto::{ChatRequest, ChatResponse, ChatRole};
use crate::error::AppError;
use crate::state::AppState;
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use harper_core::Error;
use harper_llm::Message;
use std::sync::Arc;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;

    if !request.messages.iter().any(|m| m.role == ChatRole::User) {
        return Err(Error::NoUserMessage.into());
    }

    let messages: Vec<Message> = request.messages.into_iter().map(Message::from).collect();
    let agent = state.runtime.create_chat_agent()?;
    let response = with_deadline(state.config().request_timeout, agent.respond(&messages)).await?;

    Ok(Json(ChatResponse { response }))
}
