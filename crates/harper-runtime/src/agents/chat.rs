//! Single-turn chat agent (LLM only, no tools)

use harper_core::{Error, Result};
use harper_llm::{CompletionRequest, LLMProvider, Message, ReasoningEffort, Role};
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for the chat agent
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Primary model, called with minimal reasoning effort
    pub model: String,

    /// Token budget for the primary model
    pub max_tokens: usize,

    /// Model tried when the primary fails
    pub fallback_model: String,

    /// Sampling temperature for the fallback model
    pub fallback_temperature: f32,

    /// Max tokens for the fallback model
    pub fallback_max_tokens: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-5".to_string(),
            max_tokens: 4096,
            fallback_model: "gpt-4".to_string(),
            fallback_temperature: 0.2,
            fallback_max_tokens: 1000,
        }
    }
}

/// Forwards the latest user message to the model and returns its reply
///
/// The conversation history is not replayed; only the last `user` message
/// is sent.
pub struct ChatAgent {
    provider: Arc<dyn LLMProvider>,
    config: ChatConfig,
}

impl ChatAgent {
    /// Create a new chat agent
    pub fn new(provider: Arc<dyn LLMProvider>, config: ChatConfig) -> Self {
        Self { provider, config }
    }

    /// Get the agent's configuration
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Reply to the last user message in `messages`
    pub async fn respond(&self, messages: &[Message]) -> Result<String> {
        let input = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .and_then(Message::text)
            .ok_or(Error::NoUserMessage)?;

        let primary = CompletionRequest::builder(&self.config.model)
            .add_message(Message::user(input.clone()))
            .max_tokens(self.config.max_tokens)
            .reasoning_effort(ReasoningEffort::Minimal)
            .build();

        let primary_err = match self.complete(primary).await {
            Ok(reply) => return Ok(reply),
            Err(err) => err,
        };

        warn!(
            model = %self.config.model,
            fallback = %self.config.fallback_model,
            error = %primary_err,
            "Primary chat model failed, trying fallback"
        );

        let fallback = CompletionRequest::builder(&self.config.fallback_model)
            .add_message(Message::user(input))
            .max_tokens(self.config.fallback_max_tokens)
            .temperature(self.config.fallback_temperature)
            .build();

        self.complete(fallback).await.map_err(|fallback_err| {
            Error::Upstream(format!(
                "Both {} and fallback {} failed. {} error: {primary_err}; fallback error: {fallback_err}",
                self.config.model, self.config.fallback_model, self.config.model
            ))
        })
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<String, String> {
        let model = request.model.clone();
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| e.to_string())?;

        let reply = response
            .message
            .text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| "empty response".to_string())?;

        info!(
            %model,
            output_tokens = response.usage.output_tokens,
            "Chat reply received"
        );
        Ok(reply)
    }
}
