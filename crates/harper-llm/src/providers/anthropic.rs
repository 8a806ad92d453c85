//! Anthropic messages API backend for the `claude*` model family

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Connection settings
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Endpoint root without a trailing slash
    pub api_base: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    /// Create a config with the given key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: API_BASE.to_string(),
            timeout_secs: 120,
        }
    }

    /// Read `ANTHROPIC_API_KEY` and, if set, `ANTHROPIC_API_BASE`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LLMError::ConfigurationError(
                    "ANTHROPIC_API_KEY is missing or empty".to_string(),
                )
            })?;

        let mut config = Self::new(api_key);
        if let Ok(base) = std::env::var("ANTHROPIC_API_BASE") {
            config = config.with_api_base(base);
        }
        Ok(config)
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Claude models over the messages API
///
/// Reasoning effort has no equivalent here and is dropped.
pub struct AnthropicProvider {
    http: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn with_config(config: AnthropicConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(AnthropicConfig::new(api_key))
    }

    /// Build from `ANTHROPIC_API_KEY` / `ANTHROPIC_API_BASE`
    pub fn from_env() -> Result<Self> {
        Self::with_config(AnthropicConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if let Some(effort) = request.reasoning_effort {
            debug!(?effort, "Reasoning effort dropped for Claude");
        }

        let model = request.model.clone();
        let body = WireRequest::from(request);
        let url = format!("{}/messages", self.config.api_base);
        debug!(%url, "POST messages");

        let http_response = self
            .http
            .post(url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = http_response.status();
        if !status.is_success() {
            let detail = http_response.text().await?;
            warn!(%status, %model, "Anthropic rejected the request");
            return Err(LLMError::from_status(status, detail, &model));
        }

        let WireResponse {
            content,
            stop_reason,
            usage,
        } = http_response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("undecodable messages body: {e}"))
        })?;

        debug!(
            %stop_reason,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Completion received"
        );

        Ok(CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: Some(MessageContent::Blocks(content)),
            },
            stop_reason: map_stop_reason(&stop_reason),
            usage: TokenUsage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
            },
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// Content blocks and tool definitions already use the messages API shape,
// so they are sent and received as-is.

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

impl From<CompletionRequest> for WireRequest {
    /// The messages API takes no system role; system turns are folded
    /// into the top-level `system` field.
    fn from(request: CompletionRequest) -> Self {
        let mut system: Vec<String> = request.system.into_iter().collect();
        let mut messages = Vec::with_capacity(request.messages.len());

        for message in request.messages {
            if message.role == Role::System {
                system.extend(message.text());
            } else {
                messages.push(message);
            }
        }

        Self {
            model: request.model,
            messages,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools,
            stop_sequences: request.stop_sequences,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: String,
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: usize,
    output_tokens: usize,
}

fn map_stop_reason(stop_reason: &str) -> StopReason {
    match stop_reason {
        "tool_use" => StopReason::ToolUse,
        "max_tokens" => StopReason::MaxTokens,
        "stop_sequence" => StopReason::StopSequence,
        "end_turn" => StopReason::EndTurn,
        other => {
            debug!(stop_reason = other, "Treating stop reason as end of turn");
            StopReason::EndTurn
        }
    }
}
