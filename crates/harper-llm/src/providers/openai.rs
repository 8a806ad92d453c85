//! OpenAI chat completions backend
//!
//! Serves the `gpt*` model family. Any OpenAI-compatible endpoint works when
//! `OPENAI_API_BASE` points at it.
//!
//! # Examples
//!
//! ```no_run
//! use harper_llm::{CompletionRequest, Message, LLMProvider, ReasoningEffort};
//! use harper_llm::providers::OpenAIProvider;
//!
//! #[tokio::main]
//! async fn main() -> harper_llm::Result<()> {
//!     let provider = OpenAIProvider::from_env()?;
//!
//!     let request = CompletionRequest::builder("gpt-5")
//!         .add_message(Message::user("Hello"))
//!         .reasoning_effort(ReasoningEffort::Minimal)
//!         .build();
//!
//!     let reply = provider.complete(request).await?;
//!     println!("{}", reply.message.text().unwrap_or_default());
//!
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, ReasoningEffort, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const API_BASE: &str = "https://api.openai.com/v1";
const HTTP_TIMEOUT_SECS: u64 = 120;

/// Connection settings
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,

    /// Endpoint root without a trailing slash
    pub api_base: String,

    /// Per-call HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Settings for `api_key` against the public endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// `OPENAI_API_KEY` is required; `OPENAI_API_BASE` overrides the endpoint
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LLMError::ConfigurationError(
                    "OPENAI_API_KEY is missing or empty".to_string(),
                )
            })?;

        let config = Self::new(api_key);
        Ok(match std::env::var("OPENAI_API_BASE") {
            Ok(base) if !base.trim().is_empty() => config.with_api_base(base),
            _ => config,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: API_BASE.to_string(),
            timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

/// OpenAI provider
///
/// Supports GPT chat models (gpt-4, gpt-4o, ...) and reasoning models
/// (gpt-5) through the chat completions endpoint.
pub struct OpenAIProvider {
    http: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Build from `OPENAI_API_KEY` / `OPENAI_API_BASE`
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone();
        let body = build_request(request);
        let url = format!("{}/chat/completions", self.config.api_base);
        debug!(%url, "POST chat completion");

        let http_response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = http_response.status();
        if !status.is_success() {
            let detail = http_response.text().await?;
            warn!(%status, %model, "OpenAI rejected the request");
            return Err(LLMError::from_status(status, detail, &model));
        }

        let wire: WireResponse = http_response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("undecodable completion body: {e}"))
        })?;

        // only the first choice is used
        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let usage = wire.usage.unwrap_or_default();
        debug!(
            finish_reason = %choice.finish_reason,
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            "Completion received"
        );

        Ok(CompletionResponse {
            message: into_message(choice.message),
            stop_reason: map_stop_reason(&choice.finish_reason),
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// Wire format, requests

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<ReasoningEffort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(rename = "stop", skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(rename = "tool_calls", skip_serializing_if = "Option::is_none")]
    calls: Option<Vec<WireCall>>,
    #[serde(rename = "tool_call_id", skip_serializing_if = "Option::is_none")]
    answers_call: Option<String>,
}

impl WireMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            calls: None,
            answers_call: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    #[serde(rename = "parameters")]
    schema: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireCallTarget,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireCallTarget {
    name: String,
    /// JSON-encoded argument object
    arguments: String,
}

// Wire format, responses

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireReply,
    #[serde(default)]
    finish_reason: String,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    content: Option<String>,
    #[serde(rename = "tool_calls")]
    calls: Option<Vec<WireCall>>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

/// Reasoning models reject `max_tokens` and `temperature`, so a request
/// with a reasoning effort sends `max_completion_tokens` and no temperature.
fn build_request(request: CompletionRequest) -> WireRequest {
    let reasoning = request.reasoning_effort.is_some();

    WireRequest {
        model: request.model,
        messages: wire_messages(request.system, request.messages),
        max_tokens: (!reasoning).then_some(request.max_tokens),
        max_completion_tokens: reasoning.then_some(request.max_tokens),
        temperature: if reasoning { None } else { request.temperature },
        reasoning_effort: request.reasoning_effort,
        tools: request.tools.as_deref().map(wire_tools),
        stop_sequences: request.stop_sequences,
    }
}

/// The system prompt travels as the first message
fn wire_messages(system: Option<String>, messages: Vec<Message>) -> Vec<WireMessage> {
    system
        .map(|prompt| WireMessage::text("system", prompt))
        .into_iter()
        .chain(messages.into_iter().flat_map(to_wire))
        .collect()
}

/// One message may expand to several: tool results are separate `tool` turns
fn to_wire(msg: Message) -> Vec<WireMessage> {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    match msg.content {
        Some(MessageContent::Text(text)) => vec![WireMessage::text(role, text)],
        Some(MessageContent::Blocks(blocks)) => blocks_to_wire(role, blocks),
        None => vec![WireMessage::text(role, String::new())],
    }
}

fn blocks_to_wire(role: &'static str, blocks: Vec<ContentBlock>) -> Vec<WireMessage> {
    let mut text = Vec::new();
    let mut calls = Vec::new();
    let mut results = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text: part } => text.push(part),
            ContentBlock::ToolUse { id, name, input } => calls.push(WireCall {
                id,
                kind: function_type(),
                function: WireCallTarget {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => results.push(WireMessage {
                role: "tool",
                content: Some(content),
                calls: None,
                answers_call: Some(tool_use_id),
            }),
        }
    }

    let mut head = Vec::new();
    if !text.is_empty() || !calls.is_empty() {
        head.push(WireMessage {
            role,
            content: (!text.is_empty()).then(|| text.join("\n")),
            calls: (!calls.is_empty()).then_some(calls),
            answers_call: None,
        });
    }
    head.extend(results);
    head
}

fn wire_tools(tools: &[ToolDefinition]) -> Vec<WireTool> {
    tools
        .iter()
        .map(|tool| WireTool {
            kind: "function",
            function: WireFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                schema: tool.input_schema.clone(),
            },
        })
        .collect()
}

/// Text and function calls of a reply as content blocks
///
/// Arguments that are not JSON are kept verbatim under `input`, so the
/// tool gets to reject them.
fn into_message(reply: WireReply) -> Message {
    let mut blocks: Vec<ContentBlock> = reply
        .content
        .filter(|c| !c.is_empty())
        .map(|text| ContentBlock::Text { text })
        .into_iter()
        .collect();

    for call in reply.calls.unwrap_or_default() {
        let input = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
            debug!(tool = %call.function.name, error = %e, "Tool call arguments are not JSON");
            serde_json::json!({ "input": call.function.arguments })
        });

        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    Message {
        role: Role::Assistant,
        content: Some(MessageContent::Blocks(blocks)),
    }
}

fn map_stop_reason(finish_reason: &str) -> StopReason {
    match finish_reason {
        "length" => StopReason::MaxTokens,
        "tool_calls" => StopReason::ToolUse,
        "stop" => StopReason::EndTurn,
        other => {
            debug!(finish_reason = other, "Treating finish reason as end of turn");
            StopReason::EndTurn
        }
    }
}
