//! ReAct executor
//!
//! Runs the bounded reason/act/observe loop for one query:
//! 1. THINKING: ask the model for the next directive
//! 2. ACTING: resolve and invoke the requested tool
//! 3. OBSERVING: record the step and feed the observation back
//! 4. DONE or FAILED
//!
//! Tool failures and unknown tools become observations; only provider
//! errors and malformed model output abort the run.

use crate::parser::{Directive, DirectiveParser};
use crate::prompts;
use harper_core::{
    AgentResult, Error, Observation, Query, ReasoningStep, Result, ToolInvocation, Transcript,
};
use harper_llm::{
    CompletionRequest, ContentBlock, LLMProvider, Message, MessageContent, StopReason,
};
use harper_tools::{ToolRegistry, output_text};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Text-protocol replies are cut before the model invents its own observation
const OBSERVATION_STOP: &str = "Observation:";

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Model to use
    pub model: String,

    /// Maximum number of loop iterations (transcript length bound)
    pub max_iterations: usize,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,

    /// Send tool definitions for provider-native function calling
    pub native_tools: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            max_iterations: 3,
            max_tokens: 1024,
            temperature: Some(0.2),
            native_tools: false,
        }
    }
}

/// Loop state
#[derive(Debug)]
enum LoopState {
    Thinking,
    Acting {
        reasoning: String,
        invocation: ToolInvocation,
        call_id: Option<String>,
    },
    Observing {
        step: ReasoningStep,
        call_id: Option<String>,
    },
    Done(String),
    Failed(Error),
}

impl LoopState {
    fn label(&self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::Acting { .. } => "acting",
            Self::Observing { .. } => "observing",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }
}

/// Per-request mutable state, owned by one `run`
struct Run {
    conversation: Vec<Message>,
    transcript: Transcript,
}

/// Executes the ReAct loop against one provider and the shared tool registry
pub struct ReactExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    parser: DirectiveParser,
    config: ExecutorConfig,
}

impl ReactExecutor {
    /// Create a new executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Result<Self> {
        if config.max_iterations == 0 {
            return Err(Error::InitializationFailed(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            provider,
            tool_registry,
            parser: DirectiveParser::new()?,
            config,
        })
    }

    /// Create a new builder
    pub fn builder() -> ReactExecutorBuilder {
        ReactExecutorBuilder::new()
    }

    /// Get the executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Answer a query
    ///
    /// Iteration exhaustion is not an error: the run ends with a
    /// best-effort answer instead.
    pub async fn run(&self, query: &Query) -> Result<AgentResult> {
        info!(
            model = %self.config.model,
            provider = self.provider.name(),
            max_iterations = self.config.max_iterations,
            "ReAct run started"
        );

        let mut run = Run {
            conversation: vec![Message::user(query.as_str())],
            transcript: Transcript::new(),
        };
        let mut state = LoopState::Thinking;

        loop {
            debug!(state = state.label(), step = run.transcript.len() + 1, "Loop transition");

            state = match state {
                LoopState::Thinking => self.think(&mut run).await,
                LoopState::Acting {
                    reasoning,
                    invocation,
                    call_id,
                } => self.act(reasoning, invocation, call_id).await,
                LoopState::Observing { step, call_id } => self.observe(&mut run, step, call_id),
                LoopState::Done(answer) => {
                    let result = AgentResult::assemble(answer, &run.transcript);
                    info!(
                        steps = run.transcript.len(),
                        tools_used = ?result.tools_used,
                        "ReAct run finished"
                    );
                    return Ok(result);
                }
                LoopState::Failed(err) => {
                    warn!(error = %err, steps = run.transcript.len(), "ReAct run failed");
                    return Err(err);
                }
            };
        }
    }

    async fn think(&self, run: &mut Run) -> LoopState {
        let request = match self.build_request(run) {
            Ok(request) => request,
            Err(err) => return LoopState::Failed(err),
        };

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(err) => return LoopState::Failed(err.into()),
        };

        debug!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total(),
            "Model replied"
        );
        if response.stop_reason == StopReason::MaxTokens {
            warn!("Model reply truncated at max_tokens");
        }

        let directive = match self.parser.parse(&response.message) {
            Ok(directive) => directive,
            Err(err) => return LoopState::Failed(err),
        };

        match directive {
            Directive::Finish { reasoning, answer } => {
                run.transcript
                    .push(ReasoningStep::finish(reasoning, answer.clone()));
                LoopState::Done(answer)
            }
            Directive::ToolCall {
                reasoning,
                invocation,
                call_id,
            } => {
                // every tool call echoed back must be answered, so only the acted-on one stays
                let reply = match &call_id {
                    Some(id) => single_call(response.message, id),
                    None => Message::assistant(response.message.text().unwrap_or_default()),
                };
                run.conversation.push(reply);

                LoopState::Acting {
                    reasoning,
                    invocation,
                    call_id,
                }
            }
        }
    }

    async fn act(
        &self,
        reasoning: String,
        invocation: ToolInvocation,
        call_id: Option<String>,
    ) -> LoopState {
        let observation = match self.tool_registry.resolve(&invocation.name) {
            Ok(tool) => {
                info!(tool = %invocation.name, arguments = %invocation.arguments, "Dispatching tool");
                match self
                    .tool_registry
                    .invoke(tool.as_ref(), invocation.arguments.clone())
                    .await
                {
                    Ok(output) => Observation::Output(output_text(&output)),
                    Err(err) => {
                        warn!(tool = %invocation.name, error = %err, "Tool failed");
                        Observation::ToolFailed(err.to_string())
                    }
                }
            }
            Err(err) => {
                warn!(tool = %invocation.name, "Model requested an unknown tool");
                Observation::UnknownTool(format!(
                    "{err}. Available tools: {}",
                    self.tool_registry.names().join(", ")
                ))
            }
        };

        LoopState::Observing {
            step: ReasoningStep::tool(reasoning, invocation, observation),
            call_id,
        }
    }

    fn observe(&self, run: &mut Run, step: ReasoningStep, call_id: Option<String>) -> LoopState {
        if let Some(observation) = &step.observation {
            let message = match (call_id, observation) {
                (Some(id), Observation::Output(text)) => Message::tool_result(id, text.clone()),
                (Some(id), failed) => Message::tool_error(id, failed.to_string()),
                (None, observation) => Message::user(format!("Observation: {observation}")),
            };
            run.conversation.push(message);
        }

        run.transcript.push(step);

        if run.transcript.len() >= self.config.max_iterations {
            warn!(
                max_iterations = self.config.max_iterations,
                "Iteration bound reached without a final answer"
            );
            return LoopState::Done(self.best_effort_answer(&run.transcript));
        }

        LoopState::Thinking
    }

    fn best_effort_answer(&self, transcript: &Transcript) -> String {
        transcript.last_reasoning().map_or_else(
            || {
                format!(
                    "Unable to complete within the iteration bound of {} steps.",
                    self.config.max_iterations
                )
            },
            str::to_string,
        )
    }

    fn build_request(&self, run: &Run) -> Result<CompletionRequest> {
        let definitions = self.tool_registry.definitions();
        let system = prompts::system_prompt(
            &definitions,
            run.transcript.len() + 1,
            self.config.max_iterations,
            self.config.native_tools,
        )?;

        let mut builder = CompletionRequest::builder(&self.config.model)
            .system(system)
            .messages(run.conversation.clone())
            .max_tokens(self.config.max_tokens);

        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        if self.config.native_tools && !definitions.is_empty() {
            builder = builder.tools(definitions);
        } else {
            builder = builder.stop_sequences(vec![OBSERVATION_STOP.to_string()]);
        }

        Ok(builder.build())
    }
}

/// Drop every `ToolUse` block except the call being acted on
fn single_call(message: Message, call_id: &str) -> Message {
    let content = match message.content {
        Some(MessageContent::Blocks(blocks)) => {
            let total = blocks.len();
            let kept: Vec<ContentBlock> = blocks
                .into_iter()
                .filter(|block| match block {
                    ContentBlock::ToolUse { id, .. } => id == call_id,
                    _ => true,
                })
                .collect();
            if kept.len() < total {
                debug!(dropped = total - kept.len(), "Ignoring extra tool calls in one reply");
            }
            Some(MessageContent::Blocks(kept))
        }
        other => other,
    };

    Message {
        role: message.role,
        content,
    }
}

/// Builder for ReactExecutor
pub struct ReactExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl ReactExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Enable provider-native tool calling
    pub fn native_tools(mut self, enabled: bool) -> Self {
        self.config.native_tools = enabled;
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<ReactExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        ReactExecutor::new(provider, self.tool_registry, self.config)
    }
}

impl Default for ReactExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use harper_llm::{CompletionResponse, LLMError, Role, TokenUsage};
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays canned replies and records every request
    struct ScriptedProvider {
        replies: Mutex<Vec<Message>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Message>) -> Arc<Self> {
            let mut replies = replies;
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn text(replies: &[&str]) -> Arc<Self> {
            Self::new(replies.iter().map(|r| Message::assistant(*r)).collect())
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request(&self, i: usize) -> CompletionRequest {
            self.requests.lock().unwrap()[i].clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> harper_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            let message = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| LLMError::RequestFailed("script exhausted".into()))?;
            let stop_reason = if message.has_tool_uses() {
                StopReason::ToolUse
            } else {
                StopReason::EndTurn
            };
            Ok(CompletionResponse {
                message,
                stop_reason,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn executor(provider: Arc<ScriptedProvider>, max_iterations: usize) -> ReactExecutor {
        ReactExecutor::builder()
            .provider(provider)
            .tool_registry(Arc::new(ToolRegistry::builtin()))
            .max_iterations(max_iterations)
            .build()
            .unwrap()
    }

    fn query(text: &str) -> Query {
        Query::new(text).unwrap()
    }

    #[tokio::test]
    async fn test_calculator_then_finish() {
        let provider = ScriptedProvider::text(&[
            "Thought: I should multiply.\nTool: calculator\nArgs: {\"expression\": \"15 * 23\"}",
            "The calculator returned 345.\nFINAL_ANSWER: 15 * 23 = 345",
        ]);
        let result = executor(provider.clone(), 3)
            .run(&query("What is 15 * 23?"))
            .await
            .unwrap();

        assert!(result.answer.contains("345"));
        assert_eq!(result.tools_used, vec!["calculator"]);
        assert_eq!(result.reasoning_steps.len(), 2);
        assert!(result.reasoning_steps[0].contains("Observation: 345"));

        // second request carries the assistant turn and the observation
        let second = provider.request(1);
        assert_eq!(second.messages.len(), 3);
        assert_eq!(second.messages[2].text().as_deref(), Some("Observation: 345"));
        assert_eq!(second.temperature, Some(0.2));
        assert!(second.tools.is_none());
        assert_eq!(second.stop_sequences, Some(vec!["Observation:".to_string()]));
        assert!(second.system.unwrap().contains("Current step: 2 of 3"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_observed() {
        let provider = ScriptedProvider::text(&[
            "Tool: teleport\nArgs: {\"to\": \"Mars\"}",
            "FINAL_ANSWER: I cannot teleport.",
        ]);
        let result = executor(provider.clone(), 3)
            .run(&query("Take me to Mars"))
            .await
            .unwrap();

        assert_eq!(result.answer, "I cannot teleport.");
        assert!(result.tools_used.is_empty());
        assert!(result.reasoning_steps[0].contains("Observation: Error: Unknown tool: teleport"));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_tool_failure_is_observed() {
        let provider = ScriptedProvider::text(&[
            "Tool: calculator\nArgs: 1 / 0",
            "FINAL_ANSWER: Division by zero is undefined.",
        ]);
        let result = executor(provider, 3).run(&query("1/0?")).await.unwrap();

        assert_eq!(result.tools_used, vec!["calculator"]);
        assert!(result.reasoning_steps[0].contains("Division by zero"));
    }

    #[tokio::test]
    async fn test_single_iteration_exhausts() {
        let provider = ScriptedProvider::text(&[
            "Thought: Let me compute it.\nTool: calculator\nArgs: 2 + 2",
            "FINAL_ANSWER: never reached",
        ]);
        let result = executor(provider.clone(), 1)
            .run(&query("2 + 2?"))
            .await
            .unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(result.reasoning_steps.len(), 1);
        assert_eq!(result.answer, "Let me compute it.");
        assert_eq!(result.tools_used, vec!["calculator"]);
    }

    #[tokio::test]
    async fn test_exhaustion_without_reasoning() {
        let provider = ScriptedProvider::text(&[
            "Tool: get_current_time",
            "Tool: get_current_time",
        ]);
        let result = executor(provider.clone(), 2)
            .run(&query("What time is it?"))
            .await
            .unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(result.reasoning_steps.len(), 2);
        assert_eq!(
            result.answer,
            "Unable to complete within the iteration bound of 2 steps."
        );
        assert_eq!(result.tools_used, vec!["get_current_time"]);
    }

    #[tokio::test]
    async fn test_transcript_never_exceeds_bound() {
        for bound in 1..=4 {
            let replies = vec!["Tool: calculator\nArgs: 1 + 1"; 6];
            let provider = ScriptedProvider::text(&replies);
            let result = executor(provider, bound).run(&query("loop")).await.unwrap();
            assert_eq!(result.reasoning_steps.len(), bound);
        }
    }

    #[tokio::test]
    async fn test_malformed_output_fails() {
        let provider = ScriptedProvider::text(&["I'm thinking about it..."]);
        let err = executor(provider, 3).run(&query("hi")).await.unwrap_err();
        assert!(matches!(err, Error::MalformedAgentOutput(_)));
    }

    #[tokio::test]
    async fn test_provider_error_is_upstream() {
        let provider = ScriptedProvider::text(&[]);
        let err = executor(provider, 3).run(&query("hi")).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(msg) if msg.contains("script exhausted")));
    }

    #[tokio::test]
    async fn test_native_tool_call_round_trip() {
        let tool_use = Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: "call_1".into(),
                name: "calculator".into(),
                input: json!({"expression": "6 * 7"}),
            }])),
        };
        let provider = ScriptedProvider::new(vec![tool_use, Message::assistant("FINAL_ANSWER: 42")]);

        let result = ReactExecutor::builder()
            .provider(provider.clone())
            .tool_registry(Arc::new(ToolRegistry::builtin()))
            .native_tools(true)
            .build()
            .unwrap()
            .run(&query("6 times 7"))
            .await
            .unwrap();

        assert_eq!(result.answer, "42");
        assert_eq!(provider.request(0).tools.map(|t| t.len()), Some(4));

        let second = provider.request(1);
        assert!(second.messages[1].has_tool_uses());
        match &second.messages[2].content {
            Some(MessageContent::Blocks(blocks)) => assert!(matches!(
                &blocks[0],
                ContentBlock::ToolResult { tool_use_id, content, .. }
                    if tool_use_id == "call_1" && content == "42"
            )),
            other => panic!("expected tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_parallel_tool_calls_answered_one_at_a_time() {
        let two_calls = Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![
                ContentBlock::Text {
                    text: "Two things to check.".into(),
                },
                ContentBlock::ToolUse {
                    id: "a".into(),
                    name: "calculator".into(),
                    input: json!({"expression": "2 + 2"}),
                },
                ContentBlock::ToolUse {
                    id: "b".into(),
                    name: "get_current_time".into(),
                    input: json!({}),
                },
            ])),
        };
        let provider = ScriptedProvider::new(vec![two_calls, Message::assistant("FINAL_ANSWER: 4")]);

        let result = ReactExecutor::builder()
            .provider(provider.clone())
            .tool_registry(Arc::new(ToolRegistry::builtin()))
            .native_tools(true)
            .build()
            .unwrap()
            .run(&query("2 + 2, and what time is it?"))
            .await
            .unwrap();

        assert_eq!(result.answer, "4");
        assert_eq!(result.tools_used, vec!["calculator"]);

        let second = provider.request(1);
        assert!(second.stop_sequences.is_none());
        let blocks: Vec<&ContentBlock> = second
            .messages
            .iter()
            .filter_map(|m| match &m.content {
                Some(MessageContent::Blocks(blocks)) => Some(blocks.iter()),
                _ => None,
            })
            .flatten()
            .collect();
        let call_ids: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect();
        let answered: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(call_ids, vec!["a"]);
        assert_eq!(answered, call_ids);
        assert_eq!(second.messages[1].text().as_deref(), Some("Two things to check."));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(
            ReactExecutor::builder().build(),
            Err(Error::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.temperature, Some(0.2));
        assert!(!config.native_tools);
    }
}
