//! Reasoning transcript for one agent run
//!
//! A [`Transcript`] is created empty when a request starts, appended to by
//! the ReAct loop once per iteration, and dropped after the response is
//! assembled. It is never shared between requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A tool name plus its argument object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool name as proposed by the model
    pub name: String,
    /// Arguments (JSON object)
    pub arguments: Value,
}

impl ToolInvocation {
    /// Create a new invocation
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// What the model decided to do in one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Call a tool
    Tool(ToolInvocation),
    /// Stop with a final answer
    Finish {
        /// The answer text
        answer: String,
    },
}

/// Result of acting on a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Observation {
    /// Tool returned successfully
    Output(String),
    /// Tool was dispatched and failed
    ToolFailed(String),
    /// Tool name was not in the registry; nothing was dispatched
    UnknownTool(String),
}

impl Observation {
    /// The observation text fed back to the model
    pub fn text(&self) -> &str {
        match self {
            Self::Output(text) | Self::ToolFailed(text) | Self::UnknownTool(text) => text,
        }
    }

    /// Whether a tool actually ran to produce this observation
    pub fn was_dispatched(&self) -> bool {
        !matches!(self, Self::UnknownTool(_))
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(text) => f.write_str(text),
            Self::ToolFailed(text) | Self::UnknownTool(text) => write!(f, "Error: {text}"),
        }
    }
}

/// One completed loop iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// The model's reasoning text
    pub reasoning: String,
    /// Action taken
    pub action: Action,
    /// Observation; `None` for finish steps
    pub observation: Option<Observation>,
}

impl ReasoningStep {
    /// A step that called (or tried to call) a tool
    pub fn tool(
        reasoning: impl Into<String>,
        invocation: ToolInvocation,
        observation: Observation,
    ) -> Self {
        Self {
            reasoning: reasoning.into(),
            action: Action::Tool(invocation),
            observation: Some(observation),
        }
    }

    /// A terminal step carrying the final answer
    pub fn finish(reasoning: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            action: Action::Finish {
                answer: answer.into(),
            },
            observation: None,
        }
    }

    /// Name of the tool this step dispatched, if any
    pub fn dispatched_tool(&self) -> Option<&str> {
        match (&self.action, &self.observation) {
            (Action::Tool(call), Some(obs)) if obs.was_dispatched() => Some(&call.name),
            _ => None,
        }
    }
}

impl fmt::Display for ReasoningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.reasoning.is_empty() {
            writeln!(f, "Thought: {}", self.reasoning)?;
        }
        match &self.action {
            Action::Tool(call) => {
                write!(f, "Action: {}({})", call.name, call.arguments)?;
                if let Some(obs) = &self.observation {
                    write!(f, "\nObservation: {obs}")?;
                }
                Ok(())
            }
            Action::Finish { answer } => write!(f, "Action: finish\nAnswer: {answer}"),
        }
    }
}

/// Append-only sequence of reasoning steps
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    steps: Vec<ReasoningStep>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn push(&mut self, step: ReasoningStep) {
        self.steps.push(step);
    }

    /// Number of recorded steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step has been recorded
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Recorded steps in order
    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    /// Most recent non-empty reasoning text
    pub fn last_reasoning(&self) -> Option<&str> {
        self.steps
            .iter()
            .rev()
            .map(|s| s.reasoning.trim())
            .find(|r| !r.is_empty())
    }

    /// Dispatched tool names, deduplicated, in order of first use
    pub fn tools_used(&self) -> Vec<String> {
        let mut used: Vec<String> = Vec::new();
        for name in self.steps.iter().filter_map(ReasoningStep::dispatched_tool) {
            if !used.iter().any(|u| u == name) {
                used.push(name.to_string());
            }
        }
        used
    }

    /// Each step rendered as text
    pub fn render(&self) -> Vec<String> {
        self.steps.iter().map(ToString::to_string).collect()
    }
}
