//! Agent response assembly

use crate::Transcript;
use serde::{Deserialize, Serialize};

/// Final output of a ReAct run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    /// The final answer
    pub answer: String,
    /// Every loop iteration, rendered as text
    pub reasoning_steps: Vec<String>,
    /// Dispatched tools in order of first use
    pub tools_used: Vec<String>,
}

impl AgentResult {
    /// Build the result from a finished run
    ///
    /// Pure and deterministic: the same answer and transcript always yield
    /// the same result.
    pub fn assemble(answer: impl Into<String>, transcript: &Transcript) -> Self {
        Self {
            answer: answer.into(),
            reasoning_steps: transcript.render(),
            tools_used: transcript.tools_used(),
        }
    }
}
