//! Agent runtime for harperbot
//!
//! This crate provides the ReAct executor (a bounded reason/act/observe
//! state machine), the directive parser and prompt it relies on, the chat
//! pass-through agent, and the AgentRuntime that picks a provider per
//! model family.

pub mod agents;
pub mod executor;
pub mod parser;
pub mod prompts;
pub mod runtime;

// Re-export key types
pub use agents::{ChatAgent, ChatConfig};
pub use executor::{ExecutorConfig, ReactExecutor, ReactExecutorBuilder};
pub use parser::{Directive, DirectiveParser};
pub use runtime::{AgentRuntime, AgentRuntimeBuilder};
