//! LLM provider abstraction layer for harperbot
//!
//! Conversation and completion types shared by every backend, the
//! [`LLMProvider`] trait, and the OpenAI and Anthropic backends under
//! [`providers`].

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

pub use completion::{CompletionRequest, CompletionResponse, ReasoningEffort, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

#[cfg(any(feature = "openai", feature = "anthropic"))]
pub mod providers;
