//! The seam between agents and model vendors

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A hosted model backend
///
/// The ReAct loop and the chat pass-through only see this trait; one
/// implementation is registered per model family.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Run one completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short backend label for logs
    fn name(&self) -> &str;
}
