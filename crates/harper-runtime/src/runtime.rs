//! Runtime holding shared, immutable agent dependencies
//!
//! The AgentRuntime owns the LLM providers (one per model family), the tool
//! registry and the service configuration, and builds a fresh agent for
//! each request.

use crate::agents::{ChatAgent, ChatConfig};
use crate::executor::{ExecutorConfig, ReactExecutor};
use harper_core::{Error, MaxIterations, ModelFamily, ModelSelector, Result};
use harper_llm::LLMProvider;
use harper_tools::ToolRegistry;
use harper_utils::Config;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Runtime for creating agents with dependency injection
///
/// # Example
///
/// ```no_run
/// use harper_core::{MaxIterations, ModelSelector, Query};
/// use harper_llm::providers::OpenAIProvider;
/// use harper_runtime::AgentRuntime;
/// use harper_tools::ToolRegistry;
/// use std::sync::Arc;
///
/// # async fn example() -> harper_core::Result<()> {
/// let openai = OpenAIProvider::from_env()?;
/// let runtime = AgentRuntime::builder()
///     .provider(harper_core::ModelFamily::OpenAI, Arc::new(openai))
///     .tool_registry(Arc::new(ToolRegistry::builtin()))
///     .build()?;
///
/// let executor = runtime.create_react_executor(
///     &ModelSelector::parse("gpt-4")?,
///     MaxIterations::new(3, 25)?,
/// )?;
/// let result = executor.run(&Query::new("What is 15 * 23?")?).await?;
/// println!("{}", result.answer);
/// # Ok(())
/// # }
/// ```
pub struct AgentRuntime {
    providers: HashMap<ModelFamily, Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: Config,
    native_tools: bool,
}

impl AgentRuntime {
    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get a reference to the tool registry
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// Get a reference to the service configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Families with a configured provider
    pub fn configured_families(&self) -> Vec<ModelFamily> {
        let mut families: Vec<ModelFamily> = self.providers.keys().copied().collect();
        families.sort_by_key(|f| f.as_str());
        families
    }

    /// Provider for a model family
    pub fn provider_for(&self, family: ModelFamily) -> Result<Arc<dyn LLMProvider>> {
        self.providers
            .get(&family)
            .cloned()
            .ok_or_else(|| Error::ProviderNotConfigured(family.to_string()))
    }

    /// Create a ReAct executor for one request
    pub fn create_react_executor(
        &self,
        model: &ModelSelector,
        max_iterations: MaxIterations,
    ) -> Result<ReactExecutor> {
        let provider = self.provider_for(model.family())?;
        let config = ExecutorConfig {
            model: model.name().to_string(),
            max_iterations: max_iterations.get(),
            native_tools: self.native_tools,
            ..ExecutorConfig::default()
        };

        ReactExecutor::new(provider, self.tool_registry.clone(), config)
    }

    /// Create the chat pass-through agent
    ///
    /// Chat always goes to the OpenAI family.
    pub fn create_chat_agent(&self) -> Result<ChatAgent> {
        let provider = self.provider_for(ModelFamily::OpenAI)?;
        let config = ChatConfig {
            model: self.config.chat_model.clone(),
            fallback_model: self.config.chat_fallback_model.clone(),
            ..ChatConfig::default()
        };

        Ok(ChatAgent::new(provider, config))
    }
}

/// Builder for AgentRuntime
pub struct AgentRuntimeBuilder {
    providers: HashMap<ModelFamily, Arc<dyn LLMProvider>>,
    tool_registry: Option<Arc<ToolRegistry>>,
    config: Config,
    native_tools: bool,
}

impl AgentRuntimeBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            tool_registry: None,
            config: Config::default(),
            native_tools: false,
        }
    }

    /// Register the provider serving a model family
    pub fn provider(mut self, family: ModelFamily, provider: Arc<dyn LLMProvider>) -> Self {
        self.providers.insert(family, provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = Some(registry);
        self
    }

    /// Set the service configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use provider-native tool calling in the ReAct loop
    pub fn native_tools(mut self, enabled: bool) -> Self {
        self.native_tools = enabled;
        self
    }

    /// Build the runtime
    ///
    /// Without an explicit registry the built-in tools are used, bounded by
    /// the configured tool timeout.
    pub fn build(self) -> Result<AgentRuntime> {
        self.config
            .validate()
            .map_err(|e| Error::InitializationFailed(e.to_string()))?;

        let tool_registry = self.tool_registry.unwrap_or_else(|| {
            Arc::new(ToolRegistry::builtin().with_timeout(self.config.tool_timeout))
        });

        let runtime = AgentRuntime {
            providers: self.providers,
            tool_registry,
            config: self.config,
            native_tools: self.native_tools,
        };

        info!(
            families = ?runtime.configured_families(),
            tools = ?runtime.tool_registry.names(),
            native_tools = runtime.native_tools,
            "Agent runtime ready"
        );
        Ok(runtime)
    }
}

impl Default for AgentRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
