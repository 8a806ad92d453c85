//! Closed catalogue of tools, keyed by exact name

use crate::{CalculatorTool, ClockTool, SearchWebTool, Tool, WeatherTool};
use harper_core::{Error, Result};
use harper_llm::ToolDefinition;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Closed catalogue of named tools
///
/// Populated before it is shared; lookups afterwards are read-only, so no
/// locking is needed. Iteration order is by name.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self {
            tools: BTreeMap::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in tools
    ///
    /// `search_web` reads `TAVILY_API_KEY` from the environment.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SearchWebTool::from_env()));
        registry.register(Arc::new(CalculatorTool));
        registry.register(Arc::new(ClockTool));
        registry.register(Arc::new(WeatherTool::new()));
        registry
    }

    /// Set the per-invocation deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replacing previously registered tool");
        }
    }

    /// Look up a tool by exact name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    /// Run a tool under the registry deadline
    ///
    /// Every failure, including an expired deadline, comes back as
    /// `Error::ToolExecution`.
    pub async fn invoke(&self, tool: &dyn Tool, arguments: Value) -> Result<Value> {
        let name = tool.name();
        debug!(tool = %name, %arguments, "Invoking tool");

        match tokio::time::timeout(self.timeout, tool.execute(arguments)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err @ Error::ToolExecution { .. })) => Err(err),
            Ok(Err(other)) => Err(Error::tool(name, other.to_string())),
            Err(_) => Err(Error::tool(
                name,
                format!("timed out after {}s", self.timeout.as_secs()),
            )),
        }
    }

    /// Definitions of every tool, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        async fn execute(&self, _params: Value) -> Result<Value> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(json!("late"))
        }

        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Never finishes in time"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        async fn execute(&self, _params: Value) -> Result<Value> {
            Err(Error::Generic("disk on fire".into()))
        }

        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ToolRegistry::builtin();
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.names(),
            vec!["calculator", "get_current_time", "search_web", "weather_lookup"]
        );

        let defs = registry.definitions();
        assert_eq!(defs[0].name, "calculator");
        assert!(defs.iter().all(|d| d.input_schema["type"] == "object"));
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ToolRegistry::builtin();
        assert!(registry.resolve("calculator").is_ok());
        assert!(matches!(
            registry.resolve("Calculator"),
            Err(Error::UnknownTool(name)) if name == "Calculator"
        ));
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let registry = ToolRegistry::builtin();
        let tool = registry.resolve("calculator").unwrap();
        let output = registry
            .invoke(tool.as_ref(), json!({"expression": "15 * 23"}))
            .await
            .unwrap();
        assert_eq!(output, json!("345"));
    }

    #[tokio::test]
    async fn test_invoke_timeout() {
        let mut registry = ToolRegistry::new().with_timeout(Duration::from_millis(20));
        registry.register(Arc::new(SlowTool));
        let tool = registry.resolve("slow").unwrap();

        let err = registry.invoke(tool.as_ref(), json!({})).await.unwrap_err();
        assert!(matches!(err, Error::ToolExecution { ref tool, .. } if tool == "slow"));
    }

    #[tokio::test]
    async fn test_invoke_wraps_other_errors() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(BrokenTool));
        let tool = registry.resolve("broken").unwrap();

        let err = registry.invoke(tool.as_ref(), json!({})).await.unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("disk on fire"));
    }
}
