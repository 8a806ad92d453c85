//! The capability a ReAct step can dispatch to

use async_trait::async_trait;
use harper_core::Result;
use harper_llm::ToolDefinition;
use serde_json::Value;

/// A named operation the model may ask for
///
/// Arguments always arrive as a JSON object. Text-format calls are wrapped
/// as `{"input": ...}`, so implementations accept `input` as an alias of
/// their main parameter.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Run once with `params`
    ///
    /// Failures are reported as `Error::ToolExecution` so the loop can
    /// record them as observations.
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Registry key, matched exactly
    fn name(&self) -> &str;

    /// One or two sentences shown to the model
    fn description(&self) -> &str;

    /// JSON Schema of `params`
    fn input_schema(&self) -> Value;

    /// Definition handed to the model in prompts or native tool calling
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Render a tool's output as observation text
///
/// Strings are passed through; anything else is compact JSON.
pub fn output_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_text() {
        assert_eq!(output_text(&json!("345")), "345");
        assert_eq!(output_text(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(output_text(&json!(12)), "12");
    }
}
