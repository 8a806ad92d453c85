//! System prompt for the ReAct agent
//!
//! Rendered with MiniJinja on every reasoning step so the model sees the
//! current step number.

use harper_core::{Error, Result};
use harper_llm::ToolDefinition;
use minijinja::{Environment, context};

const REASONING_TEMPLATE: &str = "\
You are a helpful AI assistant that can reason about questions and use tools to find answers.

Available tools:
{% for tool in tools -%}
- {{ tool.name }}: {{ tool.description }}
{%- if tool.input_schema.properties %} (arguments: {% for arg in tool.input_schema.properties %}{{ arg }}{% if not loop.last %}, {% endif %}{% endfor %}){% endif %}
{% endfor %}
Current step: {{ current_step }} of {{ max_steps }}

Think step by step about what you need to do to answer the user's question.
{%- if native_tools %}
If you need to use a tool, call it directly.
{%- else %}
If you need to use a tool, specify it in this format:
Tool: tool_name
Args: {\"argument\": \"value\"}
{%- endif %}

If you have enough information to provide a final answer, respond with:
FINAL_ANSWER: your answer here

Write your reasoning before the directive. Use exactly one directive per reply.";

/// Render the reasoning prompt
pub fn system_prompt(
    tools: &[ToolDefinition],
    current_step: usize,
    max_steps: usize,
    native_tools: bool,
) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("reasoning", REASONING_TEMPLATE)
        .map_err(|e| Error::InitializationFailed(format!("Invalid prompt template: {e}")))?;

    let template = env
        .get_template("reasoning")
        .map_err(|e| Error::Generic(format!("Prompt template missing: {e}")))?;

    template
        .render(context! {
            tools => tools,
            current_step => current_step,
            max_steps => max_steps,
            native_tools => native_tools,
        })
        .map_err(|e| Error::Generic(format!("Failed to render prompt: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use harper_llm::tools::schema;
    use serde_json::json;

    fn tools() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "calculator",
                "Perform mathematical calculations",
                schema::object(json!({"expression": schema::string("expr")}), &["expression"]),
            ),
            ToolDefinition::new(
                "get_current_time",
                "Get the current date and time",
                schema::object(json!({"timezone": schema::string("zone")}), &[]),
            ),
        ]
    }

    #[test]
    fn test_prompt_lists_tools_and_format() {
        let prompt = system_prompt(&tools(), 2, 3, false).unwrap();
        assert!(prompt.contains("- calculator: Perform mathematical calculations (arguments: expression)"));
        assert!(prompt.contains("- get_current_time: Get the current date and time"));
        assert!(prompt.contains("Current step: 2 of 3"));
        assert!(prompt.contains("Tool: tool_name\nArgs:"));
        assert!(prompt.contains("FINAL_ANSWER: your answer here"));
    }

    #[test]
    fn test_native_prompt_omits_text_format() {
        let prompt = system_prompt(&tools(), 1, 3, true).unwrap();
        assert!(prompt.contains("call it directly"));
        assert!(!prompt.contains("Tool: tool_name"));
        assert!(prompt.contains("FINAL_ANSWER:"));
    }
}
