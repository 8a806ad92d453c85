//! How a tool is described to a model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name, description and JSON Schema of one tool
///
/// Rendered into the ReAct system prompt and, with native tool calling,
/// sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Small JSON Schema constructors
pub mod schema {
    use serde_json::{Value, json};

    /// Object schema with the given properties and required keys
    ///
    /// # Example
    ///
    /// ```
    /// use harper_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let city = schema::object(
    ///     json!({ "city": schema::string("City name") }),
    ///     &["city"],
    /// );
    /// assert_eq!(city["required"][0], "city");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_with_schema() {
        let input = schema::object(json!({ "query": schema::string("What to look up") }), &["query"]);
        let search = ToolDefinition::new("search_web", "Web search", input);

        assert_eq!(search.input_schema["type"], "object");
        assert_eq!(search.input_schema["properties"]["query"]["type"], "string");
        assert_eq!(search.input_schema["required"], json!(["query"]));

        let wire = serde_json::to_value(&search).unwrap();
        assert_eq!(wire["name"], "search_web");
    }
}
