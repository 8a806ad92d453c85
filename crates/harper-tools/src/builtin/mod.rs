//! Built-in tools
//!
//! Text-format tool calls often carry a bare string instead of a JSON
//! object. Such arguments arrive wrapped as `{"input": "..."}`, so every
//! tool here accepts `input` as an alias of its primary parameter.

mod calculator;
mod clock;
mod search;
mod weather;

pub use calculator::CalculatorTool;
pub use clock::ClockTool;
pub use search::SearchWebTool;
pub use weather::WeatherTool;

use harper_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Deserialize tool parameters, tolerating bare strings and `null`
pub(crate) fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T> {
    let params = match params {
        Value::Null => json!({}),
        Value::String(s) => json!({ "input": s }),
        other => other,
    };

    serde_json::from_value(params)
        .map_err(|e| Error::tool(tool, format!("Invalid parameters: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(alias = "input")]
        query: String,
    }

    #[test]
    fn test_parse_params_aliases() {
        let p: Params = parse_params("t", json!({"query": "rust"})).unwrap();
        assert_eq!(p.query, "rust");

        let p: Params = parse_params("t", json!({"input": "rust"})).unwrap();
        assert_eq!(p.query, "rust");

        let p: Params = parse_params("t", json!("rust")).unwrap();
        assert_eq!(p.query, "rust");
    }

    #[test]
    fn test_parse_params_missing_field() {
        let err = parse_params::<Params>("search_web", json!({})).unwrap_err();
        assert!(matches!(err, Error::ToolExecution { ref tool, .. } if tool == "search_web"));
    }
}
