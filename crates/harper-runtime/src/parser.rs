//! Turns one model reply into a directive
//!
//! A reply either finishes with an answer or asks for one tool call. Native
//! tool-use blocks take precedence; otherwise the text is scanned for
//! `FINAL_ANSWER:` and `Tool:` markers and the first marker wins.

use harper_core::{Error, Result, ToolInvocation};
use harper_llm::{ContentBlock, Message};
use regex::Regex;
use serde_json::{Value, json};

/// The parsed shape of one model turn
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Stop with a final answer
    Finish {
        /// Text before the marker
        reasoning: String,
        /// The answer
        answer: String,
    },
    /// Call a tool
    ToolCall {
        /// Text before the marker
        reasoning: String,
        /// Tool name and arguments
        invocation: ToolInvocation,
        /// Provider id when the call came from a native tool-use block
        call_id: Option<String>,
    },
}

/// Directive parser with precompiled marker patterns
#[derive(Debug, Clone)]
pub struct DirectiveParser {
    finish: Regex,
    tool: Regex,
    args: Regex,
    thought: Regex,
}

impl DirectiveParser {
    /// Compile the marker patterns
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::InitializationFailed(format!("Invalid directive pattern: {e}")))
        };

        Ok(Self {
            finish: compile(r"(?i)^\s*final[_ ]answer\s*:\s*(.*)$")?,
            tool: compile(r"(?i)^\s*tool\s*:\s*(.*)$")?,
            args: compile(r"(?i)^\s*(?:args|arguments|action input)\s*:\s*(.*)$")?,
            thought: compile(r"(?i)^\s*thought\s*:\s*")?,
        })
    }

    /// Parse a model reply
    pub fn parse(&self, message: &Message) -> Result<Directive> {
        let text = message.text().unwrap_or_default();

        if let Some(ContentBlock::ToolUse { id, name, input }) = message.tool_uses().first() {
            return Ok(Directive::ToolCall {
                reasoning: self.clean_reasoning(&text),
                invocation: ToolInvocation::new(name.clone(), normalize_arguments(input.clone())),
                call_id: Some(id.clone()),
            });
        }

        self.parse_text(&text)
    }

    /// Parse plain reply text
    pub fn parse_text(&self, text: &str) -> Result<Directive> {
        if text.trim().is_empty() {
            return Err(Error::MalformedAgentOutput("empty model output".to_string()));
        }

        let lines: Vec<&str> = text.lines().collect();

        for (i, line) in lines.iter().enumerate() {
            if let Some(caps) = self.finish.captures(line) {
                let reasoning = self.clean_reasoning(&lines[..i].join("\n"));
                let mut answer = caps[1].to_string();
                for rest in &lines[i + 1..] {
                    answer.push('\n');
                    answer.push_str(rest);
                }

                let answer = answer.trim().to_string();
                if answer.is_empty() {
                    return Err(Error::MalformedAgentOutput(
                        "final answer is empty".to_string(),
                    ));
                }
                return Ok(Directive::Finish { reasoning, answer });
            }

            if let Some(caps) = self.tool.captures(line) {
                let reasoning = self.clean_reasoning(&lines[..i].join("\n"));
                let invocation = self.tool_invocation(&caps[1], &lines[i + 1..])?;
                return Ok(Directive::ToolCall {
                    reasoning,
                    invocation,
                    call_id: None,
                });
            }
        }

        Err(Error::MalformedAgentOutput(format!(
            "no FINAL_ANSWER or Tool directive in: {}",
            preview(text)
        )))
    }

    fn tool_invocation(&self, spec: &str, following: &[&str]) -> Result<ToolInvocation> {
        // `Tool: name: args` carries its arguments inline
        let (name, inline_args) = match spec.split_once(':') {
            Some((name, args)) => (name, Some(args.trim())),
            None => (spec, None),
        };

        let name = name.trim().trim_matches(|c| c == '`' || c == '"' || c == '\'');
        if name.is_empty() {
            return Err(Error::MalformedAgentOutput(
                "tool directive without a tool name".to_string(),
            ));
        }

        let raw_args = match inline_args {
            Some(args) => args.to_string(),
            None => self.args_after(following),
        };

        Ok(ToolInvocation::new(name, parse_arguments(&raw_args)))
    }

    /// Arguments from the first `Args:` line before any other marker
    ///
    /// A JSON object may continue over several lines.
    fn args_after(&self, following: &[&str]) -> String {
        for (i, line) in following.iter().enumerate() {
            if self.finish.is_match(line) || self.tool.is_match(line) {
                break;
            }
            let Some(caps) = self.args.captures(line) else {
                continue;
            };

            let mut args = caps[1].trim().to_string();
            if args.starts_with('{') {
                for more in &following[i + 1..] {
                    if serde_json::from_str::<Value>(&args).is_ok() {
                        break;
                    }
                    args.push('\n');
                    args.push_str(more);
                }
            }
            return args;
        }
        String::new()
    }

    fn clean_reasoning(&self, text: &str) -> String {
        self.thought.replace(text.trim(), "").trim().to_string()
    }
}

/// Argument text to a JSON object
///
/// Anything that is not a JSON object is wrapped as `{"input": ...}`.
fn parse_arguments(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return json!({});
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize_arguments(value),
        Err(_) => json!({ "input": raw }),
    }
}

fn normalize_arguments(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        Value::Null => json!({}),
        Value::String(s) => json!({ "input": s }),
        other => json!({ "input": other.to_string() }),
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 200;
    let trimmed = text.trim();
    if trimmed.chars().count() > MAX {
        format!("{}...", trimmed.chars().take(MAX).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harper_llm::{MessageContent, Role};

    fn parser() -> DirectiveParser {
        DirectiveParser::new().unwrap()
    }

    fn tool_call(directive: Directive) -> (String, ToolInvocation) {
        match directive {
            Directive::ToolCall {
                reasoning,
                invocation,
                ..
            } => (reasoning, invocation),
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn test_tool_with_args_line() {
        let text = "Thought: I need to multiply these numbers.\nTool: calculator\nArgs: {\"expression\": \"15 * 23\"}";
        let (reasoning, call) = tool_call(parser().parse_text(text).unwrap());
        assert_eq!(reasoning, "I need to multiply these numbers.");
        assert_eq!(call.name, "calculator");
        assert_eq!(call.arguments, json!({"expression": "15 * 23"}));
    }

    #[test]
    fn test_plain_string_args_wrapped() {
        let (_, call) = tool_call(parser().parse_text("tool: weather_lookup\nargs: Paris").unwrap());
        assert_eq!(call.name, "weather_lookup");
        assert_eq!(call.arguments, json!({"input": "Paris"}));

        let (_, call) = tool_call(parser().parse_text("Tool: search_web\nArgs: \"rust 2024\"").unwrap());
        assert_eq!(call.arguments, json!({"input": "rust 2024"}));
    }

    #[test]
    fn test_inline_tool_form() {
        let (_, call) = tool_call(parser().parse_text("Tool: calculator: 2 + 2").unwrap());
        assert_eq!(call.name, "calculator");
        assert_eq!(call.arguments, json!({"input": "2 + 2"}));
    }

    #[test]
    fn test_tool_without_args() {
        let (_, call) = tool_call(parser().parse_text("Tool: get_current_time").unwrap());
        assert_eq!(call.name, "get_current_time");
        assert_eq!(call.arguments, json!({}));
    }

    #[test]
    fn test_multiline_json_args() {
        let text = "Tool: calculator\nArgs: {\n  \"expression\": \"1 + 1\"\n}\nsome trailing text";
        let (_, call) = tool_call(parser().parse_text(text).unwrap());
        assert_eq!(call.arguments, json!({"expression": "1 + 1"}));
    }

    #[test]
    fn test_final_answer_multiline() {
        let text = "I have the result.\nFinal Answer: 15 * 23 = 345\nThat is all.";
        match parser().parse_text(text).unwrap() {
            Directive::Finish { reasoning, answer } => {
                assert_eq!(reasoning, "I have the result.");
                assert_eq!(answer, "15 * 23 = 345\nThat is all.");
            }
            other => panic!("expected finish, got {other:?}"),
        }
    }

    #[test]
    fn test_first_marker_wins() {
        let text = "FINAL_ANSWER: 42\nTool: calculator\nArgs: 6*7";
        assert!(matches!(
            parser().parse_text(text).unwrap(),
            Directive::Finish { answer, .. } if answer.starts_with("42")
        ));

        let text = "Tool: calculator\nArgs: 6*7\nFINAL_ANSWER: 42";
        let (_, call) = tool_call(parser().parse_text(text).unwrap());
        assert_eq!(call.arguments, json!({"input": "6*7"}));
    }

    #[test]
    fn test_malformed_outputs() {
        let p = parser();
        assert!(matches!(p.parse_text(""), Err(Error::MalformedAgentOutput(_))));
        assert!(matches!(p.parse_text("   \n"), Err(Error::MalformedAgentOutput(_))));
        assert!(matches!(
            p.parse_text("I am not sure what to do."),
            Err(Error::MalformedAgentOutput(_))
        ));
        assert!(matches!(p.parse_text("FINAL_ANSWER:   "), Err(Error::MalformedAgentOutput(_))));
        assert!(matches!(p.parse_text("Tool:  \nArgs: x"), Err(Error::MalformedAgentOutput(_))));
    }

    #[test]
    fn test_native_tool_use_block() {
        let message = Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![
                ContentBlock::Text {
                    text: "Thought: check the clock".into(),
                },
                ContentBlock::ToolUse {
                    id: "call_9".into(),
                    name: "get_current_time".into(),
                    input: json!({"timezone": "UTC"}),
                },
            ])),
        };

        match parser().parse(&message).unwrap() {
            Directive::ToolCall {
                reasoning,
                invocation,
                call_id,
            } => {
                assert_eq!(reasoning, "check the clock");
                assert_eq!(invocation.name, "get_current_time");
                assert_eq!(call_id.as_deref(), Some("call_9"));
            }
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn test_text_message() {
        let message = Message::assistant("FINAL_ANSWER: hello");
        assert!(matches!(
            parser().parse(&message).unwrap(),
            Directive::Finish { answer, .. } if answer == "hello"
        ));
    }
}
