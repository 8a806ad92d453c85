//! Conversation messages
//!
//! Block content follows the Anthropic messages shape; the OpenAI backend
//! translates it on the way out.

use serde::{Deserialize, Serialize};

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Folded into the top-level system prompt by the Anthropic backend
    System,
}

/// One piece of structured content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },

    /// Native function call proposed by the model
    ToolUse {
        /// Provider-assigned call id
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Answer to an earlier `ToolUse`
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Plain text or a list of blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// One conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Successful output for the native call `tool_use_id`
    pub fn tool_result(tool_use_id: String, result: String) -> Self {
        Self::tool_result_block(tool_use_id, result, None)
    }

    /// Failure report for the native call `tool_use_id`
    pub fn tool_error(tool_use_id: String, error: String) -> Self {
        Self::tool_result_block(tool_use_id, error, Some(true))
    }

    fn tool_result_block(tool_use_id: String, content: String, is_error: Option<bool>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            }])),
        }
    }

    /// Text of the message, `None` when there is none
    ///
    /// Text blocks are joined with newlines.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Some(MessageContent::Text(s)) => Some(s.clone()),
            Some(MessageContent::Blocks(blocks)) => {
                let parts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("\n"))
                }
            }
            None => None,
        }
    }

    /// `ToolUse` blocks in order
    pub fn tool_uses(&self) -> Vec<&ContentBlock> {
        let Some(MessageContent::Blocks(blocks)) = &self.content else {
            return Vec::new();
        };
        blocks
            .iter()
            .filter(|block| matches!(block, ContentBlock::ToolUse { .. }))
            .collect()
    }

    pub fn has_tool_uses(&self) -> bool {
        self.tool_uses().first().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message() {
        let greeting = Message::user("Hello");
        assert_eq!(greeting.role, Role::User);
        assert_eq!(greeting.text().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_tool_result() {
        let reply = Message::tool_result("call_7".to_string(), "345".to_string());
        assert_eq!(reply.role, Role::User);
        assert!(!reply.has_tool_uses());
        assert_eq!(reply.text(), None);

        let wire = serde_json::to_value(Message::tool_error("call_7".into(), "boom".into())).unwrap();
        assert_eq!(wire["content"][0]["type"], "tool_result");
        assert_eq!(wire["content"][0]["is_error"], true);
    }

    #[test]
    fn test_blocks_text_joined() {
        let msg = Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![
                ContentBlock::Text { text: "first".into() },
                ContentBlock::ToolUse {
                    id: "t1".into(),
                    name: "calculator".into(),
                    input: json!({ "expression": "1+1" }),
                },
                ContentBlock::Text { text: "second".into() },
            ])),
        };
        assert_eq!(msg.text().as_deref(), Some("first\nsecond"));
        assert_eq!(msg.tool_uses().len(), 1);
    }

    #[test]
    fn test_tool_use_wire_format() {
        let block = ContentBlock::ToolUse {
            id: "toolu_1".into(),
            name: "weather_lookup".into(),
            input: json!({ "city": "Paris" }),
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_use");
        assert_eq!(value["input"]["city"], "Paris");
    }
}
