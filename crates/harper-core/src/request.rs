//! Validated request values
//!
//! Raw request fields are turned into these types before the ReAct loop is
//! constructed, so the loop never sees an empty query, an unsupported model,
//! or a non-positive iteration bound.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The user's question, guaranteed non-blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Validate and wrap a query string
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }
        Ok(Self(text))
    }

    /// The query text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vendor family a model belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// OpenAI GPT models
    OpenAI,
    /// Anthropic Claude models
    Anthropic,
}

impl ModelFamily {
    /// Provider name as reported by `LLMProvider::name`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model name that maps to a supported family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    name: String,
    family: ModelFamily,
}

impl ModelSelector {
    /// Parse a model name
    ///
    /// Names starting with `gpt` select OpenAI, names starting with `claude`
    /// select Anthropic. Matching is case-sensitive since providers reject
    /// model ids in any other casing.
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.trim();

        let family = if trimmed.starts_with("gpt") {
            ModelFamily::OpenAI
        } else if trimmed.starts_with("claude") {
            ModelFamily::Anthropic
        } else {
            return Err(Error::InvalidModel(name.to_string()));
        };

        Ok(Self {
            name: trimmed.to_string(),
            family,
        })
    }

    /// Model identifier sent to the provider
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Family used to pick the provider
    pub fn family(&self) -> ModelFamily {
        self.family
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Positive bound on loop iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MaxIterations(u32);

impl MaxIterations {
    /// Validate a requested bound against `1..=limit`
    pub fn new(value: i64, limit: u32) -> Result<Self> {
        match u32::try_from(value) {
            Ok(v) if v >= 1 && v <= limit => Ok(Self(v)),
            _ => Err(Error::InvalidIterationBound { value, limit }),
        }
    }

    /// The bound as a count
    pub fn get(self) -> usize {
        self.0 as usize
    }
}
