//! Core abstractions for harperbot
//!
//! This crate defines the domain types shared by the ReAct runtime and the
//! HTTP surface: validated request values, the append-only transcript, the
//! assembled agent result, and the error taxonomy.

pub mod error;
pub mod request;
pub mod result;
pub mod transcript;

pub use error::{Error, Result};
pub use request::{MaxIterations, ModelFamily, ModelSelector, Query};
pub use result::AgentResult;
pub use transcript::{Action, Observation, ReasoningStep, ToolInvocation, Transcript};
