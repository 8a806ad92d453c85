//! Concrete agent implementations

pub mod chat;

pub use chat::{ChatAgent, ChatConfig};
