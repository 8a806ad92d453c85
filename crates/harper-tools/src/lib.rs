//! Tool registry and built-in tools for harperbot
//!
//! The registry is built once at start-up and shared read-only between
//! requests. Each request resolves tools by exact name and invokes them
//! under a per-tool deadline.

pub mod builtin;
pub mod registry;
pub mod tool;

pub use builtin::{CalculatorTool, ClockTool, SearchWebTool, WeatherTool};
pub use registry::ToolRegistry;
pub use tool::{Tool, output_text};
