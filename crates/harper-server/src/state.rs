//! Shared server state

use harper_runtime::AgentRuntime;
use harper_utils::Config;

/// State shared by every request handler
pub struct AppState {
    /// Providers, tools and configuration
    pub runtime: AgentRuntime,
}

impl AppState {
    /// Wrap a runtime
    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    /// Service configuration
    pub fn config(&self) -> &Config {
        self.runtime.config()
    }
}
