//! Configuration for the tool server process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

fn default_command() -> String {
    "uv".to_string()
}

fn default_args() -> Vec<String> {
    vec!["run".to_string(), "research_server.py".to_string()]
}

/// How to launch the tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Command to run (e.g., "uv", "python").
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments to pass to the command.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Extra environment variables for the server process.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Per-request timeout in milliseconds. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            env: HashMap::new(),
            timeout_ms: None,
        }
    }
}

impl McpServerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Short label for log lines and errors: the last argument, else the command.
    pub fn display_name(&self) -> &str {
        self.args.last().unwrap_or(&self.command)
    }
}
