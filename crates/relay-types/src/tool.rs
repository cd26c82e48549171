//! Tool session trait and related types.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Arguments for one tool invocation: always a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolArguments(serde_json::Map<String, serde_json::Value>);

impl ToolArguments {
    /// Convert the raw argument text produced by the model.
    ///
    /// Never fails: blank text, malformed JSON and JSON that is not an object
    /// all yield an empty argument set.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => Self(map),
            Ok(other) => {
                tracing::warn!("Tool arguments are not a JSON object, using {{}}: {other}");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Malformed tool arguments, using {{}}: {e}: {}",
                    crate::truncate_for_display(raw, 200)
                );
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn into_value(self) -> serde_json::Value {
        serde_json::Value::Object(self.0)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ToolArguments {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

impl std::fmt::Display for ToolArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = serde_json::Value::Object(self.0.clone());
        write!(f, "{value}")
    }
}

/// Result of executing a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The output content items.
    pub content: Vec<ToolOutputContent>,
    /// Whether the server flagged the result as an error.
    pub is_error: bool,
}

/// A single piece of tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolOutputContent {
    Text { text: String },
    Image { mime_type: String, data: String },
    Unsupported,
}

impl ToolOutput {
    /// Create a successful text output.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolOutputContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Render the output as the content of a tool-role message.
    pub fn to_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                ToolOutputContent::Text { text } => text.clone(),
                ToolOutputContent::Image { mime_type, .. } => format!("[image: {mime_type}]"),
                ToolOutputContent::Unsupported => "[unsupported content]".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A live connection to a tool server.
///
/// Dyn-compatible so the turn loop can hold `Arc<dyn ToolSession>` and tests
/// can substitute a fake.
pub trait ToolSession: Send + Sync {
    /// Invoke the named tool with the given arguments.
    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, crate::ToolError>> + Send + 'a>>;
}
