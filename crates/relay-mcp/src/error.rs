//! Error types for tool-server sessions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    /// The server command could not be started.
    #[error("Failed to launch tool server '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not found: {what}")]
    NotFound { what: String },

    /// The server answered a request with a JSON-RPC error object.
    #[error("Tool server '{server}' rejected the request (code {code}): {message}")]
    Rejected {
        server: String,
        code: i64,
        message: String,
    },

    /// The server's output closed, or its input pipe broke, before a reply arrived.
    #[error("Tool server closed before answering '{method}'")]
    ServerClosed { method: String },

    /// A reply arrived but its result did not have the expected shape.
    #[error("Malformed '{method}' reply: {detail}")]
    MalformedReply { method: String, detail: String },

    #[error("Tool server request '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
