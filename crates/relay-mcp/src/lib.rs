//! MCP (Model Context Protocol) client implementation for Relay.
//!
//! Talks to a stdio-based MCP server using newline-delimited JSON-RPC 2.0
//! messages. The server is spawned as a child process, initialized with a
//! handshake, and its tools are discovered once and exposed through
//! [`relay_types::ToolSession`]. The [`probe`] module offers a one-shot
//! handshake check for debugging a server without a chat session.

pub mod client;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod probe;
mod session;
mod transport;

pub use client::{McpClient, McpToolContent, McpToolInfo, McpToolResult};
pub use config::McpServerConfig;
pub use error::McpError;
pub use probe::{ProbeConfig, ProbeOutcome, ProbeResponse, run_probe};
