//! MCP client session over one server process.
//!
//! Handles the MCP protocol handshake (initialize + initialized notification),
//! tool discovery (tools/list), and tool invocation (tools/call).

use crate::config::McpServerConfig;
use crate::error::McpError;
use crate::jsonrpc::{ClientInfo, InitializeParams};
use crate::transport::StdioTransport;
use relay_types::ToolDefinition;
use serde::Deserialize;

/// Information about a tool exposed by an MCP server.
#[derive(Debug, Clone, PartialEq)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl McpToolInfo {
    /// The chat-completion tool schema for this tool.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        )
    }
}

/// Result of calling a tool on an MCP server.
#[derive(Debug, Clone)]
pub struct McpToolResult {
    pub content: Vec<McpToolContent>,
    pub is_error: bool,
}

/// A content item in a tool result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum McpToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Audio, embedded resources and anything newer.
    #[serde(other)]
    Other,
}

/// Client for a single MCP server.
pub struct McpClient {
    name: String,
    transport: StdioTransport,
    tools: Vec<McpToolInfo>,
}

#[derive(Deserialize)]
struct ToolsListResult {
    tools: Vec<ToolEntry>,
}

#[derive(Deserialize)]
struct ToolEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_schema", rename = "inputSchema")]
    input_schema: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

#[derive(Deserialize)]
struct ToolCallResult {
    #[serde(default)]
    content: Vec<McpToolContent>,
    #[serde(default, rename = "isError")]
    is_error: bool,
}

impl McpClient {
    /// Connect to an MCP server: spawn, handshake, discover tools.
    ///
    /// The child process is killed if any step fails.
    pub async fn connect(config: &McpServerConfig) -> Result<Self, McpError> {
        let name = config.display_name().to_string();
        let transport =
            StdioTransport::spawn(&config.command, &config.args, &config.env, config.timeout())?;

        match Self::handshake(&name, &transport).await {
            Ok(tools) => {
                tracing::info!("MCP server '{}' connected with {} tools", name, tools.len());
                Ok(Self {
                    name,
                    transport,
                    tools,
                })
            }
            Err(e) => {
                transport.shutdown().await;
                Err(e)
            }
        }
    }

    async fn handshake(name: &str, transport: &StdioTransport) -> Result<Vec<McpToolInfo>, McpError> {
        let client = ClientInfo::new("relay", env!("CARGO_PKG_VERSION"));
        transport
            .send_request("initialize", Some(InitializeParams::new(client).to_value()))
            .await?
            .into_result(name)?;

        transport
            .send_notification("notifications/initialized", None)
            .await?;

        let result = transport
            .send_request("tools/list", None)
            .await?
            .into_result(name)?;
        parse_tools_list(result)
    }

    /// Call a tool on this server.
    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<McpToolResult, McpError> {
        let params = serde_json::json!({
            "name": tool_name,
            "arguments": arguments,
        });

        let result = self
            .transport
            .send_request("tools/call", Some(params))
            .await?
            .into_result(&self.name)?;

        if result.is_null() {
            return Err(McpError::MalformedReply {
                method: "tools/call".to_string(),
                detail: "neither result nor error".to_string(),
            });
        }

        let call_result: ToolCallResult = serde_json::from_value(result)
            .map_err(|e| McpError::MalformedReply {
                method: "tools/call".to_string(),
                detail: e.to_string(),
            })?;

        Ok(McpToolResult {
            content: call_result.content,
            is_error: call_result.is_error,
        })
    }

    /// Tools advertised by the server at connect time.
    pub fn tools(&self) -> &[McpToolInfo] {
        &self.tools
    }

    /// Tool catalog in chat-completion schema form.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(McpToolInfo::to_definition).collect()
    }

    pub fn server_name(&self) -> &str {
        &self.name
    }

    /// Close the session and stop the server process.
    pub async fn shutdown(self) {
        tracing::debug!("Shutting down MCP server '{}'", self.name);
        self.transport.shutdown().await;
    }
}

fn parse_tools_list(result: serde_json::Value) -> Result<Vec<McpToolInfo>, McpError> {
    if result.is_null() {
        return Ok(Vec::new());
    }
    let list: ToolsListResult = serde_json::from_value(result)
        .map_err(|e| McpError::MalformedReply {
            method: "tools/list".to_string(),
            detail: e.to_string(),
        })?;
    Ok(list
        .tools
        .into_iter()
        .map(|t| McpToolInfo {
            name: t.name,
            description: t.description.unwrap_or_default(),
            input_schema: t.input_schema,
        })
        .collect())
}
