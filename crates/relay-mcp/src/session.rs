//! `ToolSession` implementation backed by an MCP client.

use crate::client::{McpClient, McpToolContent, McpToolResult};
use relay_types::{ToolArguments, ToolError, ToolOutput, ToolOutputContent, ToolSession};
use std::future::Future;
use std::pin::Pin;

impl ToolSession for McpClient {
    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: ToolArguments,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>> {
        Box::pin(async move {
            let result = McpClient::call_tool(self, name, arguments.into_value())
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool: name.to_string(),
                    message: e.to_string(),
                })?;
            Ok(into_output(result))
        })
    }
}

fn into_output(result: McpToolResult) -> ToolOutput {
    let content = result
        .content
        .into_iter()
        .map(|c| match c {
            McpToolContent::Text { text } => ToolOutputContent::Text { text },
            McpToolContent::Image { data, mime_type } => {
                ToolOutputContent::Image { mime_type, data }
            }
            McpToolContent::Other => ToolOutputContent::Unsupported,
        })
        .collect();

    ToolOutput {
        content,
        is_error: result.is_error,
    }
}
