//! The turn loop: relays one user query between the model and the tool server.

use crate::conversation::Conversation;
use relay_types::provider::Provider;
use relay_types::{
    ApiError, ChatCompletionRequest, ChatMessage, RelayError, ToolArguments, ToolDefinition,
    ToolSession, Usage,
};
use std::sync::Arc;

/// Events emitted by the relay during a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// The chat loop is waiting for the next line of input.
    AwaitingInput,
    /// Text from the assistant's response.
    Text(String),
    /// A tool is about to be invoked.
    ToolCall {
        name: String,
        arguments: ToolArguments,
    },
    /// A tool has answered.
    ToolResult { name: String, is_error: bool },
    /// The turn ended with an error; the conversation has been repaired.
    TurnFailed(String),
    /// The model answered without requesting further tools.
    TurnComplete,
}

/// Connects a chat-completion provider to a tool session.
pub struct Relay {
    provider: Arc<dyn Provider>,
    session: Arc<dyn ToolSession>,
    tools: Vec<ToolDefinition>,
    model: String,
    max_tokens: u32,
}

impl Relay {
    pub fn new(
        provider: Arc<dyn Provider>,
        session: Arc<dyn ToolSession>,
        tools: Vec<ToolDefinition>,
        model: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            session,
            tools,
            model,
            max_tokens,
        }
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one user turn to completion.
    ///
    /// Appends the query, then alternates model calls and tool invocations
    /// until the model answers without tool calls. On error, every tool call
    /// left unanswered is closed with an `error: <message>` tool entry before
    /// the error is returned.
    pub async fn run_turn<F>(
        &self,
        conversation: &mut Conversation,
        query: &str,
        mut on_event: F,
    ) -> Result<Usage, RelayError>
    where
        F: FnMut(RelayEvent),
    {
        let mut usage = Usage::default();
        conversation.push(ChatMessage::user(query));

        match self.relay(conversation, &mut usage, &mut on_event).await {
            Ok(()) => {
                on_event(RelayEvent::TurnComplete);
                Ok(usage)
            }
            Err(e) => {
                let closed = conversation.close_dangling_calls(&format!("error: {e}"));
                if closed > 0 {
                    tracing::debug!("Closed {closed} unanswered tool call(s) after failure");
                }
                Err(e)
            }
        }
    }

    async fn relay<F>(
        &self,
        conversation: &mut Conversation,
        usage: &mut Usage,
        on_event: &mut F,
    ) -> Result<(), RelayError>
    where
        F: FnMut(RelayEvent),
    {
        loop {
            let request = ChatCompletionRequest {
                model: self.model.clone(),
                messages: conversation.messages().to_vec(),
                tools: self.tools.clone(),
                max_tokens: self.max_tokens,
            };

            tracing::debug!(
                "Requesting completion from {} ({} messages)",
                self.provider.name(),
                request.messages.len()
            );
            let response = self.provider.create_chat_completion(&request).await?;
            if let Some(u) = &response.usage {
                usage.add(u);
            }

            let message = response.first_message().ok_or(ApiError::EmptyResponse)?;
            let text = message.text().map(str::to_string);
            if let Some(text) = &text {
                on_event(RelayEvent::Text(text.clone()));
            }

            if message.tool_calls.is_empty() {
                if text.is_some() {
                    conversation.push(ChatMessage::assistant(text, Vec::new()));
                }
                return Ok(());
            }

            let calls = message.tool_calls.clone();
            conversation.push(ChatMessage::assistant(text, calls.clone()));

            for call in &calls {
                let name = &call.function.name;
                let arguments = ToolArguments::parse_lenient(&call.function.arguments);
                on_event(RelayEvent::ToolCall {
                    name: name.clone(),
                    arguments: arguments.clone(),
                });

                tracing::debug!("Calling tool {name} with {arguments}");
                let output = self.session.call_tool(name, arguments).await?;

                on_event(RelayEvent::ToolResult {
                    name: name.clone(),
                    is_error: output.is_error,
                });
                conversation.push(ChatMessage::tool(&call.id, output.to_text()));
            }
        }
    }
}
