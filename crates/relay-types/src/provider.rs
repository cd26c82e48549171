//! Provider trait for chat-completion backends.

use crate::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use std::future::Future;
use std::pin::Pin;

/// Trait for chat-completion providers.
///
/// Each call is self-contained: the request carries the whole conversation.
/// Dyn-compatible so the relay works with `Arc<dyn Provider>`.
pub trait Provider: Send + Sync {
    /// Send one chat-completion request and wait for the full response.
    fn create_chat_completion<'a>(
        &'a self,
        request: &'a ChatCompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatCompletionResponse, ApiError>> + Send + 'a>>;

    /// Provider name for logging/display (e.g., "openai").
    fn name(&self) -> &str;
}
