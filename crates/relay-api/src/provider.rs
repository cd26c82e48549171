//! OpenAI chat-completion provider implementation.

use crate::client::ApiClient;
use relay_types::provider::Provider;
use relay_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use std::future::Future;
use std::pin::Pin;

/// OpenAI-compatible chat-completion provider.
///
/// Wraps `ApiClient` and implements the `Provider` trait.
#[derive(Clone, Debug)]
pub struct OpenAiProvider {
    client: ApiClient,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(api_key, base_url)?,
        })
    }
}

impl Provider for OpenAiProvider {
    fn create_chat_completion<'a>(
        &'a self,
        request: &'a ChatCompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatCompletionResponse, ApiError>> + Send + 'a>> {
        Box::pin(self.client.create_chat_completion(request))
    }

    fn name(&self) -> &str {
        "openai"
    }
}
