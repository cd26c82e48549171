//! OpenAI-compatible chat-completion client for Relay.

mod client;
mod provider;

pub use client::ApiClient;
pub use provider::OpenAiProvider;
