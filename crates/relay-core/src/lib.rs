//! Conversation state and the chat turn loop for Relay.

mod chat;
mod conversation;
mod relay;

pub use chat::{InputCommand, run_chat_loop};
pub use conversation::Conversation;
pub use relay::{Relay, RelayEvent};
