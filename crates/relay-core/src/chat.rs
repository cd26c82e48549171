//! The interactive chat loop.

use crate::conversation::Conversation;
use crate::relay::{Relay, RelayEvent};
use relay_types::{RelayError, Usage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One line of user input, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand<'a> {
    /// `quit` in any letter case.
    Quit,
    /// Nothing but whitespace.
    Empty,
    /// A query, trimmed.
    Query(&'a str),
}

impl<'a> InputCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            InputCommand::Empty
        } else if trimmed.eq_ignore_ascii_case("quit") {
            InputCommand::Quit
        } else {
            InputCommand::Query(trimmed)
        }
    }
}

/// Read queries line by line and relay each one until `quit` or end of input.
///
/// A failed turn is reported through [`RelayEvent::TurnFailed`] and the loop
/// keeps going. Only errors reading `input` end the loop early.
/// Returns the token usage accumulated over all successful turns.
pub async fn run_chat_loop<R, F>(
    relay: &Relay,
    conversation: &mut Conversation,
    input: R,
    mut on_event: F,
) -> Result<Usage, RelayError>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(RelayEvent),
{
    let mut total_usage = Usage::default();
    let mut lines = input.lines();

    loop {
        on_event(RelayEvent::AwaitingInput);
        let Some(line) = lines.next_line().await? else {
            tracing::debug!("End of input");
            break;
        };

        match InputCommand::parse(&line) {
            InputCommand::Quit => break,
            InputCommand::Empty => continue,
            InputCommand::Query(query) => {
                match relay.run_turn(conversation, query, &mut on_event).await {
                    Ok(usage) => total_usage.add(&usage),
                    Err(e) => {
                        tracing::warn!("Turn failed: {e}");
                        on_event(RelayEvent::TurnFailed(e.to_string()));
                    }
                }
            }
        }
    }

    Ok(total_usage)
}
