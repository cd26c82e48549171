use relay_types::{ChatMessage, Role, ToolCall};

/// The ordered message history sent to the model on every call.
///
/// Append-only: entries are never removed or reordered.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Tool calls of the last assistant entry that no tool entry answers yet.
    pub fn unanswered_tool_calls(&self) -> Vec<&ToolCall> {
        let Some(pos) = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
        else {
            return Vec::new();
        };

        let answered: Vec<&str> = self.messages[pos + 1..]
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        self.messages[pos]
            .tool_calls
            .iter()
            .filter(|call| !answered.contains(&call.id.as_str()))
            .collect()
    }

    /// Answer every unanswered tool call with `content`.
    ///
    /// Returns how many tool entries were appended.
    pub fn close_dangling_calls(&mut self, content: &str) -> usize {
        let ids: Vec<String> = self
            .unanswered_tool_calls()
            .into_iter()
            .map(|call| call.id.clone())
            .collect();
        for id in &ids {
            self.messages.push(ChatMessage::tool(id, content));
        }
        ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str) -> ToolCall {
        ToolCall::function(id, "search_papers", "{}")
    }

    #[test]
    fn new_conversation_is_empty() {
        let conversation = Conversation::new();
        assert!(conversation.is_empty());
        assert!(conversation.unanswered_tool_calls().is_empty());
    }

    #[test]
    fn push_preserves_order() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("first"));
        conversation.push(ChatMessage::assistant(Some("second".into()), vec![]));
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].text(), Some("first"));
        assert_eq!(conversation.messages()[1].text(), Some("second"));
    }

    #[test]
    fn unanswered_calls_ignore_answered_ones() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("q"));
        conversation.push(ChatMessage::assistant(None, vec![call("a"), call("b")]));
        conversation.push(ChatMessage::tool("a", "done"));

        let pending = conversation.unanswered_tool_calls();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "b");
    }

    #[test]
    fn close_dangling_calls_appends_in_call_order() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("q"));
        conversation.push(ChatMessage::assistant(None, vec![call("a"), call("b")]));

        assert_eq!(conversation.close_dangling_calls("error: boom"), 2);
        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.messages()[2].tool_call_id.as_deref(), Some("a"));
        assert_eq!(conversation.messages()[3].tool_call_id.as_deref(), Some("b"));
        assert_eq!(conversation.messages()[3].text(), Some("error: boom"));
        assert!(conversation.unanswered_tool_calls().is_empty());
    }

    #[test]
    fn close_dangling_calls_without_calls_is_noop() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("q"));
        assert_eq!(conversation.close_dangling_calls("error: x"), 0);
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn only_last_assistant_entry_counts() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::assistant(None, vec![call("old")]));
        conversation.push(ChatMessage::tool("old", "ok"));
        conversation.push(ChatMessage::assistant(Some("answer".into()), vec![]));
        assert!(conversation.unanswered_tool_calls().is_empty());
    }
}
