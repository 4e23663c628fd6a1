use crate::llm::model::Message;

/// Prior user prompts of one session, oldest first.
///
/// Grows without bound; callers that need to cap request size read it
/// through [`ConversationState::recent`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, prompt: impl Into<String>) {
        self.messages.push(Message::user(prompt));
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// the last `max_turns` records, or everything when no window is set.
    /// The newest record is always included.
    pub fn recent(&self, max_turns: Option<usize>) -> Vec<Message> {
        match max_turns {
            Some(n) => {
                let start = self.messages.len().saturating_sub(n.max(1));
                self.messages[start..].to_vec()
            }
            None => self.snapshot(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_then_append_isolates_context() {
        let mut state = ConversationState::new();
        state.append("who won the 2016 final?");
        state.append("and who was man of the match?");

        state.reset();
        state.append("top 5 run scorers");

        assert_eq!(state.snapshot(), vec![Message::user("top 5 run scorers")]);
    }

    #[test]
    fn test_append_grows_in_call_order() {
        let mut state = ConversationState::new();
        let prompts = ["first", "second", "third"];

        for (i, p) in prompts.iter().enumerate() {
            state.append(*p);
            assert_eq!(state.len(), i + 1);
        }

        let contents: Vec<_> = state.snapshot().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, prompts);
    }

    #[test]
    fn test_recent_window() {
        let mut state = ConversationState::new();
        for p in ["a", "b", "c", "d"] {
            state.append(p);
        }

        let window: Vec<_> = state.recent(Some(2)).into_iter().map(|m| m.content).collect();
        assert_eq!(window, vec!["c", "d"]);
        assert_eq!(state.recent(Some(10)).len(), 4);
        assert_eq!(state.recent(None), state.snapshot());
    }

    #[test]
    fn test_zero_window_keeps_newest_prompt() {
        let mut state = ConversationState::new();
        state.append("a");
        state.append("b");
        assert_eq!(state.recent(Some(0)), vec![Message::user("b")]);
        assert!(ConversationState::new().recent(Some(0)).is_empty());
    }
}
