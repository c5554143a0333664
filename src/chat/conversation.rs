use serde::Serialize;

use crate::error::ConversationError;

/// Content shown in a placeholder while the reply is in flight.
pub const PLACEHOLDER_CONTENT: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub is_placeholder: bool,
}

impl Turn {
    fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
            is_placeholder: false,
        }
    }

    fn placeholder() -> Self {
        Self {
            role: Role::Assistant,
            content: PLACEHOLDER_CONTENT.to_string(),
            is_placeholder: true,
        }
    }

    /// A finished assistant reply.
    pub fn is_resolved_reply(&self) -> bool {
        self.role == Role::Assistant && !self.is_placeholder
    }
}

/// Ordered transcript with at most one unresolved assistant placeholder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::user(text.into()));
    }

    pub fn append_assistant_placeholder(&mut self) -> Result<(), ConversationError> {
        if self.turns.iter().any(|t| t.is_placeholder) {
            return Err(ConversationError::PlaceholderPending);
        }
        self.turns.push(Turn::placeholder());
        Ok(())
    }

    /// Fill the unresolved placeholder with the reply and return its index.
    pub fn resolve_latest_placeholder(&mut self, text: impl Into<String>) -> Result<usize, ConversationError> {
        let index = self
            .turns
            .iter()
            .rposition(|t| t.is_placeholder)
            .ok_or(ConversationError::NoPendingPlaceholder)?;
        let turn = &mut self.turns[index];
        turn.content = text.into();
        turn.is_placeholder = false;
        Ok(index)
    }

    /// Whether the last turn is still waiting for a reply.
    pub fn awaiting_reply(&self) -> bool {
        self.turns.last().map(|t| t.is_placeholder).unwrap_or(false)
    }

    /// The user prompt the trailing placeholder answers.
    pub fn pending_prompt(&self) -> Option<&str> {
        if !self.awaiting_reply() {
            return None;
        }
        let prompt = self.turns.len().checked_sub(2).map(|i| &self.turns[i])?;
        (prompt.role == Role::User).then_some(prompt.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_resolves_in_place() {
        let mut conv = Conversation::new();
        conv.append_user("hi");
        conv.append_assistant_placeholder().unwrap();
        assert!(conv.awaiting_reply());
        assert_eq!(conv.pending_prompt(), Some("hi"));

        let index = conv.resolve_latest_placeholder("hello!").unwrap();
        assert_eq!(index, 1);
        assert_eq!(
            conv.turns(),
            &[
                Turn { role: Role::User, content: "hi".into(), is_placeholder: false },
                Turn { role: Role::Assistant, content: "hello!".into(), is_placeholder: false },
            ]
        );
        assert!(!conv.awaiting_reply());
        assert_eq!(conv.pending_prompt(), None);
    }

    #[test]
    fn resolving_without_placeholder_is_an_invariant_violation() {
        let mut conv = Conversation::new();
        assert_eq!(
            conv.resolve_latest_placeholder("x"),
            Err(ConversationError::NoPendingPlaceholder)
        );
        conv.append_user("hi");
        assert_eq!(
            conv.resolve_latest_placeholder("x"),
            Err(ConversationError::NoPendingPlaceholder)
        );
    }

    #[test]
    fn second_placeholder_is_rejected() {
        let mut conv = Conversation::new();
        conv.append_user("one");
        conv.append_assistant_placeholder().unwrap();
        conv.append_user("two");
        assert_eq!(
            conv.append_assistant_placeholder(),
            Err(ConversationError::PlaceholderPending)
        );
        assert_eq!(conv.turns().iter().filter(|t| t.is_placeholder).count(), 1);
    }

    #[test]
    fn user_turn_is_untouched_by_resolution() {
        let mut conv = Conversation::new();
        conv.append_user("question");
        conv.append_assistant_placeholder().unwrap();
        conv.resolve_latest_placeholder("answer").unwrap();
        assert_eq!(conv.turns()[0].content, "question");
        assert!(conv.turns()[1].is_resolved_reply());
        assert!(!conv.turns()[0].is_resolved_reply());
    }

    #[test]
    fn placeholder_serializes_with_flag() {
        let mut conv = Conversation::new();
        conv.append_user("hi");
        conv.append_assistant_placeholder().unwrap();
        let json = serde_json::to_value(&conv).unwrap();
        assert_eq!(json["turns"][1]["role"], "assistant");
        assert_eq!(json["turns"][1]["content"], PLACEHOLDER_CONTENT);
        assert_eq!(json["turns"][1]["is_placeholder"], true);
    }
}
