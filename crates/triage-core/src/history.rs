//! Conversation items and the append-only history handed to responders

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItem {
    Message { role: Role, text: String },
    /// A hosted tool invocation made by the model (file search, web search)
    ToolCall { kind: String, id: String, detail: Value },
    Reasoning { summary: Vec<String> },
}

impl ConversationItem {
    pub fn user(text: impl Into<String>) -> Self {
        Self::Message {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Message {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    /// Text of a message item, `None` for tool calls and reasoning
    pub fn message_text(&self) -> Option<&str> {
        match self {
            Self::Message { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Message { role, .. } => Some(*role),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Ordered conversation shared by the responders of one workflow run.
///
/// Items can only be appended. Later agents see every earlier item, so the
/// order is part of the contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    items: Vec<ConversationItem>,
}

impl ConversationHistory {
    /// Start a conversation with a single user message
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            items: vec![ConversationItem::user(input)],
        }
    }

    pub fn push(&mut self, item: ConversationItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ConversationItem>) {
        self.items.extend(items);
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(ConversationItem::user(text));
    }

    pub fn items(&self) -> &[ConversationItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recent assistant message, if any agent has answered yet
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.items
            .iter()
            .rev()
            .find(|item| item.role() == Some(Role::Assistant))
            .and_then(ConversationItem::message_text)
    }

    /// True when `self` starts with every item of `earlier`, in order
    pub fn extends(&self, earlier: &ConversationHistory) -> bool {
        self.items.len() >= earlier.items.len()
            && self.items[..earlier.items.len()] == earlier.items[..]
    }
}
