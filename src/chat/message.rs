//! Transcript messages
//!
//! A [`Message`] is immutable once built: the transcript only ever grows by
//! appending new messages.

use crate::api::ChatTurn;
use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person at the keyboard
    User,
    /// The agent
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of a conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    citations: Option<Vec<String>>,
}

impl Message {
    /// Creates a user message
    ///
    /// # Examples
    ///
    /// ```
    /// use agentdesk::chat::{Message, Role};
    ///
    /// let msg = Message::user("What is in the handbook?");
    /// assert_eq!(msg.role(), Role::User);
    /// assert!(msg.citations().is_none());
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            citations: None,
        }
    }

    /// Creates an assistant message without citations
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            citations: None,
        }
    }

    /// Creates an assistant message carrying the sources it cites
    ///
    /// # Examples
    ///
    /// ```
    /// use agentdesk::chat::Message;
    ///
    /// let msg = Message::assistant_with_citations(
    ///     "See section 2.",
    ///     Some(vec!["handbook.pdf".to_string()]),
    /// );
    /// assert_eq!(msg.citations(), Some(&["handbook.pdf".to_string()][..]));
    /// ```
    pub fn assistant_with_citations(
        content: impl Into<String>,
        citations: Option<Vec<String>>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            citations,
        }
    }

    /// Role of the sender
    pub fn role(&self) -> Role {
        self.role
    }

    /// Message text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Cited sources, if the server returned any
    pub fn citations(&self) -> Option<&[String]> {
        self.citations.as_deref()
    }

    /// The `{role, content}` pair sent upstream as history; citations are dropped
    pub fn to_turn(&self) -> ChatTurn {
        ChatTurn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

impl From<ChatTurn> for Message {
    fn from(turn: ChatTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.content,
            citations: None,
        }
    }
}
