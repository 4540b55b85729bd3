//! Controller Messages
//!
//! Messages sent from the Controller to UI surfaces. These describe every
//! change to the synchronized session state plus user-facing notices.
//!
//! # Design Philosophy
//!
//! Surfaces are pure renderers. A surface that applies every message in the
//! order it was sent ends up holding the same conversations, selection,
//! messages and busy flag as the Controller, without ever talking to the
//! backend itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::{ChatMessage, Conversation};

/// Messages from Controller to UI Surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ControllerMessage {
    // ============================================
    // Conversation List
    // ============================================
    /// The whole conversation list was replaced by a fresh fetch
    ConversationsReplaced {
        /// The new list, in display order
        conversations: Vec<Conversation>,
    },

    /// A newly created conversation was prepended to the list
    ConversationAdded {
        /// The created conversation
        conversation: Conversation,
    },

    /// A conversation was removed after the backend confirmed deletion
    ConversationRemoved {
        /// Id of the removed conversation
        conversation_id: ConversationId,
    },

    /// A conversation received a locally derived title
    ConversationRetitled {
        /// Id of the retitled conversation
        conversation_id: ConversationId,
        /// The new title
        title: String,
    },

    // ============================================
    // Selection and Thread
    // ============================================
    /// The selected conversation changed (or was cleared)
    ///
    /// Switching to a different id (or to none) discards the displayed
    /// messages.
    SelectionChanged {
        /// The newly selected conversation, if any
        conversation: Option<Conversation>,
    },

    /// Messages for the selected conversation are being fetched
    ///
    /// The displayed thread must be empty until `MessagesReplaced` arrives.
    MessagesLoading {
        /// Conversation whose history is being fetched
        conversation_id: ConversationId,
    },

    /// The thread was replaced wholesale
    MessagesReplaced {
        /// Conversation the messages belong to
        conversation_id: ConversationId,
        /// Full ordered history
        messages: Vec<ChatMessage>,
    },

    /// Messages were appended to the thread (one user/assistant pair)
    MessagesAppended {
        /// Conversation the messages belong to
        conversation_id: ConversationId,
        /// Appended messages, in order
        messages: Vec<ChatMessage>,
    },

    /// The send-in-flight flag changed
    Busy {
        /// Whether a send is in flight
        loading: bool,
    },

    /// A send failed; carries the text so the surface may restore it
    SendFailed {
        /// The text that was not delivered
        content: String,
    },

    // ============================================
    // System Messages
    // ============================================
    /// Non-blocking notice for the user
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// Result of the startup health check
    BackendStatus {
        /// Whether the backend answered
        reachable: bool,
    },

    /// Request surface to quit
    Quit,
}

/// Conversation identifier, assigned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Borrow the raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message identifier, assigned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// Generated reply
    Assistant,
}

impl MessageRole {
    /// Label shown next to messages of this role
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Research Agent",
        }
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = ConversationId::from("c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c1\"");

        let parsed: MessageId = serde_json::from_str("\"m7\"").unwrap();
        assert_eq!(parsed, MessageId::from("m7"));
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
        let role: MessageRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, MessageRole::User);
        assert!(serde_json::from_str::<MessageRole>("\"system\"").is_err());
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(MessageRole::User.label(), "You");
        assert_eq!(MessageRole::Assistant.label(), "Research Agent");
    }
}
