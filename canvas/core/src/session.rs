//! Session State
//!
//! The client-side copy of server state: the conversation list, the selected
//! conversation and its messages, and the send-in-flight flag.
//!
//! # Design Philosophy
//!
//! `Session` is plain synchronous state. It knows nothing about the network;
//! the Controller decides when to mutate it. Every method either applies a
//! change fully or not at all, and selection changes bump a generation
//! counter so results of requests issued for an older selection can be
//! recognized and dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::messages::{ConversationId, MessageId, MessageRole};

/// Number of leading words used for an auto-derived title
pub const TITLE_WORD_LIMIT: usize = 6;

/// A conversation as returned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Backend-assigned id
    pub id: ConversationId,
    /// Display title
    pub title: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last activity time (the backend orders its list by this)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One turn in a conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Backend-assigned id
    pub id: MessageId,
    /// Who wrote it
    pub role: MessageRole,
    /// Text body
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Owning conversation, when the backend includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
}

/// Identifies the selection a request was issued under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionTicket {
    /// Conversation that was selected
    pub conversation_id: ConversationId,
    /// Selection generation at issue time
    pub generation: u64,
}

/// Comparable copy of the synchronized state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Conversation list
    pub conversations: Vec<Conversation>,
    /// Selected conversation
    pub current: Option<Conversation>,
    /// Messages of the selected conversation
    pub messages: Vec<ChatMessage>,
    /// Send in flight
    pub is_loading: bool,
}

/// Client session state
#[derive(Clone, Debug, Default)]
pub struct Session {
    conversations: Vec<Conversation>,
    current: Option<Conversation>,
    messages: Vec<ChatMessage>,
    is_loading: bool,
    /// Bumped on every selection change
    generation: u64,
    /// Whether `messages` reflects the selected conversation's full history
    history_known: bool,
}

impl Session {
    /// Create an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation list, in display order
    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Selected conversation
    #[must_use]
    pub fn current(&self) -> Option<&Conversation> {
        self.current.as_ref()
    }

    /// Messages of the selected conversation
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a send is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Whether the selected conversation's history has been received
    #[must_use]
    pub fn history_known(&self) -> bool {
        self.history_known
    }

    /// Current selection generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Look up a conversation in the list
    #[must_use]
    pub fn find(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    /// Ticket for the current selection, if any
    #[must_use]
    pub fn ticket(&self) -> Option<SelectionTicket> {
        self.current.as_ref().map(|c| SelectionTicket {
            conversation_id: c.id.clone(),
            generation: self.generation,
        })
    }

    /// Whether a ticket still describes the current selection
    #[must_use]
    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        ticket.generation == self.generation
            && self
                .current
                .as_ref()
                .is_some_and(|c| c.id == ticket.conversation_id)
    }

    /// Replace the conversation list wholesale
    ///
    /// The selection is left untouched.
    pub fn replace_conversations(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
    }

    /// Select a conversation, discarding the previous thread
    pub fn select(&mut self, conversation: Conversation) -> SelectionTicket {
        self.current = Some(conversation);
        self.messages.clear();
        self.history_known = false;
        self.generation += 1;
        self.ticket_unchecked()
    }

    /// Prepend a freshly created conversation and select it with an empty thread
    pub fn add_created(&mut self, conversation: Conversation) -> SelectionTicket {
        self.conversations.insert(0, conversation.clone());
        let ticket = self.select(conversation);
        self.history_known = true;
        ticket
    }

    /// Remove a conversation from the list
    ///
    /// Returns `(removed, was_current)`. Removing the selected conversation
    /// clears the selection and its thread.
    pub fn remove_conversation(&mut self, id: &ConversationId) -> (bool, bool) {
        let before = self.conversations.len();
        self.conversations.retain(|c| &c.id != id);
        let removed = self.conversations.len() != before;

        let was_current = self.current.as_ref().is_some_and(|c| &c.id == id);
        if was_current {
            self.clear_selection();
        }

        (removed, was_current)
    }

    /// Clear the selection and its thread
    pub fn clear_selection(&mut self) {
        self.current = None;
        self.messages.clear();
        self.history_known = false;
        self.generation += 1;
    }

    /// Replace the thread if the ticket is still current
    ///
    /// Returns false (and changes nothing) for a stale ticket.
    pub fn replace_messages(&mut self, ticket: &SelectionTicket, messages: Vec<ChatMessage>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.messages = messages;
        self.history_known = true;
        true
    }

    /// Append a user/assistant pair if the ticket is still current
    pub fn append_exchange(
        &mut self,
        ticket: &SelectionTicket,
        user_message: ChatMessage,
        ai_message: ChatMessage,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.messages.push(user_message);
        self.messages.push(ai_message);
        true
    }

    /// Set the send-in-flight flag
    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    /// Apply a title to the list entry and the selection with this id
    ///
    /// Returns true if anything changed.
    pub fn retitle(&mut self, id: &ConversationId, title: &str) -> bool {
        let mut changed = false;

        if let Some(entry) = self.conversations.iter_mut().find(|c| &c.id == id) {
            if entry.title != title {
                entry.title = title.to_string();
                changed = true;
            }
        }

        if let Some(current) = self.current.as_mut().filter(|c| &c.id == id) {
            if current.title != title {
                current.title = title.to_string();
                changed = true;
            }
        }

        changed
    }

    /// Whether the next send would be the first exchange of the selection
    #[must_use]
    pub fn awaiting_first_exchange(&self) -> bool {
        self.current.is_some() && self.history_known && self.messages.is_empty()
    }

    /// Copy of the synchronized fields
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            conversations: self.conversations.clone(),
            current: self.current.clone(),
            messages: self.messages.clone(),
            is_loading: self.is_loading,
        }
    }

    fn ticket_unchecked(&self) -> SelectionTicket {
        SelectionTicket {
            conversation_id: self
                .current
                .as_ref()
                .map(|c| c.id.clone())
                .unwrap_or_else(|| ConversationId(String::new())),
            generation: self.generation,
        }
    }
}

/// Derive a conversation title from the first message text
///
/// Takes the first [`TITLE_WORD_LIMIT`] whitespace-separated words and joins
/// them with single spaces.
#[must_use]
pub fn derive_title(text: &str) -> String {
    text.split_whitespace()
        .take(TITLE_WORD_LIMIT)
        .collect::<Vec<_>>()
        .join(" ")
}
