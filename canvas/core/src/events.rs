//! Surface Events
//!
//! Events sent from UI surfaces to the Controller. These are user intents:
//! a surface reports what the user asked for and the Controller decides what
//! happens to the session state.
//!
//! # Design Philosophy
//!
//! Surfaces never call the backend. Every intent goes through the Controller
//! so that ordering, precondition checks and stale-response handling live in
//! one place.

use serde::{Deserialize, Serialize};

use crate::messages::ConversationId;

/// Events from UI Surface to Controller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Re-fetch the conversation list
    RefreshConversations,

    /// User picked a conversation from the sidebar
    SelectConversation {
        /// The conversation to select
        conversation_id: ConversationId,
    },

    /// User asked for a fresh conversation
    NewConversation,

    /// User asked to delete a conversation
    DeleteConversation {
        /// The conversation to delete
        conversation_id: ConversationId,
    },

    /// User submitted text from the input box
    SubmitMessage {
        /// The text as typed (not trimmed)
        content: String,
    },

    /// User wants to quit
    QuitRequested,
}

impl SurfaceEvent {
    /// Short name for log fields
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RefreshConversations => "refresh_conversations",
            Self::SelectConversation { .. } => "select_conversation",
            Self::NewConversation => "new_conversation",
            Self::DeleteConversation { .. } => "delete_conversation",
            Self::SubmitMessage { .. } => "submit_message",
            Self::QuitRequested => "quit_requested",
        }
    }
}
