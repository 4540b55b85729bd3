//! Chat API Traits
//!
//! The contract between the Controller and the research backend. Any type
//! implementing [`ChatApi`] can back a Controller: the HTTP client in
//! production, scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::messages::ConversationId;
use crate::session::{ChatMessage, Conversation};

/// Body of `POST /conversations`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    /// Initial title
    pub title: String,
}

/// Body of `POST /message`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Target conversation
    pub conversation_id: ConversationId,
    /// Message text as typed
    pub content: String,
}

/// Response of `POST /message`: the stored user turn and the generated reply
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageResponse {
    /// The user message as stored by the backend
    pub user_message: ChatMessage,
    /// The assistant reply
    pub ai_message: ChatMessage,
}

/// Plain `{ "message": ... }` acknowledgement
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Human readable text, if any
    #[serde(default)]
    pub message: Option<String>,
}

/// Research backend API
///
/// Every method is a single request with a binary outcome. Implementations
/// must not retry.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Fetch all conversations, in the backend's display order
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// Fetch the ordered history of one conversation
    async fn get_messages(&self, conversation_id: &ConversationId)
        -> Result<Vec<ChatMessage>, ApiError>;

    /// Create a conversation with the given title
    async fn create_conversation(&self, title: &str) -> Result<Conversation, ApiError>;

    /// Delete a conversation and its messages
    async fn delete_conversation(&self, conversation_id: &ConversationId) -> Result<(), ApiError>;

    /// Send a user message and receive the stored pair
    async fn send_message(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<SendMessageResponse, ApiError>;
}
