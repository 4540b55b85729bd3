//! Scripted in-memory backend shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::{mpsc, Semaphore};

use canvas_core::{
    ApiError, CanvasConfig, ChatApi, ChatMessage, Controller, ControllerMessage, Conversation,
    ConversationId, MessageId, MessageRole, SendMessageResponse,
};

/// Backend operations that can be scripted to fail
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Messages,
    Create,
    Delete,
    Send,
}

/// In-memory backend with failure injection and gated responses
#[derive(Default)]
pub struct ScriptedApi {
    conversations: Mutex<Vec<Conversation>>,
    histories: Mutex<HashMap<ConversationId, Vec<ChatMessage>>>,
    failing: Mutex<HashSet<Op>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    next_conversation: AtomicUsize,
    next_message: AtomicUsize,
    pub creates: AtomicUsize,
    pub sends: AtomicUsize,
    pub sent_contents: Mutex<Vec<(ConversationId, String)>>,
    pub created_titles: Mutex<Vec<String>>,
}

pub fn timestamp(offset_secs: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_secs)
}

pub fn conversation(id: &str, title: &str) -> Conversation {
    Conversation {
        id: ConversationId::from(id),
        title: title.to_string(),
        created_at: timestamp(0),
        updated_at: None,
    }
}

pub fn message(id: &str, role: MessageRole, content: &str) -> ChatMessage {
    ChatMessage {
        id: MessageId::from(id),
        role,
        content: content.to_string(),
        timestamp: timestamp(60),
        conversation_id: None,
    }
}

fn failure(endpoint: &str) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
        body: "scripted failure".to_string(),
    }
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed an existing conversation with a history
    pub fn seed(&self, conversation: Conversation, history: Vec<ChatMessage>) {
        self.histories
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), history);
        self.conversations.lock().unwrap().push(conversation);
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.failing.lock().unwrap().remove(&op);
    }

    /// Hold responses for `key` until [`ScriptedApi::release`] is called
    ///
    /// Keys are `messages:<id>` and `send:<id>`.
    pub fn gate(&self, key: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, key: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(key) {
            gate.add_permits(1);
        }
    }

    fn failing(&self, op: Op) -> bool {
        self.failing.lock().unwrap().contains(&op)
    }

    async fn pass_gate(&self, key: String) {
        let gate = self.gates.lock().unwrap().get(&key).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl ChatApi for ScriptedApi {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn health_check(&self) -> bool {
        !self.failing(Op::List)
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        if self.failing(Op::List) {
            return Err(failure("/api/chat/conversations"));
        }
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn get_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        self.pass_gate(format!("messages:{conversation_id}")).await;
        if self.failing(Op::Messages) {
            return Err(failure("/api/chat/conversations/{id}"));
        }
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_conversation(&self, title: &str) -> Result<Conversation, ApiError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.created_titles.lock().unwrap().push(title.to_string());
        if self.failing(Op::Create) {
            return Err(failure("/api/chat/conversations"));
        }
        let n = self.next_conversation.fetch_add(1, Ordering::SeqCst) + 1;
        let created = conversation(&format!("c{n}"), title);
        self.seed(created.clone(), Vec::new());
        Ok(created)
    }

    async fn delete_conversation(&self, conversation_id: &ConversationId) -> Result<(), ApiError> {
        if self.failing(Op::Delete) {
            return Err(failure("/api/chat/conversations/{id}"));
        }
        self.conversations
            .lock()
            .unwrap()
            .retain(|c| &c.id != conversation_id);
        self.histories.lock().unwrap().remove(conversation_id);
        Ok(())
    }

    async fn send_message(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<SendMessageResponse, ApiError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.sent_contents
            .lock()
            .unwrap()
            .push((conversation_id.clone(), content.to_string()));
        self.pass_gate(format!("send:{conversation_id}")).await;
        if self.failing(Op::Send) {
            return Err(failure("/api/chat/message"));
        }

        let user_n = self.next_message.fetch_add(2, Ordering::SeqCst) + 1;
        let user_message = message(&format!("m{user_n}"), MessageRole::User, content);
        let ai_message = message(
            &format!("m{}", user_n + 1),
            MessageRole::Assistant,
            &format!("Findings on: {}", content.trim()),
        );

        if let Some(history) = self.histories.lock().unwrap().get_mut(conversation_id) {
            history.push(user_message.clone());
            history.push(ai_message.clone());
        }

        Ok(SendMessageResponse {
            user_message,
            ai_message,
        })
    }
}

/// Controller wired to a scripted backend and a roomy surface channel
pub fn controller(
    api: &Arc<ScriptedApi>,
    config: CanvasConfig,
) -> (
    Controller<ScriptedApi>,
    mpsc::Receiver<ControllerMessage>,
) {
    let (tx, rx) = mpsc::channel(1024);
    (Controller::with_shared_api(Arc::clone(api), config, tx), rx)
}

pub fn drain(rx: &mut mpsc::Receiver<ControllerMessage>) -> Vec<ControllerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

pub fn notices(messages: &[ControllerMessage]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            ControllerMessage::Notify { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
