//! Controller - Conversation Session Orchestration
//!
//! The Controller owns the session state and mediates every transition:
//! - user intents arriving as [`SurfaceEvent`]s
//! - backend results arriving as completions of spawned requests
//!
//! # Design Philosophy
//!
//! The Controller is UI-agnostic. It communicates through:
//! - `ControllerMessage`: state changes and notices sent TO the UI surface
//! - `SurfaceEvent`: intents received FROM the UI surface
//!
//! Requests never block the owning task. Each one runs on a spawned tokio
//! task and reports back over an internal channel; the owner applies the
//! results in arrival order with [`Controller::poll_completions`] (once per
//! frame) or [`Controller::settle`] (headless drivers and tests).
//!
//! Every message load and send carries a [`SelectionTicket`]. A result whose
//! ticket no longer matches the selection is dropped, so switching
//! conversations quickly never shows one conversation's messages under
//! another.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{ApiError, ChatApi, SendMessageResponse};
use crate::config::CanvasConfig;
use crate::events::SurfaceEvent;
use crate::messages::{ControllerMessage, ConversationId, NotifyLevel};
use crate::session::{derive_title, ChatMessage, Conversation, SelectionTicket, Session};

/// Result of a spawned request, tagged with the context it was issued under
enum Completion {
    HealthChecked(bool),
    ConversationsLoaded(Result<Vec<Conversation>, ApiError>),
    MessagesLoaded {
        ticket: SelectionTicket,
        result: Result<Vec<ChatMessage>, ApiError>,
    },
    ConversationCreated {
        /// Text to send once the conversation exists
        pending: Option<String>,
        result: Result<Conversation, ApiError>,
    },
    ConversationDeleted {
        conversation_id: ConversationId,
        result: Result<(), ApiError>,
    },
    MessageSent {
        ticket: SelectionTicket,
        content: String,
        /// Title to apply if this was the first exchange
        retitle: Option<String>,
        result: Result<SendMessageResponse, ApiError>,
    },
}

/// The Controller - headless session core
pub struct Controller<A: ChatApi> {
    /// Configuration
    config: CanvasConfig,
    /// Research backend
    api: Arc<A>,
    /// Synchronized session state
    session: Session,
    /// Channel to send messages to UI surface
    tx: mpsc::Sender<ControllerMessage>,
    /// Spawned requests report here
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    /// Requests spawned but not yet applied
    in_flight: usize,
    /// Set once Quit was sent; later results are ignored
    shutting_down: bool,
}

impl<A: ChatApi + 'static> Controller<A> {
    /// Create a new Controller with the given backend
    pub fn new(api: A, config: CanvasConfig, tx: mpsc::Sender<ControllerMessage>) -> Self {
        Self::with_shared_api(Arc::new(api), config, tx)
    }

    /// Create a Controller around a backend the caller keeps a handle to
    pub fn with_shared_api(
        api: Arc<A>,
        config: CanvasConfig,
        tx: mpsc::Sender<ControllerMessage>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            config,
            api,
            session: Session::new(),
            tx,
            completion_tx,
            completion_rx,
            in_flight: 0,
            shutting_down: false,
        }
    }

    /// Get the session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get the configuration
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Whether a send is in flight
    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    /// Number of requests whose results have not been applied yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Whether shutdown was requested
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Start the Controller: probe the backend and load the conversation list
    pub async fn start(&mut self) -> anyhow::Result<()> {
        tracing::info!(
            backend = self.api.name(),
            carry_pending_text = self.config.carry_pending_text,
            "Starting controller"
        );

        let api = Arc::clone(&self.api);
        self.spawn(async move { Completion::HealthChecked(api.health_check().await) });
        self.load_conversations();

        Ok(())
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        if self.shutting_down {
            tracing::debug!(event = event.kind(), "Ignoring event after shutdown");
            return Ok(());
        }
        tracing::debug!(event = event.kind(), "Handling surface event");

        match event {
            SurfaceEvent::RefreshConversations => self.load_conversations(),
            SurfaceEvent::SelectConversation { conversation_id } => {
                self.select_conversation(&conversation_id).await;
            }
            SurfaceEvent::NewConversation => self.create_conversation(None),
            SurfaceEvent::DeleteConversation { conversation_id } => {
                self.delete_conversation(conversation_id);
            }
            SurfaceEvent::SubmitMessage { content } => self.submit_message(content).await,
            SurfaceEvent::QuitRequested => self.shutdown().await?,
        }

        Ok(())
    }

    // ============================================
    // Operations
    // ============================================

    fn load_conversations(&mut self) {
        let api = Arc::clone(&self.api);
        self.spawn(async move { Completion::ConversationsLoaded(api.list_conversations().await) });
    }

    async fn select_conversation(&mut self, conversation_id: &ConversationId) {
        let Some(conversation) = self.session.find(conversation_id).cloned() else {
            tracing::warn!(conversation_id = %conversation_id, "Select for unknown conversation");
            self.notify(NotifyLevel::Warning, "Conversation not found").await;
            return;
        };

        let ticket = self.session.select(conversation.clone());
        self.send(ControllerMessage::SelectionChanged {
            conversation: Some(conversation),
        })
        .await;
        self.send(ControllerMessage::MessagesLoading {
            conversation_id: ticket.conversation_id.clone(),
        })
        .await;

        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.get_messages(&ticket.conversation_id).await;
            Completion::MessagesLoaded { ticket, result }
        });
    }

    fn create_conversation(&mut self, pending: Option<String>) {
        let api = Arc::clone(&self.api);
        let title = self.config.default_title.clone();
        self.spawn(async move {
            let result = api.create_conversation(&title).await;
            Completion::ConversationCreated { pending, result }
        });
    }

    fn delete_conversation(&mut self, conversation_id: ConversationId) {
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.delete_conversation(&conversation_id).await;
            Completion::ConversationDeleted {
                conversation_id,
                result,
            }
        });
    }

    async fn submit_message(&mut self, content: String) {
        if content.trim().is_empty() {
            tracing::debug!("Ignoring blank message");
            return;
        }

        if self.session.is_loading() {
            self.notify(NotifyLevel::Warning, "A message is already being sent")
                .await;
            return;
        }

        match self.session.ticket() {
            Some(ticket) => self.issue_send(ticket, content).await,
            None if self.config.carry_pending_text => {
                tracing::debug!("No conversation selected, creating one for pending text");
                self.set_loading(true).await;
                self.create_conversation(Some(content));
            }
            None => {
                tracing::debug!("No conversation selected, message dropped");
                self.create_conversation(None);
            }
        }
    }

    async fn issue_send(&mut self, ticket: SelectionTicket, content: String) {
        let retitle = self
            .session
            .awaiting_first_exchange()
            .then(|| derive_title(&content));

        self.set_loading(true).await;

        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.send_message(&ticket.conversation_id, &content).await;
            Completion::MessageSent {
                ticket,
                content,
                retitle,
                result,
            }
        });
    }

    /// Shut down the Controller
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        if self.shutting_down {
            return Ok(());
        }
        self.shutting_down = true;
        tracing::info!(in_flight = self.in_flight, "Controller shutting down");
        self.send(ControllerMessage::Quit).await;
        Ok(())
    }

    // ============================================
    // Completions
    // ============================================

    /// Apply every completion that has already arrived
    ///
    /// Never waits. Call this regularly (once per frame).
    /// Returns true if there was activity.
    pub async fn poll_completions(&mut self) -> bool {
        let mut activity = false;
        while self.poll_completion().await {
            activity = true;
        }
        activity
    }

    /// Apply one completion if one has arrived
    ///
    /// Surfaces that share a task with the Controller drain their channel
    /// between calls, so a burst of completions never fills it.
    pub async fn poll_completion(&mut self) -> bool {
        match self.completion_rx.try_recv() {
            Ok(completion) => {
                self.apply(completion).await;
                true
            }
            Err(_) => false,
        }
    }

    /// Wait for the next completion and apply it
    ///
    /// Returns false immediately when nothing is in flight.
    pub async fn wait_for_completion(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completion_rx.recv().await {
            Some(completion) => {
                self.apply(completion).await;
                true
            }
            None => false,
        }
    }

    /// Apply completions until no request is in flight
    pub async fn settle(&mut self) {
        while self.wait_for_completion().await {}
    }

    async fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.shutting_down {
            tracing::debug!("Discarding completion after shutdown");
            return;
        }

        match completion {
            Completion::HealthChecked(reachable) => {
                tracing::info!(reachable, "Backend health checked");
                self.send(ControllerMessage::BackendStatus { reachable }).await;
                if !reachable {
                    self.notify(NotifyLevel::Warning, "Backend not reachable").await;
                }
            }

            Completion::ConversationsLoaded(Ok(conversations)) => {
                tracing::debug!(count = conversations.len(), "Conversations loaded");
                self.session.replace_conversations(conversations.clone());
                self.send(ControllerMessage::ConversationsReplaced { conversations })
                    .await;
            }
            Completion::ConversationsLoaded(Err(e)) => {
                tracing::warn!(error = %e, "Failed to load conversations");
                self.notify(NotifyLevel::Error, "Failed to load conversations")
                    .await;
            }

            Completion::MessagesLoaded { ticket, result } => {
                self.apply_messages_loaded(ticket, result).await;
            }

            Completion::ConversationCreated { pending, result } => {
                self.apply_conversation_created(pending, result).await;
            }

            Completion::ConversationDeleted {
                conversation_id,
                result,
            } => match result {
                Ok(()) => {
                    let (removed, was_current) = self.session.remove_conversation(&conversation_id);
                    tracing::debug!(
                        conversation_id = %conversation_id,
                        removed,
                        was_current,
                        "Conversation deleted"
                    );
                    self.send(ControllerMessage::ConversationRemoved { conversation_id })
                        .await;
                    if was_current {
                        self.send(ControllerMessage::SelectionChanged { conversation: None })
                            .await;
                    }
                    self.notify(NotifyLevel::Success, "Conversation deleted").await;
                }
                Err(e) => {
                    tracing::warn!(conversation_id = %conversation_id, error = %e, "Failed to delete conversation");
                    self.notify(NotifyLevel::Error, "Failed to delete conversation")
                        .await;
                }
            },

            Completion::MessageSent {
                ticket,
                content,
                retitle,
                result,
            } => {
                self.apply_message_sent(ticket, content, retitle, result)
                    .await;
            }
        }
    }

    async fn apply_messages_loaded(
        &mut self,
        ticket: SelectionTicket,
        result: Result<Vec<ChatMessage>, ApiError>,
    ) {
        if !self.session.is_current(&ticket) {
            tracing::debug!(
                conversation_id = %ticket.conversation_id,
                generation = ticket.generation,
                "Dropping stale message load"
            );
            return;
        }

        match result {
            Ok(messages) => {
                tracing::debug!(
                    conversation_id = %ticket.conversation_id,
                    count = messages.len(),
                    "Messages loaded"
                );
                self.session.replace_messages(&ticket, messages.clone());
                self.send(ControllerMessage::MessagesReplaced {
                    conversation_id: ticket.conversation_id,
                    messages,
                })
                .await;
            }
            Err(e) => {
                tracing::warn!(conversation_id = %ticket.conversation_id, error = %e, "Failed to load messages");
                self.notify(NotifyLevel::Error, "Failed to load messages").await;
            }
        }
    }

    async fn apply_conversation_created(
        &mut self,
        pending: Option<String>,
        result: Result<Conversation, ApiError>,
    ) {
        match result {
            Ok(conversation) => {
                tracing::debug!(conversation_id = %conversation.id, "Conversation created");
                let ticket = self.session.add_created(conversation.clone());
                self.send(ControllerMessage::ConversationAdded {
                    conversation: conversation.clone(),
                })
                .await;
                self.send(ControllerMessage::SelectionChanged {
                    conversation: Some(conversation),
                })
                .await;
                self.notify(NotifyLevel::Success, "New conversation started")
                    .await;

                if let Some(content) = pending {
                    self.issue_send(ticket, content).await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create conversation");
                if let Some(content) = pending {
                    self.set_loading(false).await;
                    self.send(ControllerMessage::SendFailed { content }).await;
                }
                self.notify(NotifyLevel::Error, "Failed to create conversation")
                    .await;
            }
        }
    }

    async fn apply_message_sent(
        &mut self,
        ticket: SelectionTicket,
        content: String,
        retitle: Option<String>,
        result: Result<SendMessageResponse, ApiError>,
    ) {
        self.set_loading(false).await;

        match result {
            Ok(SendMessageResponse {
                user_message,
                ai_message,
            }) => {
                if self
                    .session
                    .append_exchange(&ticket, user_message.clone(), ai_message.clone())
                {
                    self.send(ControllerMessage::MessagesAppended {
                        conversation_id: ticket.conversation_id.clone(),
                        messages: vec![user_message, ai_message],
                    })
                    .await;
                } else {
                    tracing::debug!(
                        conversation_id = %ticket.conversation_id,
                        "Send finished after selection changed, not appending"
                    );
                }

                if let Some(title) = retitle {
                    if self.session.retitle(&ticket.conversation_id, &title) {
                        self.send(ControllerMessage::ConversationRetitled {
                            conversation_id: ticket.conversation_id,
                            title,
                        })
                        .await;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(conversation_id = %ticket.conversation_id, error = %e, "Failed to send message");
                self.send(ControllerMessage::SendFailed { content }).await;
                self.notify(NotifyLevel::Error, "Failed to send message").await;
            }
        }
    }

    // ============================================
    // Helpers
    // ============================================

    /// Run a request on the runtime; its completion is applied later
    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let completion = request.await;
            // Receiver lives as long as the Controller
            let _ = completion_tx.send(completion);
        });
    }

    /// Set the busy flag and tell the surface if it changed
    async fn set_loading(&mut self, loading: bool) {
        if self.session.is_loading() != loading {
            self.session.set_loading(loading);
            self.send(ControllerMessage::Busy { loading }).await;
        }
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ControllerMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: ControllerMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
