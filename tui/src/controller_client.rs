//! Controller Client
//!
//! Thin wrapper around the Controller for TUI integration.
//! This client embeds the Controller directly and provides a convenient
//! interface for sending events and receiving messages.
//!
//! # Architecture
//!
//! The TUI is a "thin client" - it doesn't contain any business logic.
//! All synchronization happens in the Controller. The TUI's job is:
//! 1. Convert terminal events to SurfaceEvents
//! 2. Send SurfaceEvents to the Controller
//! 3. Receive ControllerMessages
//! 4. Render display state based on messages

use tokio::sync::mpsc;

use canvas_core::{
    CanvasConfig, ChatApi, Controller, ControllerMessage, ConversationId, HttpChatApi, Session,
    SurfaceEvent,
};

/// Client for communicating with the embedded Controller
pub struct ControllerClient<A: ChatApi + 'static = HttpChatApi> {
    /// The embedded Controller instance
    controller: Controller<A>,
    /// Receiver for messages from the Controller
    rx: mpsc::Receiver<ControllerMessage>,
    /// Messages drained between completions, not yet handed out
    pending: Vec<ControllerMessage>,
}

impl ControllerClient<HttpChatApi> {
    /// Create a client talking HTTP to the configured backend
    pub fn from_config(config: CanvasConfig) -> anyhow::Result<Self> {
        let api = HttpChatApi::from_config(&config)?;
        Ok(Self::new(api, config))
    }
}

impl<A: ChatApi + 'static> ControllerClient<A> {
    /// Create a new ControllerClient around any backend
    pub fn new(api: A, config: CanvasConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_capacity);
        let controller = Controller::new(api, config, tx);
        Self {
            controller,
            rx,
            pending: Vec::new(),
        }
    }

    /// Start the Controller (health check and first list load)
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.controller.start().await
    }

    /// Re-fetch the conversation list
    pub async fn refresh(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::RefreshConversations).await
    }

    /// Select a conversation
    pub async fn select(&mut self, conversation_id: ConversationId) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::SelectConversation { conversation_id })
            .await
    }

    /// Start a new conversation
    pub async fn new_conversation(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::NewConversation).await
    }

    /// Delete a conversation
    pub async fn delete(&mut self, conversation_id: ConversationId) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::DeleteConversation { conversation_id })
            .await
    }

    /// Send a user message
    pub async fn send_message(&mut self, content: String) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::SubmitMessage { content }).await
    }

    /// Notify the Controller that the user wants to quit
    pub async fn request_quit(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::QuitRequested).await
    }

    /// Apply finished requests (must be called regularly)
    ///
    /// The channel is drained after every completion: the Controller runs on
    /// this task, so a full channel would otherwise never empty.
    pub async fn poll_completions(&mut self) -> bool {
        let mut activity = false;
        while self.controller.poll_completion().await {
            self.drain_channel();
            activity = true;
        }
        activity
    }

    /// Wait until no request is in flight
    pub async fn settle(&mut self) {
        while self.controller.wait_for_completion().await {
            self.drain_channel();
        }
    }

    /// Receive all pending messages from the Controller (non-blocking)
    pub fn recv_all(&mut self) -> Vec<ControllerMessage> {
        self.drain_channel();
        std::mem::take(&mut self.pending)
    }

    fn drain_channel(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.pending.push(msg);
        }
    }

    /// The Controller's session state
    pub fn session(&self) -> &Session {
        self.controller.session()
    }

    /// The Controller's configuration
    pub fn config(&self) -> &CanvasConfig {
        self.controller.config()
    }

    /// Send raw surface event to the Controller
    pub async fn send_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        self.controller.handle_event(event).await
    }
}
