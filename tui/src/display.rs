//! Display State Types
//!
//! Types that represent the current display state for the TUI.
//! These are derived from ControllerMessages and used for rendering.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - it just renders what the Controller tells it.
//! Display state is the bridge between ControllerMessages and rendering.
//!
//! - DisplayMessage: A rendered thread message
//! - Insight: An assistant response mirrored into the research canvas
//! - DisplayNotification: The latest notice, with an expiry

use std::time::Duration;

use chrono::{DateTime, Utc};

use canvas_core::{
    ChatMessage, ControllerMessage, Conversation, ConversationId, MessageId, MessageRole,
    NotifyLevel,
};

/// A rendered thread message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayMessage {
    /// Backend message ID
    pub id: MessageId,
    /// Who wrote this message
    pub role: MessageRole,
    /// The message content
    pub content: String,
    /// When the backend recorded the message
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for DisplayMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content,
            timestamp: message.timestamp,
        }
    }
}

impl DisplayMessage {
    /// Label shown above the message
    pub fn label(&self) -> &'static str {
        self.role.label()
    }
}

/// An assistant response as shown in the research canvas
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Insight<'a> {
    /// 1-based position counted from the newest response
    pub number: usize,
    /// Response text
    pub content: &'a str,
    /// When the response was recorded
    pub timestamp: DateTime<Utc>,
}

impl Insight<'_> {
    /// Entry heading
    pub fn title(&self) -> String {
        format!("Insight #{}", self.number)
    }
}

/// A notification to display
#[derive(Clone, Debug)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NotifyLevel,
    /// Message content
    pub message: String,
    /// Time left before it disappears
    pub remaining: Duration,
}

/// The full display state for the TUI
#[derive(Debug)]
pub struct DisplayState {
    /// Conversation list, in display order
    pub conversations: Vec<Conversation>,
    /// Selected conversation
    pub current: Option<Conversation>,
    /// Thread of the selected conversation
    pub messages: Vec<DisplayMessage>,
    /// A send is in flight
    pub busy: bool,
    /// The selected conversation's history is being fetched
    pub loading_messages: bool,
    /// Result of the startup health check
    pub backend_reachable: Option<bool>,
    /// Latest notice (if any)
    pub notification: Option<DisplayNotification>,
    /// Text of a failed send, for the input box to take back
    pub returned_input: Option<String>,
    /// Controller asked the surface to quit
    pub quit_requested: bool,
    /// Bumped whenever the thread or busy flag changes
    revision: u64,
    /// How long notices stay visible
    notice_duration: Duration,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::with_notice_duration(Duration::from_secs(4))
    }
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a display state whose notices last `notice_duration`
    pub fn with_notice_duration(notice_duration: Duration) -> Self {
        Self {
            conversations: Vec::new(),
            current: None,
            messages: Vec::new(),
            busy: false,
            loading_messages: false,
            backend_reachable: None,
            notification: None,
            returned_input: None,
            quit_requested: false,
            revision: 0,
            notice_duration,
        }
    }

    /// Apply a ControllerMessage to update display state
    pub fn apply_message(&mut self, msg: ControllerMessage) {
        match msg {
            // Conversation list
            ControllerMessage::ConversationsReplaced { conversations } => {
                self.conversations = conversations;
            }
            ControllerMessage::ConversationAdded { conversation } => {
                self.conversations.insert(0, conversation);
            }
            ControllerMessage::ConversationRemoved { conversation_id } => {
                self.conversations.retain(|c| c.id != conversation_id);
            }
            ControllerMessage::ConversationRetitled {
                conversation_id,
                title,
            } => {
                if let Some(entry) = self
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == conversation_id)
                {
                    entry.title = title.clone();
                }
                if let Some(current) = self.current.as_mut().filter(|c| c.id == conversation_id) {
                    current.title = title;
                }
            }

            // Selection and thread
            ControllerMessage::SelectionChanged { conversation } => {
                let same = match (&self.current, &conversation) {
                    (Some(old), Some(new)) => old.id == new.id,
                    _ => false,
                };
                if !same {
                    self.set_messages(Vec::new());
                    self.loading_messages = false;
                }
                self.current = conversation;
            }
            ControllerMessage::MessagesLoading { conversation_id } => {
                if self.is_current(&conversation_id) {
                    self.set_messages(Vec::new());
                    self.loading_messages = true;
                }
            }
            ControllerMessage::MessagesReplaced {
                conversation_id,
                messages,
            } => {
                if self.is_current(&conversation_id) {
                    self.set_messages(messages.into_iter().map(DisplayMessage::from).collect());
                    self.loading_messages = false;
                }
            }
            ControllerMessage::MessagesAppended {
                conversation_id,
                messages,
            } => {
                if self.is_current(&conversation_id) {
                    self.messages
                        .extend(messages.into_iter().map(DisplayMessage::from));
                    self.revision += 1;
                }
            }
            ControllerMessage::Busy { loading } => {
                if self.busy != loading {
                    self.busy = loading;
                    self.revision += 1;
                }
            }
            ControllerMessage::SendFailed { content } => {
                self.returned_input = Some(content);
            }

            // System messages
            ControllerMessage::Notify { level, message } => {
                self.notification = Some(DisplayNotification {
                    level,
                    message,
                    remaining: self.notice_duration,
                });
            }
            ControllerMessage::BackendStatus { reachable } => {
                self.backend_reachable = Some(reachable);
            }
            ControllerMessage::Quit => {
                self.quit_requested = true;
            }
        }
    }

    /// Update timers
    pub fn update(&mut self, delta: Duration) {
        if let Some(notification) = self.notification.as_mut() {
            notification.remaining = notification.remaining.saturating_sub(delta);
            if notification.remaining.is_zero() {
                self.notification = None;
            }
        }
    }

    /// Changes whenever the thread content or busy flag changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Id of the selected conversation
    pub fn current_id(&self) -> Option<&ConversationId> {
        self.current.as_ref().map(|c| &c.id)
    }

    /// Assistant responses, newest first; the newest is Insight #1
    pub fn insights(&self) -> Vec<Insight<'_>> {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .rev()
            .enumerate()
            .map(|(index, m)| Insight {
                number: index + 1,
                content: &m.content,
                timestamp: m.timestamp,
            })
            .collect()
    }

    /// Canvas header summary, e.g. "3 responses collected"
    pub fn insight_summary(&self) -> String {
        let count = self
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .count();
        if count == 1 {
            "1 response collected".to_string()
        } else {
            format!("{count} responses collected")
        }
    }

    /// Take back the text of a failed send
    pub fn take_returned_input(&mut self) -> Option<String> {
        self.returned_input.take()
    }

    /// Clear the notification
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }

    fn is_current(&self, conversation_id: &ConversationId) -> bool {
        self.current_id() == Some(conversation_id)
    }

    fn set_messages(&mut self, messages: Vec<DisplayMessage>) {
        self.messages = messages;
        self.revision += 1;
    }
}
