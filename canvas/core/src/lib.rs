//! Canvas Core - Headless Conversation Sync for the Research Canvas
//!
//! This crate holds the client-side logic of the research chat client:
//! keeping a local copy of conversations and messages consistent with the
//! research backend across create, select, delete and send. It is completely
//! independent of any UI framework.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        UI Surfaces                           │
//! │  ┌─────────────────┐   ┌───────────────────────────────────┐ │
//! │  │   TUI (ratatui) │   │  Headless drivers / tests         │ │
//! │  └────────┬────────┘   └─────────────────┬─────────────────┘ │
//! │           └──────────────┬───────────────┘                   │
//! │                  SurfaceEvent (up)                           │
//! │               ControllerMessage (down)                       │
//! └──────────────────────────┼───────────────────────────────────┘
//!                            │
//! ┌──────────────────────────┼───────────────────────────────────┐
//! │                     CANVAS CORE                              │
//! │  ┌───────────────────────┴────────────────────────────────┐  │
//! │  │                     Controller                         │  │
//! │  │   ┌──────────┐   ┌──────────────┐   ┌──────────────┐   │  │
//! │  │   │ Session  │   │ Completions  │   │   ChatApi    │   │  │
//! │  │   │  State   │   │ (tagged)     │   │   (REST)     │   │  │
//! │  │   └──────────┘   └──────────────┘   └──────────────┘   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Controller`]: owns the session and applies intents and backend results
//! - [`ControllerMessage`]: messages sent from the Controller to UI surfaces
//! - [`SurfaceEvent`]: events sent from UI surfaces to the Controller
//! - [`Session`]: conversations, selection, messages and the busy flag
//! - [`ChatApi`]: the backend seam, implemented by [`HttpChatApi`]
//!
//! # Quick Start
//!
//! ```ignore
//! use canvas_core::{api::HttpChatApi, config::load_config, Controller, SurfaceEvent};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let api = HttpChatApi::from_config(&config)?;
//!     let (tx, mut rx) = mpsc::channel(config.channel_capacity);
//!     let mut controller = Controller::new(api, config, tx);
//!
//!     controller.start().await?;
//!     controller.handle_event(SurfaceEvent::NewConversation).await?;
//!     controller.settle().await;
//!
//!     while let Ok(msg) = rx.try_recv() {
//!         // Render message to UI
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`api`]: REST client trait and `reqwest` implementation
//! - [`config`]: layered TOML/env/CLI configuration
//! - [`controller`]: the Controller
//! - [`events`]: events from UI surfaces to the Controller
//! - [`messages`]: messages from the Controller to UI surfaces
//! - [`session`]: session state and the data model
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod controller;
pub mod events;
pub mod messages;
pub mod session;

// Re-exports for convenience
pub use api::{ApiError, ChatApi, HttpChatApi, SendMessageResponse};
pub use controller::Controller;
pub use events::SurfaceEvent;
pub use messages::{ControllerMessage, ConversationId, MessageId, MessageRole, NotifyLevel};
pub use session::{
    derive_title, ChatMessage, Conversation, SelectionTicket, Session, SessionSnapshot,
    TITLE_WORD_LIMIT,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env, CanvasConfig,
    CanvasToml, ConfigError, ConfigOverrides, ConfigSource, DEFAULT_CONVERSATION_TITLE,
    MIN_CHANNEL_CAPACITY,
};
