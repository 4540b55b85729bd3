//! Chat Backend Integration
//!
//! Typed access to the research backend's REST API behind the [`ChatApi`]
//! trait. The Controller only ever sees the trait; [`HttpChatApi`] is the
//! `reqwest` implementation used by real surfaces.
//!
//! # Usage
//!
//! ```ignore
//! use canvas_core::api::{ChatApi, HttpChatApi};
//!
//! let api = HttpChatApi::new("http://localhost:8000", Duration::from_secs(30))?;
//! let conversations = api.list_conversations().await?;
//! ```

mod error;
mod http;
mod traits;

pub use error::ApiError;
pub use http::HttpChatApi;
pub use traits::{
    Acknowledgement, ChatApi, CreateConversationRequest, SendMessageRequest, SendMessageResponse,
};
