//! Research Canvas TUI - Terminal interface for the research chat client
//!
//! A thin surface over `canvas-core`: it turns key presses into
//! [`canvas_core::SurfaceEvent`]s and mirrors [`canvas_core::ControllerMessage`]s
//! into a [`display::DisplayState`] that it renders.
//!
//! # Layout
//!
//! - **Sidebar**: conversations, newest first, with creation dates
//! - **Thread**: the selected conversation's messages
//! - **Input**: the research question being typed
//! - **Research canvas**: agent responses collected as numbered insights
//! - **Status bar**: notices and key hints

pub mod app;
pub mod controller_client;
pub mod display;
pub mod theme;
pub mod widgets;

pub use app::{App, Focus};
pub use controller_client::ControllerClient;
pub use display::DisplayState;
