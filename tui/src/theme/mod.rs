//! Theme and Colors
//!
//! The research canvas palette: calm blues for structure, green for the
//! user's voice, amber for the agent.

use ratatui::style::{Color, Modifier, Style};

use canvas_core::{MessageRole, NotifyLevel};

// ============================================================================
// Structure
// ============================================================================

/// Focused pane border
pub const BORDER_FOCUSED: Color = Color::Rgb(120, 170, 255);

/// Unfocused pane border
pub const BORDER_IDLE: Color = Color::Rgb(70, 80, 100);

/// Selected conversation background
pub const SELECTION_BG: Color = Color::Rgb(40, 60, 95);

/// Secondary text (dates, hints, placeholders)
pub const DIM_GRAY: Color = Color::Rgb(110, 110, 120);

/// Headings in empty states and the canvas
pub const HEADING: Color = Color::Rgb(200, 210, 235);

// ============================================================================
// Voices
// ============================================================================

/// User messages
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// Research agent messages
pub const AGENT_AMBER: Color = Color::Rgb(240, 190, 90);

// ============================================================================
// Notices
// ============================================================================

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 90, 90);

/// Warning yellow
pub const WARNING_YELLOW: Color = Color::Rgb(240, 210, 80);

/// Success green
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

/// Info blue
pub const INFO_BLUE: Color = Color::Rgb(130, 180, 255);

/// Label style for a message role
pub fn role_style(role: MessageRole) -> Style {
    let color = match role {
        MessageRole::User => USER_GREEN,
        MessageRole::Assistant => AGENT_AMBER,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Status bar style for a notice level
pub fn notice_style(level: NotifyLevel) -> Style {
    let color = match level {
        NotifyLevel::Info => INFO_BLUE,
        NotifyLevel::Warning => WARNING_YELLOW,
        NotifyLevel::Error => ERROR_RED,
        NotifyLevel::Success => SUCCESS_GREEN,
    };
    Style::default().fg(color)
}

/// Border style for a pane
pub fn border_style(focused: bool) -> Style {
    Style::default().fg(if focused { BORDER_FOCUSED } else { BORDER_IDLE })
}
