//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - ControllerClient for synchronization with the backend
//! - DisplayState for rendering
//!
//! The App:
//! 1. Converts terminal events to SurfaceEvents
//! 2. Sends events to the embedded Controller via ControllerClient
//! 3. Receives ControllerMessages and updates DisplayState
//! 4. Renders sidebar, thread, input, research canvas and status bar

use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{Frame, Terminal};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use canvas_core::{ChatApi, ConversationId, HttpChatApi, MessageRole};

use crate::controller_client::ControllerClient;
use crate::display::DisplayState;
use crate::theme;
use crate::widgets::{Anchor, StyledLine, TextBlock, TextBlockState};

/// Input box height (rows, including borders)
const INPUT_HEIGHT: u16 = 5;

/// Sidebar width (columns, including borders)
const SIDEBAR_WIDTH: u16 = 30;

/// Rows per sidebar entry: title, date, spacer
const SIDEBAR_ROWS_PER_ENTRY: usize = 3;

const INPUT_PLACEHOLDER: &str = "Ask your research question...";
const BUSY_TEXT: &str = "Researching...";

/// Which pane receives keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    /// Conversation list
    Sidebar,
    /// Message input
    Input,
}

/// Main application state
pub struct App<A: ChatApi + 'static = HttpChatApi> {
    // === Core State ===
    /// Is the app still running?
    running: bool,

    // === Controller Integration ===
    /// Client for communicating with the embedded Controller
    client: ControllerClient<A>,
    /// Display state derived from ControllerMessages
    display: DisplayState,

    // === Input State ===
    /// Pane receiving keys
    focus: Focus,
    /// User input buffer
    input_buffer: String,
    /// Highlighted sidebar row
    sidebar_cursor: usize,

    // === Scroll State ===
    thread_scroll: TextBlockState,
    canvas_scroll: TextBlockState,
    /// Display revision the scroll positions were last reset for
    seen_revision: u64,

    // === Misc State ===
    /// Last frame time (for notice expiry)
    last_frame: Instant,
}

impl<A: ChatApi + 'static> App<A> {
    /// Create a new App around a controller client
    pub fn new(client: ControllerClient<A>) -> Self {
        let display = DisplayState::with_notice_duration(client.config().notice_duration);
        Self {
            running: true,
            client,
            display,
            focus: Focus::Input,
            input_buffer: String::new(),
            sidebar_cursor: 0,
            thread_scroll: TextBlockState::new(Anchor::Bottom),
            canvas_scroll: TextBlockState::new(Anchor::Top),
            seen_revision: 0,
            last_frame: Instant::now(),
        }
    }

    /// Main event loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        // Target ~10 FPS, plenty for a chat surface
        let frame_duration = Duration::from_millis(100);

        // Create async event stream for non-blocking terminal events
        let mut event_stream = EventStream::new();

        self.client.start().await?;

        // Render initial frame immediately so user sees UI
        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Check for terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        // Only handle Press events (not Release or Repeat)
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                        None => self.running = false,
                    }
                }

                // Frame tick
                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            self.tick().await;

            terminal.draw(|frame| self.draw(frame))?;

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Apply finished requests, pending messages and timers
    pub async fn tick(&mut self) {
        self.client.poll_completions().await;
        self.process_controller_messages();

        let now = Instant::now();
        self.display.update(now - self.last_frame);
        self.last_frame = now;
    }

    /// Process all pending messages from the Controller
    pub fn process_controller_messages(&mut self) {
        let messages = self.client.recv_all();
        if messages.is_empty() {
            return;
        }

        let previous = self.display.current_id().cloned();
        for msg in messages {
            self.display.apply_message(msg);
        }

        if self.display.quit_requested {
            self.running = false;
        }

        if self.input_buffer.is_empty() {
            if let Some(text) = self.display.take_returned_input() {
                self.input_buffer = text;
            }
        } else {
            self.display.take_returned_input();
        }

        if self.display.current_id() != previous.as_ref() {
            if let Some(index) = self.display.current_id().and_then(|id| self.index_of(id)) {
                self.sidebar_cursor = index;
            }
        }
        self.sidebar_cursor = self
            .sidebar_cursor
            .min(self.display.conversations.len().saturating_sub(1));

        if self.display.revision() != self.seen_revision {
            self.seen_revision = self.display.revision();
            self.thread_scroll.jump_to_newest();
            self.canvas_scroll.jump_to_newest();
        }
    }

    // ============================================
    // Accessors
    // ============================================

    /// Is the app still running?
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// The embedded controller client
    pub fn client(&self) -> &ControllerClient<A> {
        &self.client
    }

    /// Mutable access to the controller client
    pub fn client_mut(&mut self) -> &mut ControllerClient<A> {
        &mut self.client
    }

    /// Current input text
    pub fn input(&self) -> &str {
        &self.input_buffer
    }

    /// Pane receiving keys
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Highlighted sidebar row
    pub fn sidebar_cursor(&self) -> usize {
        self.sidebar_cursor
    }

    // ============================================
    // Input Handling
    // ============================================

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            // Quit
            KeyCode::Esc => self.quit().await,
            KeyCode::Char('c') if ctrl => self.quit().await,

            // Global actions
            KeyCode::Char('n') if ctrl => {
                let result = self.client.new_conversation().await;
                log_failure(result, "new conversation");
            }
            KeyCode::Char('r') if ctrl => {
                let result = self.client.refresh().await;
                log_failure(result, "refresh");
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Sidebar => Focus::Input,
                    Focus::Input => Focus::Sidebar,
                };
            }

            // Scrolling
            KeyCode::PageUp if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.canvas_scroll.scroll(-self.page_size());
            }
            KeyCode::PageDown if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.canvas_scroll.scroll(self.page_size());
            }
            KeyCode::PageUp => self.thread_scroll.scroll(-self.page_size()),
            KeyCode::PageDown => self.thread_scroll.scroll(self.page_size()),

            _ => match self.focus {
                Focus::Sidebar => self.handle_sidebar_key(key).await,
                Focus::Input => self.handle_input_key(key).await,
            },
        }

        // Intents answer synchronously (selection, busy flag)
        self.process_controller_messages();
    }

    async fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => {
                self.sidebar_cursor = self.sidebar_cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                let last = self.display.conversations.len().saturating_sub(1);
                self.sidebar_cursor = (self.sidebar_cursor + 1).min(last);
            }
            KeyCode::Enter => {
                if let Some(id) = self.cursor_id() {
                    let result = self.client.select(id).await;
                    log_failure(result, "select conversation");
                    self.focus = Focus::Input;
                }
            }
            KeyCode::Delete => {
                if let Some(id) = self.cursor_id() {
                    let result = self.client.delete(id).await;
                    log_failure(result, "delete conversation");
                }
            }
            _ => {}
        }
    }

    async fn handle_input_key(&mut self, key: KeyEvent) {
        if self.display.busy {
            return;
        }

        match key.code {
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                self.input_buffer.push('\n');
            }
            KeyCode::Enter => {
                if self.input_buffer.trim().is_empty() {
                    return;
                }
                let content = std::mem::take(&mut self.input_buffer);
                let result = self.client.send_message(content).await;
                log_failure(result, "send message");
            }
            // Unbound Ctrl chords must not type their letter
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input_buffer.push(c);
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            _ => {}
        }
    }

    async fn quit(&mut self) {
        let result = self.client.request_quit().await;
        log_failure(result, "quit");
        self.running = false;
    }

    fn cursor_id(&self) -> Option<ConversationId> {
        self.display
            .conversations
            .get(self.sidebar_cursor)
            .map(|c| c.id.clone())
    }

    fn index_of(&self, id: &ConversationId) -> Option<usize> {
        self.display.conversations.iter().position(|c| &c.id == id)
    }

    fn page_size(&self) -> i32 {
        let rows = self.thread_scroll.viewport.max(2) / 2;
        i32::try_from(rows).unwrap_or(i32::MAX)
    }

    // ============================================
    // Rendering
    // ============================================

    /// Render the whole UI into a frame
    pub fn draw(&mut self, frame: &mut Frame) {
        let [body, status] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());
        let [sidebar, center, canvas] = Layout::horizontal([
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Min(20),
            Constraint::Percentage(30),
        ])
        .areas(body);
        let [thread, input] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(INPUT_HEIGHT)]).areas(center);

        self.render_sidebar(frame, sidebar);
        self.render_thread(frame, thread);
        self.render_input(frame, input);
        self.render_canvas(frame, canvas);
        self.render_status(frame, status);
    }

    /// Render conversation list
    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title(" Conversations ")
            .border_style(theme::border_style(self.focus == Focus::Sidebar));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.display.conversations.is_empty() {
            let lines = vec![
                Line::from(""),
                Line::styled("No conversations yet", Style::default().fg(theme::HEADING)),
                Line::styled("Ctrl+N to start one", Style::default().fg(theme::DIM_GRAY)),
            ];
            frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
            return;
        }

        let width = inner.width as usize;
        let visible = (inner.height as usize / SIDEBAR_ROWS_PER_ENTRY).max(1);
        let first = self.sidebar_cursor.saturating_sub(visible - 1);
        let current = self.display.current_id();

        let mut lines = Vec::new();
        for (index, conversation) in self
            .display
            .conversations
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
        {
            let marker = if index == self.sidebar_cursor && self.focus == Focus::Sidebar {
                "> "
            } else {
                "  "
            };
            let mut title_style = Style::default();
            if current == Some(&conversation.id) {
                title_style = title_style
                    .bg(theme::SELECTION_BG)
                    .add_modifier(Modifier::BOLD);
            }
            let title = truncate(&conversation.title, width.saturating_sub(marker.len()));
            let date = conversation
                .created_at
                .with_timezone(&Local)
                .format("%b %-d, %Y")
                .to_string();

            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(title, title_style),
            ]));
            lines.push(Line::styled(
                format!("  {date}"),
                Style::default().fg(theme::DIM_GRAY),
            ));
            lines.push(Line::from(""));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    /// Render message thread
    fn render_thread(&mut self, frame: &mut Frame, area: Rect) {
        let title = self
            .display
            .current
            .as_ref()
            .map_or_else(|| " Research Thread ".to_string(), |c| format!(" {} ", c.title));
        let block = Block::bordered()
            .title(title)
            .border_style(theme::border_style(false));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.display.messages.is_empty() && !self.display.busy {
            let lines = if self.display.loading_messages {
                vec![
                    Line::from(""),
                    Line::styled("Loading messages...", Style::default().fg(theme::DIM_GRAY)),
                ]
            } else {
                vec![
                    Line::from(""),
                    Line::styled(
                        "Start Your Research",
                        Style::default()
                            .fg(theme::HEADING)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Line::styled(
                        "Ask a question and the research agent will dig in.",
                        Style::default().fg(theme::DIM_GRAY),
                    ),
                ]
            };
            frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
            return;
        }

        let mut lines = Vec::new();
        for message in &self.display.messages {
            lines.push(StyledLine::new(message.label(), theme::role_style(message.role)));
            for text in message.content.lines() {
                lines.push(StyledLine::new(text, Style::default()));
            }
            lines.push(StyledLine::blank());
        }
        if self.display.busy {
            lines.push(StyledLine::new(
                MessageRole::Assistant.label(),
                theme::role_style(MessageRole::Assistant),
            ));
            lines.push(StyledLine::new(
                BUSY_TEXT,
                Style::default()
                    .fg(theme::DIM_GRAY)
                    .add_modifier(Modifier::ITALIC),
            ));
        }

        frame.render_stateful_widget(TextBlock::new(&lines), inner, &mut self.thread_scroll);
    }

    /// Render input box
    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title(" Ask ")
            .border_style(theme::border_style(self.focus == Focus::Input));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<StyledLine> = if self.display.busy {
            vec![StyledLine::new(
                BUSY_TEXT,
                Style::default().fg(theme::DIM_GRAY),
            )]
        } else if self.input_buffer.is_empty() {
            vec![StyledLine::new(
                INPUT_PLACEHOLDER,
                Style::default().fg(theme::DIM_GRAY),
            )]
        } else {
            let cursor = if self.focus == Focus::Input { "_" } else { "" };
            format!("{}{cursor}", self.input_buffer)
                .split('\n')
                .map(|line| StyledLine::new(line, Style::default().fg(theme::USER_GREEN)))
                .collect()
        };

        // Always show the last rows being typed
        let mut state = TextBlockState::new(Anchor::Bottom);
        frame.render_stateful_widget(TextBlock::new(&lines), inner, &mut state);
    }

    /// Render research canvas
    fn render_canvas(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title(" Research Insights ")
            .border_style(theme::border_style(false));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let insights = self.display.insights();
        if insights.is_empty() {
            let lines = vec![
                Line::from(""),
                Line::styled(
                    "The Research Canvas",
                    Style::default()
                        .fg(theme::HEADING)
                        .add_modifier(Modifier::BOLD),
                ),
                Line::styled(
                    "Responses from the research agent are collected here.",
                    Style::default().fg(theme::DIM_GRAY),
                ),
            ];
            frame.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(ratatui::widgets::Wrap { trim: true }),
                inner,
            );
            return;
        }

        let mut lines = vec![
            StyledLine::new(
                self.display.insight_summary(),
                Style::default().fg(theme::DIM_GRAY),
            ),
            StyledLine::blank(),
        ];
        for insight in &insights {
            lines.push(StyledLine::new(
                insight.title(),
                Style::default()
                    .fg(theme::AGENT_AMBER)
                    .add_modifier(Modifier::BOLD),
            ));
            lines.push(StyledLine::new(
                insight
                    .timestamp
                    .with_timezone(&Local)
                    .format("%b %-d, %Y %H:%M")
                    .to_string(),
                Style::default().fg(theme::DIM_GRAY),
            ));
            for text in insight.content.lines() {
                lines.push(StyledLine::new(text, Style::default()));
            }
            lines.push(StyledLine::blank());
        }

        frame.render_stateful_widget(TextBlock::new(&lines), inner, &mut self.canvas_scroll);
    }

    /// Render status bar
    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let line = if let Some(notice) = &self.display.notification {
            Line::styled(format!(" {}", notice.message), theme::notice_style(notice.level))
        } else {
            let backend = match self.display.backend_reachable {
                Some(false) => "backend offline | ",
                _ => "",
            };
            let scrolled = if self.thread_scroll.is_scrolled() {
                " | PgDn for latest"
            } else {
                ""
            };
            Line::styled(
                format!(
                    " {backend}Tab focus | Ctrl+N new | Ctrl+R refresh | Del delete | Esc quit{scrolled}"
                ),
                Style::default().fg(theme::DIM_GRAY),
            )
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn log_failure(result: anyhow::Result<()>, action: &str) {
    if let Err(e) = result {
        tracing::warn!(action, error = %e, "Surface action failed");
    }
}

/// Cut `text` to `width` columns, marking the cut with an ellipsis
fn truncate(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
