//! TextBlock Widget
//!
//! A borderless, scrollable region of wrapped, styled lines. The block is
//! anchored at its newest content: the thread grows at the bottom, the
//! research canvas lists newest entries at the top.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::StatefulWidget;
use textwrap::wrap;

/// Which edge holds the newest content
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Anchor {
    /// Newest content at the top
    Top,
    /// Newest content at the bottom
    #[default]
    Bottom,
}

/// One logical line before wrapping
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledLine {
    /// Text, without newlines
    pub text: String,
    /// Style for every wrapped row of this line
    pub style: Style,
}

impl StyledLine {
    /// A styled line
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// An empty spacer line
    pub fn blank() -> Self {
        Self::new(String::new(), Style::default())
    }
}

/// State for a scrollable text block
#[derive(Clone, Debug, Default)]
pub struct TextBlockState {
    /// Rows scrolled away from the newest content
    pub offset: usize,
    /// Total wrapped rows at last render
    pub total_lines: usize,
    /// Visible rows at last render
    pub viewport: usize,
    /// Edge that holds the newest content
    pub anchor: Anchor,
}

impl TextBlockState {
    /// State for a block anchored at `anchor`
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            ..Self::default()
        }
    }

    /// Scroll by delta rows (positive = down)
    pub fn scroll(&mut self, delta: i32) {
        let toward_older = match self.anchor {
            Anchor::Bottom => -delta,
            Anchor::Top => delta,
        };
        let new_offset = self.offset as i64 + i64::from(toward_older);
        self.offset = (new_offset.max(0) as usize).min(self.max_offset());
    }

    /// Jump back to the newest content
    pub fn jump_to_newest(&mut self) {
        self.offset = 0;
    }

    /// Whether older content is scrolled into view
    pub fn is_scrolled(&self) -> bool {
        self.offset > 0
    }

    fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.viewport)
    }

    /// First wrapped row to draw
    fn first_row(&self) -> usize {
        match self.anchor {
            Anchor::Top => self.offset,
            Anchor::Bottom => self.max_offset() - self.offset,
        }
    }
}

/// A borderless, scrollable text block
pub struct TextBlock<'a> {
    lines: &'a [StyledLine],
}

impl<'a> TextBlock<'a> {
    /// Block over pre-built lines
    pub fn new(lines: &'a [StyledLine]) -> Self {
        Self { lines }
    }
}

/// Wrap logical lines to `width` columns
pub fn wrap_lines(lines: &[StyledLine], width: usize) -> Vec<(String, Style)> {
    let width = width.max(1);
    lines
        .iter()
        .flat_map(|line| {
            if line.text.is_empty() {
                vec![(String::new(), line.style)]
            } else {
                wrap(&line.text, width)
                    .into_iter()
                    .map(|cow| (cow.into_owned(), line.style))
                    .collect()
            }
        })
        .collect()
}

impl StatefulWidget for TextBlock<'_> {
    type State = TextBlockState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let wrapped = wrap_lines(self.lines, area.width as usize);

        state.total_lines = wrapped.len();
        state.viewport = area.height as usize;
        state.offset = state.offset.min(state.max_offset());

        for (i, (line, style)) in wrapped
            .iter()
            .skip(state.first_row())
            .take(area.height as usize)
            .enumerate()
        {
            let y = area.y + i as u16;
            buf.set_stringn(area.x, y, line, area.width as usize, *style);
        }
    }
}
