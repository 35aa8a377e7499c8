//! LogView Widget
//!
//! A borderless, scrollable view of the work log. Each entry is drawn as up
//! to four lines (timestamp, `[NAME]`, message, tags) followed by a spacer;
//! long lines wrap to the area width.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::StatefulWidget;
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

use monitor_core::EntryNode;

use crate::theme;

/// Trailing cursor glyph
const CURSOR: &str = "_";

/// Scroll state for a [`LogView`]
#[derive(Debug, Default)]
pub struct LogViewState {
    /// Scroll offset (lines from top; 0 shows the newest entry)
    pub scroll_offset: usize,
    /// Total wrapped lines at the last render
    pub total_lines: usize,
    /// Visible height at the last render
    pub viewport: usize,
}

impl LogViewState {
    /// Scroll by `delta` lines (positive = toward older entries)
    pub fn scroll(&mut self, delta: isize) {
        self.scroll_offset = self.scroll_offset.saturating_add_signed(delta);
        self.clamp();
    }

    /// Scroll one page toward older entries
    pub fn page_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(self.page());
        self.clamp();
    }

    /// Scroll one page toward newer entries
    pub fn page_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(self.page());
    }

    /// Jump to the newest entry
    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    fn page(&self) -> usize {
        self.viewport.saturating_sub(1).max(1)
    }

    fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.viewport)
    }

    fn clamp(&mut self) {
        if self.total_lines > 0 {
            self.scroll_offset = self.scroll_offset.min(self.max_scroll());
        }
    }
}

/// The scrollable work log
pub struct LogView<'a> {
    entries: &'a [EntryNode],
    empty_text: &'a str,
}

impl<'a> LogView<'a> {
    /// View over `entries`, top-to-bottom as stored
    #[must_use]
    pub fn new(entries: &'a [EntryNode]) -> Self {
        Self {
            entries,
            empty_text: "Awaiting log entries...",
        }
    }

    /// Text shown while the log is empty
    #[must_use]
    pub fn empty_text(mut self, text: &'a str) -> Self {
        self.empty_text = text;
        self
    }

    /// Styled, unwrapped lines for every entry
    fn lines(&self) -> Vec<(String, Style)> {
        let mut lines = Vec::with_capacity(self.entries.len() * 4);
        for node in self.entries {
            lines.push((node.timestamp.text(), theme::timestamp_style()));
            if let Some(slot) = &node.username {
                lines.push((slot.text(), theme::username_style()));
            }

            let mut message = node.message.text();
            if node.cursor.is_visible() {
                message.push_str(CURSOR);
            }
            lines.push((message, theme::message_style()));

            if let Some(slot) = &node.tags {
                let tags = slot.text();
                if !tags.is_empty() {
                    lines.push((tags, theme::tags_style()));
                }
            }
            lines.push((String::new(), Style::default()));
        }
        lines
    }
}

impl StatefulWidget for LogView<'_> {
    type State = LogViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let width = area.width as usize;
        let height = area.height as usize;
        state.viewport = height;
        if width == 0 || height == 0 {
            return;
        }

        if self.entries.is_empty() {
            state.total_lines = 0;
            state.scroll_offset = 0;
            buf.set_string(area.x, area.y, self.empty_text, theme::status_style());
            return;
        }

        // Wrap to width
        let wrapped: Vec<(String, Style)> = self
            .lines()
            .into_iter()
            .flat_map(|(line, style)| {
                if line.width() <= width {
                    vec![(line, style)]
                } else {
                    wrap(&line, width)
                        .into_iter()
                        .map(|cow| (cow.into_owned(), style))
                        .collect()
                }
            })
            .collect();

        state.total_lines = wrapped.len();
        state.clamp();

        for (i, (line, style)) in wrapped
            .iter()
            .skip(state.scroll_offset)
            .take(height)
            .enumerate()
        {
            let y = area.y + u16::try_from(i).unwrap_or(u16::MAX);
            buf.set_stringn(area.x, y, line, width, *style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::{EntryNode, LogEntry};
    use pretty_assertions::assert_eq;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    fn render(nodes: &[EntryNode], width: u16, height: u16, state: &mut LogViewState) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        LogView::new(nodes).render(area, &mut buf, state);
        buf
    }

    #[test]
    fn test_entry_lines() {
        let entry = LogEntry::new("12:00", "deployed")
            .with_username("DAVE")
            .with_tags(["OPS"]);
        let nodes = vec![EntryNode::complete(&entry, true)];
        let mut state = LogViewState::default();
        let buf = render(&nodes, 30, 6, &mut state);

        assert_eq!(row(&buf, 0), "12:00");
        assert_eq!(row(&buf, 1), "[DAVE]");
        assert_eq!(row(&buf, 2), "deployed");
        assert_eq!(row(&buf, 3), "tags: OPS");
        assert_eq!(state.total_lines, 5);
    }

    #[test]
    fn test_cursor_drawn_while_visible() {
        let node = EntryNode::complete(&LogEntry::new("t", "msg"), true);
        node.cursor.show();
        let nodes = vec![node];
        let buf = render(&nodes, 20, 4, &mut LogViewState::default());
        assert_eq!(row(&buf, 1), "msg_");
    }

    #[test]
    fn test_long_message_wraps() {
        let nodes = vec![EntryNode::complete(
            &LogEntry::new("t", "the pod bay doors are closed"),
            true,
        )];
        let buf = render(&nodes, 12, 6, &mut LogViewState::default());
        assert_eq!(row(&buf, 1), "the pod bay");
        assert_eq!(row(&buf, 2), "doors are");
        assert_eq!(row(&buf, 3), "closed");
    }

    #[test]
    fn test_empty_log_placeholder() {
        let mut state = LogViewState::default();
        let buf = render(&[], 40, 3, &mut state);
        assert_eq!(row(&buf, 0), "Awaiting log entries...");
        assert_eq!(state.total_lines, 0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let nodes: Vec<_> = (0..5)
            .map(|i| EntryNode::complete(&LogEntry::new(format!("t{i}"), format!("m{i}")), true))
            .collect();
        let mut state = LogViewState::default();
        render(&nodes, 20, 4, &mut state);
        assert_eq!(state.total_lines, 15);

        state.scroll(100);
        assert_eq!(state.scroll_offset, 11);
        state.page_up();
        assert_eq!(state.scroll_offset, 8);
        state.scroll_to_top();

        let buf = render(&nodes, 20, 4, &mut state);
        assert_eq!(row(&buf, 0), "t0");
    }
}
