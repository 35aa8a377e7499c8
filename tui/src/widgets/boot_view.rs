//! BootView Widget
//!
//! Full-screen boot console. Lines scroll up once they outgrow the screen so
//! the line being typed stays visible.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;

use monitor_core::BootSnapshot;

use crate::theme;

/// Left margin inside the console
const MARGIN: u16 = 2;

/// The boot console
pub struct BootView<'a> {
    snapshot: &'a BootSnapshot,
    cursor_on: bool,
}

impl<'a> BootView<'a> {
    /// View of `snapshot`
    #[must_use]
    pub fn new(snapshot: &'a BootSnapshot) -> Self {
        Self {
            snapshot,
            cursor_on: true,
        }
    }

    /// Blink phase of the terminal cursor
    #[must_use]
    pub fn cursor_on(mut self, on: bool) -> Self {
        self.cursor_on = on;
        self
    }
}

impl Widget for BootView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width <= MARGIN || area.height == 0 {
            return;
        }
        let width = (area.width - MARGIN) as usize;
        let x = area.x + MARGIN;
        let fade = if self.snapshot.fading {
            Modifier::DIM
        } else {
            Modifier::empty()
        };

        if let Some(notice) = &self.snapshot.notice {
            let style = theme::boot_line_style(monitor_core::LineStyle::Warning).add_modifier(fade);
            buf.set_stringn(x, area.y + area.height / 2, notice, width, style);
            return;
        }

        let mut rows: Vec<(&str, Style)> = self
            .snapshot
            .lines
            .iter()
            .map(|(style, text)| (text.as_str(), theme::boot_line_style(*style).add_modifier(fade)))
            .collect();
        if self.snapshot.cursor {
            let glyph = if self.cursor_on { "_" } else { " " };
            rows.push((glyph, theme::cursor_style().add_modifier(fade)));
        }

        let height = area.height as usize;
        let skip = rows.len().saturating_sub(height);
        for (i, (text, style)) in rows.iter().skip(skip).enumerate() {
            let y = area.y + u16::try_from(i).unwrap_or(u16::MAX);
            buf.set_stringn(x, y, text, width, *style);
        }
    }
}
