//! Theme and Colors
//!
//! HAL's console palette: phosphor green on black, amber warnings, and the
//! red of the eye for everything HAL says.

use monitor_core::LineStyle;
use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Console Palette
// ============================================================================

/// HAL's eye - deep red
pub const HAL_RED: Color = Color::Rgb(220, 30, 30);

/// Phosphor green (main text)
pub const PHOSPHOR: Color = Color::Rgb(120, 230, 120);

/// Bright phosphor for fresh text
pub const PHOSPHOR_BRIGHT: Color = Color::Rgb(180, 255, 180);

/// Amber for warnings and usernames
pub const AMBER: Color = Color::Rgb(255, 176, 0);

/// Crew input - cool cyan
pub const CREW_CYAN: Color = Color::Rgb(120, 200, 255);

/// Secondary text (timestamps, tags)
pub const DIM_GRAY: Color = Color::Rgb(110, 110, 110);

/// Plain white for messages
pub const MESSAGE_WHITE: Color = Color::Rgb(230, 230, 230);

// ============================================================================
// Styles
// ============================================================================

/// Style for a boot script line
#[must_use]
pub fn boot_line_style(style: LineStyle) -> Style {
    match style {
        LineStyle::Banner => Style::default().fg(HAL_RED).add_modifier(Modifier::BOLD),
        LineStyle::Info => Style::default().fg(DIM_GRAY),
        LineStyle::Success => Style::default().fg(PHOSPHOR),
        LineStyle::Warning => Style::default().fg(AMBER).add_modifier(Modifier::BOLD),
        LineStyle::Prompt => Style::default().fg(PHOSPHOR_BRIGHT).add_modifier(Modifier::BOLD),
        LineStyle::UserInput => Style::default().fg(CREW_CYAN),
        LineStyle::HalResponse => Style::default().fg(HAL_RED),
        LineStyle::Blank => Style::default(),
    }
}

/// Header line
#[must_use]
pub fn header_style() -> Style {
    Style::default().fg(HAL_RED).add_modifier(Modifier::BOLD)
}

/// Entry timestamp line
#[must_use]
pub fn timestamp_style() -> Style {
    Style::default().fg(DIM_GRAY)
}

/// Entry `[NAME]` line
#[must_use]
pub fn username_style() -> Style {
    Style::default().fg(AMBER)
}

/// Entry message line
#[must_use]
pub fn message_style() -> Style {
    Style::default().fg(MESSAGE_WHITE)
}

/// Entry tags line
#[must_use]
pub fn tags_style() -> Style {
    Style::default().fg(DIM_GRAY).add_modifier(Modifier::ITALIC)
}

/// Trailing cursor
#[must_use]
pub fn cursor_style() -> Style {
    Style::default().fg(PHOSPHOR_BRIGHT).add_modifier(Modifier::BOLD)
}

/// Status line
#[must_use]
pub fn status_style() -> Style {
    Style::default().fg(DIM_GRAY)
}
