//! Output Surfaces
//!
//! The shared document model that animations write into and surfaces draw
//! from. Every mutable region is a [`TextSlot`]; nodes are built with their
//! slots already attached, so writers hold direct handles instead of looking
//! regions up after creation.
//!
//! Locks are held only for a single mutation or snapshot, never across an
//! `.await`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::boot::LineStyle;
use crate::entry::LogEntry;

// ============================================================================
// Slots
// ============================================================================

/// A mutable run of text shared between a writer and the renderer
#[derive(Clone, Debug, Default)]
pub struct TextSlot {
    text: Arc<RwLock<String>>,
}

impl TextSlot {
    /// Create an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot already holding `text`
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Arc::new(RwLock::new(text.into())),
        }
    }

    /// Remove all text
    pub fn clear(&self) {
        self.text.write().clear();
    }

    /// Append one character
    pub fn push(&self, ch: char) {
        self.text.write().push(ch);
    }

    /// Replace the contents
    pub fn set(&self, text: &str) {
        let mut slot = self.text.write();
        slot.clear();
        slot.push_str(text);
    }

    /// Current contents
    #[must_use]
    pub fn text(&self) -> String {
        self.text.read().clone()
    }

    /// Whether the slot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.read().is_empty()
    }
}

/// A transient trailing cursor
#[derive(Clone, Debug, Default)]
pub struct CursorMarker {
    visible: Arc<AtomicBool>,
}

impl CursorMarker {
    /// Show the cursor
    pub fn show(&self) {
        self.visible.store(true, Ordering::Release);
    }

    /// Remove the cursor
    pub fn hide(&self) {
        self.visible.store(false, Ordering::Release);
    }

    /// Whether the cursor is currently drawn
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }
}

// ============================================================================
// Log surface
// ============================================================================

/// The on-screen representation of one log entry
///
/// Cloning a node clones its handles, not its text.
#[derive(Clone, Debug, Default)]
pub struct EntryNode {
    /// Timestamp line
    pub timestamp: TextSlot,
    /// `[NAME]` line, present only when usernames are displayed
    pub username: Option<TextSlot>,
    /// Message line
    pub message: TextSlot,
    /// `tags: ...` line, present only when the entry has tags
    pub tags: Option<TextSlot>,
    /// Cursor trailing the message
    pub cursor: CursorMarker,
}

impl EntryNode {
    /// Empty node with the slots an entry needs
    #[must_use]
    pub fn skeleton(entry: &LogEntry, show_username: bool) -> Self {
        Self {
            timestamp: TextSlot::new(),
            username: (show_username && entry.username().is_some()).then(TextSlot::new),
            message: TextSlot::new(),
            tags: entry.tags_text().map(|_| TextSlot::new()),
            cursor: CursorMarker::default(),
        }
    }

    /// Node holding the entry's full text, for entries shown without animation
    #[must_use]
    pub fn complete(entry: &LogEntry, show_username: bool) -> Self {
        Self {
            timestamp: TextSlot::with_text(entry.timestamp_text()),
            username: if show_username {
                entry.username_text().map(TextSlot::with_text)
            } else {
                None
            },
            message: TextSlot::with_text(entry.message()),
            tags: entry.tags_text().map(TextSlot::with_text),
            cursor: CursorMarker::default(),
        }
    }
}

/// The log container: entries top-to-bottom
#[derive(Clone, Debug, Default)]
pub struct LogSurface {
    nodes: Arc<RwLock<VecDeque<EntryNode>>>,
}

impl LogSurface {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert above the current top
    pub fn prepend(&self, node: EntryNode) {
        self.nodes.write().push_front(node);
    }

    /// Insert below the current bottom
    pub fn append(&self, node: EntryNode) {
        self.nodes.write().push_back(node);
    }

    /// Insert at `index` from the top (clamped to the bottom)
    pub fn insert(&self, index: usize, node: EntryNode) {
        let mut nodes = self.nodes.write();
        let index = index.min(nodes.len());
        nodes.insert(index, node);
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the log has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Handles to every node, top-to-bottom
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntryNode> {
        self.nodes.read().iter().cloned().collect()
    }

    /// Current message text of every node, top-to-bottom
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.nodes
            .read()
            .iter()
            .map(|node| node.message.text())
            .collect()
    }
}

// ============================================================================
// Boot screen
// ============================================================================

/// One rendered script line
#[derive(Clone, Debug)]
pub struct BootLine {
    /// Style tag from the script
    pub style: LineStyle,
    /// Revealed text so far
    pub text: TextSlot,
}

/// Plain copy of the boot screen for drawing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootSnapshot {
    /// Lines in order with their current text
    pub lines: Vec<(LineStyle, String)>,
    /// Interruption notice, shown alone after a skip
    pub notice: Option<String>,
    /// Whether the terminal cursor is shown below the last line
    pub cursor: bool,
    /// Whether the screen is fading out
    pub fading: bool,
    /// Whether the screen has handed off to the main interface
    pub dismissed: bool,
}

#[derive(Debug, Default)]
struct BootState {
    lines: Vec<BootLine>,
    notice: Option<String>,
    cursor: bool,
    fading: bool,
    dismissed: bool,
}

/// The boot sequence display surface
#[derive(Clone, Debug, Default)]
pub struct BootScreen {
    state: Arc<RwLock<BootState>>,
}

impl BootScreen {
    /// Create a blank screen
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty line and return its slot
    #[must_use]
    pub fn push_line(&self, style: LineStyle) -> TextSlot {
        let text = TextSlot::new();
        self.state.write().lines.push(BootLine {
            style,
            text: text.clone(),
        });
        text
    }

    /// Remove all script content
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.lines.clear();
        state.notice = None;
        state.cursor = false;
    }

    /// Show the interruption notice
    pub fn show_notice(&self, notice: impl Into<String>) {
        self.state.write().notice = Some(notice.into());
    }

    /// Append the terminal cursor
    pub fn show_cursor(&self) {
        self.state.write().cursor = true;
    }

    /// Start fading out
    pub fn begin_fade(&self) {
        self.state.write().fading = true;
    }

    /// Hand the screen over to the main interface
    pub fn dismiss(&self) {
        self.state.write().dismissed = true;
    }

    /// Whether the screen has been dismissed
    #[must_use]
    pub fn is_dismissed(&self) -> bool {
        self.state.read().dismissed
    }

    /// Number of script lines currently on screen
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.state.read().lines.len()
    }

    /// Copy the screen for drawing
    #[must_use]
    pub fn snapshot(&self) -> BootSnapshot {
        let state = self.state.read();
        BootSnapshot {
            lines: state
                .lines
                .iter()
                .map(|line| (line.style, line.text.text()))
                .collect(),
            notice: state.notice.clone(),
            cursor: state.cursor,
            fading: state.fading,
            dismissed: state.dismissed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slot_handles_share_text() {
        let slot = TextSlot::new();
        let handle = slot.clone();
        handle.push('h');
        handle.push('i');
        assert_eq!(slot.text(), "hi");
        slot.clear();
        assert!(handle.is_empty());
    }

    #[test]
    fn test_log_surface_ordering() {
        let log = LogSurface::new();
        log.append(EntryNode::complete(&LogEntry::new("1", "A"), true));
        log.append(EntryNode::complete(&LogEntry::new("0", "Z"), true));
        log.prepend(EntryNode::complete(&LogEntry::new("2", "B"), true));
        assert_eq!(log.messages(), vec!["B", "A", "Z"]);
    }

    #[test]
    fn test_skeleton_slots_follow_entry_shape() {
        let bare = LogEntry::new("t", "m");
        let full = LogEntry::new("t", "m").with_username("DAVE").with_tags(["X"]);

        let node = EntryNode::skeleton(&bare, true);
        assert!(node.username.is_none());
        assert!(node.tags.is_none());

        let node = EntryNode::skeleton(&full, true);
        assert!(node.username.is_some());
        assert!(node.tags.is_some());
        assert!(node.message.is_empty());

        let node = EntryNode::skeleton(&full, false);
        assert!(node.username.is_none());
    }

    #[test]
    fn test_complete_node_text() {
        let entry = LogEntry::new("12:00", "hello")
            .with_username("DAVE")
            .with_tags(["A", "B"]);
        let node = EntryNode::complete(&entry, true);
        assert_eq!(node.timestamp.text(), "12:00");
        assert_eq!(node.username.unwrap().text(), "[DAVE]");
        assert_eq!(node.message.text(), "hello");
        assert_eq!(node.tags.unwrap().text(), "tags: A, B");
        assert!(!node.cursor.is_visible());
    }

    #[test]
    fn test_boot_screen_clear_keeps_lifecycle_flags() {
        let screen = BootScreen::new();
        let slot = screen.push_line(LineStyle::Info);
        slot.set("System Version");
        screen.show_cursor();
        screen.begin_fade();
        screen.clear();

        let snap = screen.snapshot();
        assert!(snap.lines.is_empty());
        assert!(!snap.cursor);
        assert!(snap.fading);
        assert!(!snap.dismissed);
    }
}
