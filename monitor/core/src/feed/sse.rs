//! Server-Sent Events Decoder
//!
//! Incremental `text/event-stream` parser. Bytes go in as they arrive off the
//! socket (chunk boundaries may split lines or UTF-8 sequences); complete
//! event payloads come out.
//!
//! Only unnamed events and events named `message` are emitted, matching what
//! an `onmessage` listener receives. Multi-line `data:` fields are joined with
//! `\n`; comments and `id:` lines are ignored; `retry:` is remembered.

use std::time::Duration;

/// Largest line or event payload kept, in bytes. Anything bigger is dropped.
pub const MAX_EVENT_BYTES: usize = 1024 * 1024;

/// Incremental event-stream decoder
#[derive(Debug)]
pub struct SseDecoder {
    pending: Vec<u8>,
    // Bytes of `pending` already searched for a newline
    scanned: usize,
    data: Vec<String>,
    data_bytes: usize,
    event: Option<String>,
    retry: Option<Duration>,
    max_event_bytes: usize,
    skipping_line: bool,
    discard_event: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            data: Vec::new(),
            data_bytes: 0,
            event: None,
            retry: None,
            max_event_bytes: MAX_EVENT_BYTES,
            skipping_line: false,
            discard_event: false,
        }
    }
}

impl SseDecoder {
    /// Create a decoder with no buffered input
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the size of a single line and of an event's joined data
    #[must_use]
    pub fn with_max_event_bytes(mut self, max: usize) -> Self {
        self.max_event_bytes = max;
        self
    }

    /// Feed raw bytes; returns the payloads of every event completed by them
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        let mut start = 0;
        let mut search = self.scanned;
        while let Some(offset) = self.pending[search..].iter().position(|b| *b == b'\n') {
            let end = search + offset;
            let raw = &self.pending[start..end];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw).into_owned();
            start = end + 1;
            search = start;

            if self.skipping_line {
                // Tail of an oversized line
                self.skipping_line = false;
                continue;
            }
            if let Some(payload) = self.process_line(&line) {
                payloads.push(payload);
            }
        }

        self.pending.drain(..start);
        self.scanned = self.pending.len();

        if self.pending.len() > self.max_event_bytes {
            tracing::warn!(
                bytes = self.pending.len(),
                limit = self.max_event_bytes,
                "Dropping oversized event stream line"
            );
            self.pending.clear();
            self.scanned = 0;
            self.skipping_line = true;
            self.drop_event();
        }
        payloads
    }

    /// Reconnection delay requested by the server, if any
    #[must_use]
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Drop any partial event (used when the connection is reopened)
    pub fn reset(&mut self) {
        self.pending.clear();
        self.scanned = 0;
        self.data.clear();
        self.data_bytes = 0;
        self.event = None;
        self.skipping_line = false;
        self.discard_event = false;
    }

    /// Forget the event being assembled; the next blank line emits nothing
    fn drop_event(&mut self) {
        self.data.clear();
        self.data_bytes = 0;
        self.discard_event = true;
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" if !self.discard_event => {
                self.data_bytes += value.len() + 1;
                if self.data_bytes > self.max_event_bytes {
                    tracing::warn!(limit = self.max_event_bytes, "Dropping oversized event");
                    self.drop_event();
                } else {
                    self.data.push(value.to_string());
                }
            }
            "event" => self.event = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.trim().parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        let event = self.event.take();
        if std::mem::take(&mut self.discard_event) {
            return None;
        }
        self.data_bytes = 0;
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();

        match event.as_deref() {
            None | Some("" | "message") => Some(payload),
            Some(other) => {
                tracing::trace!(event = other, "Ignoring named event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b"data: {\"message\":\"hi\"}\n\n");
        assert_eq!(out, vec![r#"{"message":"hi"}"#.to_string()]);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"da").is_empty());
        assert!(decoder.feed(b"ta: one").is_empty());
        assert!(decoder.feed(b"\n").is_empty());
        assert_eq!(decoder.feed(b"\n"), vec!["one".to_string()]);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: café\n\n".as_bytes();
        let (a, b) = bytes.split_at(10);
        assert!(decoder.feed(a).is_empty());
        assert_eq!(decoder.feed(b), vec!["café".to_string()]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b"data: a\n\ndata: b\r\n\r\n");
        assert_eq!(out, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b": keepalive\ndata: line1\ndata:line2\nid: 4\n\n");
        assert_eq!(out, vec!["line1\nline2".to_string()]);
    }

    #[test]
    fn test_named_events_are_skipped() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b"event: ping\ndata: x\n\nevent: message\ndata: y\n\n");
        assert_eq!(out, vec!["y".to_string()]);
    }

    #[test]
    fn test_blank_line_without_data() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"\n\n\n").is_empty());
    }

    #[test]
    fn test_retry_field() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"retry: 2500\n");
        assert_eq!(decoder.retry(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_oversized_line_is_dropped_with_its_event() {
        let mut decoder = SseDecoder::new().with_max_event_bytes(16);
        assert!(decoder.feed(b"data: first half of a long line").is_empty());
        assert!(decoder.feed(b" still going\n\n").is_empty());
        assert_eq!(decoder.feed(b"data: ok\n\n"), vec!["ok".to_string()]);
    }

    #[test]
    fn test_oversized_multiline_event_is_dropped() {
        let mut decoder = SseDecoder::new().with_max_event_bytes(16);
        let out = decoder.feed(b"data: 0123456789\ndata: 0123456789\n\ndata: ok\n\n");
        assert_eq!(out, vec!["ok".to_string()]);
    }

    #[test]
    fn test_line_split_over_many_chunks() {
        let mut decoder = SseDecoder::new();
        for byte in b"data: byte by byte\n" {
            assert!(decoder.feed(std::slice::from_ref(byte)).is_empty());
        }
        assert_eq!(decoder.feed(b"\n"), vec!["byte by byte".to_string()]);
    }

    #[test]
    fn test_reset_discards_partial_event() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: partial\n");
        decoder.reset();
        assert!(decoder.feed(b"\n").is_empty());
    }
}
