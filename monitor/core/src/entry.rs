//! Log Entries
//!
//! The wire model for one activity-log entry and the text each display slot
//! receives. Entries arrive from the backfill (many at once) and from the live
//! stream (one per event); both share the same record shape:
//!
//! ```json
//! { "id": 7, "timestamp": "2025-01-01T12:03:00Z", "message": "deploy",
//!   "username": "DAVE", "tags": ["OPS"] }
//! ```
//!
//! Entries are immutable once parsed.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Epoch values above this are treated as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Display format for parsed timestamps (local time)
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A payload that could not be decoded as a [`LogEntry`]
#[derive(Debug, Error)]
#[error("Malformed entry payload: {source}")]
pub struct ParseError {
    #[from]
    source: serde_json::Error,
}

// ============================================================================
// Timestamp
// ============================================================================

/// An entry timestamp: the raw wire text plus its parsed instant, if any.
///
/// Unparseable timestamps are kept and displayed verbatim rather than
/// rejecting the entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    instant: Option<DateTime<FixedOffset>>,
}

impl Timestamp {
    /// Parse a wire timestamp (RFC 3339, offset-less ISO-8601, or epoch)
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let instant = parse_instant(raw.trim());
        Self { raw, instant }
    }

    /// Timestamp from an integer epoch (seconds, or milliseconds when large)
    #[must_use]
    pub fn from_epoch(value: i64) -> Self {
        Self {
            raw: value.to_string(),
            instant: epoch_instant(value),
        }
    }

    /// The text exactly as received
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed instant, if the raw text was recognised
    #[must_use]
    pub fn instant(&self) -> Option<DateTime<FixedOffset>> {
        self.instant
    }

    /// Text shown in the timestamp slot
    #[must_use]
    pub fn display(&self) -> String {
        match self.instant {
            Some(instant) => instant
                .with_timezone(&Local)
                .format(DISPLAY_FORMAT)
                .to_string(),
            None => self.raw.clone(),
        }
    }
}

fn parse_instant(text: &str) -> Option<DateTime<FixedOffset>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.fixed_offset());
        }
    }
    text.parse::<i64>().ok().and_then(epoch_instant)
}

fn epoch_instant(value: i64) -> Option<DateTime<FixedOffset>> {
    let utc = if value.unsigned_abs() > EPOCH_MILLIS_THRESHOLD.unsigned_abs() {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    };
    utc.map(|dt| dt.fixed_offset())
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Epoch(i64),
            Fractional(f64),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(text) => Timestamp::parse(text),
            Wire::Epoch(value) => Timestamp::from_epoch(value),
            #[allow(clippy::cast_possible_truncation)]
            Wire::Fractional(value) => Timestamp::from_epoch(value as i64),
        })
    }
}

// ============================================================================
// LogEntry
// ============================================================================

/// One activity-log entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    timestamp: Timestamp,
    message: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    username: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    tags: Vec<String>,
}

impl LogEntry {
    /// Create an entry with no username and no tags
    pub fn new(timestamp: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: None,
            timestamp: Timestamp::parse(timestamp),
            message: message.into(),
            username: None,
            tags: Vec::new(),
        }
    }

    /// Set the author
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        self.username = (!username.is_empty()).then_some(username);
        self
    }

    /// Set the tags
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Decode a single JSON record (one live event payload)
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the payload is not a valid entry record.
    pub fn parse(payload: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Server-assigned id, if present
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// When the entry was written
    #[must_use]
    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    /// The entry text
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Author, if the entry has one
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Tags in wire order
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Text for the timestamp slot
    #[must_use]
    pub fn timestamp_text(&self) -> String {
        self.timestamp.display()
    }

    /// Text for the username slot (`[NAME]`)
    #[must_use]
    pub fn username_text(&self) -> Option<String> {
        self.username.as_ref().map(|name| format!("[{name}]"))
    }

    /// Text for the tags slot (`tags: A, B`), absent when there are no tags
    #[must_use]
    pub fn tags_text(&self) -> Option<String> {
        (!self.tags.is_empty()).then(|| format!("tags: {}", self.tags.join(", ")))
    }

    /// Whether this entry belongs to `identity`
    ///
    /// Usernames are compared trimmed and ASCII case-insensitively (the server
    /// stores them upper-cased). An entry without a username never matches.
    #[must_use]
    pub fn matches_identity(&self, identity: &str) -> bool {
        self.username
            .as_deref()
            .is_some_and(|name| name.trim().eq_ignore_ascii_case(identity.trim()))
    }
}

/// Canonical form of a user-supplied identity: trimmed and upper-cased.
///
/// Returns `None` for blank input.
#[must_use]
pub fn normalize_identity(identity: &str) -> Option<String> {
    let trimmed = identity.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_uppercase())
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|name| !name.is_empty()))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
