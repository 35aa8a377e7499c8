//! Update Client
//!
//! Builds and sends one `POST /update` to the monitor server.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Request timeout for the whole exchange
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the shared secret
pub const AUTH_HEADER: &str = "X-Auth-Token";

const USER_AGENT: &str = concat!("hal-post/", env!("CARGO_PKG_VERSION"));

/// Errors from building or sending an update
#[derive(Debug, Error)]
pub enum PostError {
    /// No token on the command line or in the environment
    #[error("X-Auth-Token must be provided via --token or the AUTH_TOKEN environment variable")]
    TokenMissing,

    /// Empty message
    #[error("message cannot be empty, must be provided via -m")]
    MessageEmpty,

    /// The request could not be built or sent
    #[error("request to {url} failed: {source}")]
    Request {
        /// Target URL
        url: String,
        /// Underlying failure
        #[source]
        source: reqwest::Error,
    },
}

/// JSON body of an update
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Update {
    /// Message text
    pub message: String,
    /// Tags, omitted when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Update {
    /// Validate and build an update
    ///
    /// # Errors
    ///
    /// Returns [`PostError::MessageEmpty`] for a blank message.
    pub fn new(message: &str, tags: Option<&str>) -> Result<Self, PostError> {
        if message.trim().is_empty() {
            return Err(PostError::MessageEmpty);
        }
        Ok(Self {
            message: message.to_string(),
            tags: tags.map(split_tags).unwrap_or_default(),
        })
    }
}

/// Split a comma-separated list, trimming and dropping empties
#[must_use]
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pick the token from the flag, falling back to the environment value
///
/// # Errors
///
/// Returns [`PostError::TokenMissing`] if neither is set.
pub fn resolve_token(flag: Option<String>, env: Option<String>) -> Result<String, PostError> {
    flag.filter(|t| !t.is_empty())
        .or_else(|| env.filter(|t| !t.is_empty()))
        .ok_or(PostError::TokenMissing)
}

/// Update endpoint for `addr` (`host:port`, `:port`, or a full URL)
#[must_use]
pub fn update_url(addr: &str) -> String {
    let base = if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.trim_end_matches('/').to_string()
    } else if addr.starts_with(':') {
        format!("http://localhost{addr}")
    } else {
        format!("http://{addr}")
    };
    format!("{base}/update")
}

/// Server reply
#[derive(Debug)]
pub struct Reply {
    /// HTTP status
    pub status: reqwest::StatusCode,
    /// Response body
    pub body: String,
}

/// Send `update` to `addr`
///
/// # Errors
///
/// Returns [`PostError::Request`] if the request cannot be sent or the
/// response cannot be read. Non-success statuses are returned as a [`Reply`].
pub async fn send_update(addr: &str, token: &str, update: &Update) -> Result<Reply, PostError> {
    let url = update_url(addr);
    let wrap = |source| PostError::Request {
        url: url.clone(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(wrap)?;

    tracing::debug!(url = %url, tags = update.tags.len(), "Posting update");
    let response = client
        .post(&url)
        .header(AUTH_HEADER, token)
        .json(update)
        .send()
        .await
        .map_err(wrap)?;

    let status = response.status();
    let body = response.text().await.map_err(wrap)?;
    Ok(Reply { status, body })
}
