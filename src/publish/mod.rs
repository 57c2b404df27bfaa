//! Posting entries to the remote platform.
//!
//! [`Connect`] establishes an authenticated session from a configuration's
//! credentials; the resulting [`Publisher`] submits one link post at a time.
//! [`reddit`] holds the concrete implementation.

pub mod reddit;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::FeedConfig;

pub use reddit::{RedditConnector, RedditEndpoints, RedditSession};

#[derive(Debug, Error)]
pub enum PublishError {
    /// The platform asked us to slow down. Recoverable: back off and retry.
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// Credentials were rejected or the session is no longer valid.
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    /// The platform refused the submission for a reason other than rate limiting.
    #[error("Submission rejected: {0}")]
    Api(String),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl PublishError {
    /// True for the one failure mode the submission driver retries.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PublishError::RateLimited(_))
    }
}

/// Reference to a post created by [`Publisher::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Platform identifier of the post (e.g. `t3_abc123`).
    pub id: String,
    /// Permalink of the post, when the platform returned one.
    pub url: Option<String>,
}

/// An authenticated session able to create link posts.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn submit(&self, title: &str, url: &str) -> Result<Submission, PublishError>;
}

/// Creates [`Publisher`] sessions from configuration credentials.
///
/// Called only when a configuration has something to submit, so runs with
/// nothing new never authenticate.
#[async_trait]
pub trait Connect: Send + Sync {
    async fn connect(&self, config: &FeedConfig) -> Result<Box<dyn Publisher>, PublishError>;
}
