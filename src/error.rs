//! Error taxonomy for the feed integration layer.
//!
//! Every fallible operation in this crate returns `Result<_, FeedError>` so
//! callers can tell configuration mistakes, malformed feeds, authentication
//! failures, and transport problems apart and apply their own retry/backoff
//! policy. Nothing in this crate retries on its own except the single
//! 401-after-cached-token refresh in the REST clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Requested distributor code is not one of the five supported values.
    #[error("Unknown distributor: {0}")]
    UnknownDistributor(String),

    /// Missing or invalid configuration. Raised synchronously, before any I/O.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed feed content (CSV quoting, EDI segments, JSON payloads).
    #[error("parse error: {0}")]
    Parse(String),

    /// A field mapping transform rejected a row.
    #[error("field mapping error: {0}")]
    Map(String),

    /// Non-success HTTP response from a token endpoint or a 401 on a
    /// resource call. Status and body are preserved verbatim.
    #[error("auth failure: HTTP {status} - {body}")]
    Auth { status: u16, body: String },

    /// Rejected SFTP login.
    #[error("authentication failed: {0}")]
    Credentials(String),

    /// Network-level failure (connect, DNS, non-auth HTTP errors).
    #[error("transport error: {0}")]
    Transport(String),

    /// An operation exceeded its configured deadline. Retryable; the token
    /// cache is left in its prior state.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl FeedError {
    /// Whether a caller-side retry with backoff is reasonable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FeedError::Transport(_) | FeedError::Timeout(_))
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}
