//! Error types for daymark.

use thiserror::Error;

/// Why an availability request did not produce a page.
///
/// Cancellation is not represented here: a cancelled fetch is a no-op,
/// reported through [`crate::availability::FetchResult::Cancelled`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server responded with HTTP {status}")]
    Http { status: u16 },

    #[error("Malformed availability response: {0}")]
    Parse(String),
}

impl FetchError {
    /// Transient failures are worth another attempt; the rest fail the same
    /// way every time.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout => true,
            FetchError::Http { status } => *status >= 500 || *status == 429,
            FetchError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Http {
                status: status.as_u16(),
            }
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Failures on the push channel. All of them end in a reconnect.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Push channel error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for ChannelError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ChannelError::Transport(e.to_string())
    }
}

/// Errors surfaced by the public daymark API.
#[derive(Error, Debug)]
pub enum DaymarkError {
    #[error("Invalid month {month} (expected {expected})")]
    InvalidMonth { month: u32, expected: &'static str },

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDay(String),

    #[error("Invalid month '{0}'. Expected YYYY-MM")]
    InvalidMonthKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No month is visible yet")]
    NoVisibleMonth,

    #[error("Session has been shut down")]
    ShutDown,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Result type alias for daymark operations.
pub type DaymarkResult<T> = Result<T, DaymarkError>;
