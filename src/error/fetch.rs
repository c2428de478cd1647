use std::time::Duration;

use thiserror::Error;

/// Failure of a single benchmark request. Recorded per request, never fatal
/// to the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out after {elapsed:?}: {source}")]
    Timeout {
        elapsed: Duration,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read response body: {source}")]
    Body {
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected status {status}.")]
    UnexpectedStatus { status: u16 },
    #[error("Invalid request URL: {reason}")]
    InvalidUrl { reason: String },
    #[cfg(test)]
    #[error("Simulated failure: {reason}")]
    Simulated { reason: &'static str },
}

impl FetchError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "timeout",
            FetchError::Transport { .. } => "transport",
            FetchError::Body { .. } => "body",
            FetchError::UnexpectedStatus { .. } => "status",
            FetchError::InvalidUrl { .. } => "url",
            #[cfg(test)]
            FetchError::Simulated { .. } => "simulated",
        }
    }
}
