use std::fmt;
use std::time::Duration;

use reqwest::Error as ReqwestError;
use thiserror::Error;

// Where a rate limit rejection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOrigin {
    Client { quota: usize, window: Duration }, // Local sliding window was full
    Server,                                    // The API answered with HTTP 420
}

impl fmt::Display for RateLimitOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitOrigin::Client { quota, window } => {
                write!(f, "client quota of {} requests per {:?}", quota, window)
            }
            RateLimitOrigin::Server => write!(f, "server responded with status 420"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("rate limit exceeded: {origin}")]
    RateLimitExceeded { origin: RateLimitOrigin },

    #[error("transport error: {0}")]
    Transport(#[from] ReqwestError),

    #[error("API request failed with status: {0}")]
    UnexpectedStatus(u16),

    #[error("malformed response envelope: {0}")]
    EnvelopeDecode(#[source] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] ReqwestError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimitExceeded { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(err) if err.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
