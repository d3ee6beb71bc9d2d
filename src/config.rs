use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.speedrun.com/api/v1";
pub const DEFAULT_USER_AGENT: &str = "speedrun-browser/1.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RATE_LIMIT: usize = 100;
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,   // API root, without trailing slash
    pub user_agent: String, // Sent with every request
    pub timeout: Duration,  // Bound on the whole request, body included
    pub rate_limit: usize,  // Max requests per window
    pub rate_window: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }
}

impl ClientConfig {
    // Defaults overridden by SPEEDRUN_* environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("SPEEDRUN_API_URL") {
            config.base_url = url;
        }
        if let Some(agent) = lookup("SPEEDRUN_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SPEEDRUN_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = parse_var::<usize>(&lookup, "SPEEDRUN_RATE_LIMIT")? {
            config.rate_limit = limit;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SPEEDRUN_RATE_WINDOW_SECS")? {
            config.rate_window = Duration::from_secs(secs);
        }

        Ok(config.normalized())
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self.normalized()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn rate_limit(mut self, limit: usize, window: Duration) -> Self {
        self.rate_limit = limit;
        self.rate_window = window;
        self
    }

    fn normalized(mut self) -> Self {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, raw))),
    }
}
