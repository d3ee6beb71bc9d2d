use std::sync::Arc;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::errors::{Error, RateLimitOrigin, Result};
use crate::models::{Entity, Game, SearchResultEnvelope, User};
use crate::rate_limiter::{Clock, RateLimiter, SystemClock};
use crate::search_query::SearchQuery;

// speedrun.com signals its own quota with this non-standard status
const STATUS_RATE_LIMITED: u16 = 420;

pub struct SearchClient {
    http: Client,
    base_url: String,
    limiter: RateLimiter, // Checked before every request
}

impl SearchClient {
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(Error::Build)?;

        Ok(Self {
            http,
            base_url: config.base_url,
            limiter: RateLimiter::with_clock(config.rate_limit, config.rate_window, clock),
        })
    }

    // Search games by name, using bulk mode
    pub async fn search_games(&self, query: &str) -> Result<Vec<Game>> {
        self.search(SearchQuery::games(query)).await
    }

    // Search users by name or lookup key
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        self.search(SearchQuery::users(query)).await
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    async fn search<T: Entity>(&self, query: SearchQuery<'_>) -> Result<Vec<T>> {
        let envelope = self.fetch(&query).await?;
        let received = envelope.data.len();
        let entities: Vec<T> = envelope.into_entities();

        info!(
            kind = T::KIND,
            received,
            kept = entities.len(),
            "search finished"
        );
        Ok(entities)
    }

    async fn fetch(&self, query: &SearchQuery<'_>) -> Result<SearchResultEnvelope> {
        self.limiter.try_admit()?;

        let url = format!("{}{}", self.base_url, query.path());
        debug!(%url, params = ?query.params(), "sending request");

        let response = self
            .http
            .get(&url)
            .query(&query.params())
            .send()
            .await?;

        let status_code = response.status();
        if status_code.as_u16() == STATUS_RATE_LIMITED {
            warn!(%url, "server-side rate limit hit");
            return Err(Error::RateLimitExceeded {
                origin: RateLimitOrigin::Server,
            });
        }
        if status_code != StatusCode::OK {
            warn!(%url, status = status_code.as_u16(), "unexpected status");
            return Err(Error::UnexpectedStatus(status_code.as_u16()));
        }

        let raw_body = response.text().await?;
        serde_json::from_str(&raw_body).map_err(Error::EnvelopeDecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn exhausted_quota_skips_the_network() {
        // Nothing listens here; a real request would fail with a transport error
        let config = ClientConfig::default()
            .base_url("http://127.0.0.1:9")
            .rate_limit(0, Duration::from_secs(60));
        let client = SearchClient::with_config(config).unwrap();

        let err = client.search_games("sm64").await.unwrap_err();
        assert!(matches!(
            err,
            Error::RateLimitExceeded { origin: RateLimitOrigin::Client { .. } }
        ));
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchClient>();
    }
}
