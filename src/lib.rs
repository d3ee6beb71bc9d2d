pub mod api_client;
pub mod config;
pub mod errors;
pub mod models;
pub mod rate_limiter;
pub mod search_query;

pub use api_client::SearchClient;
pub use config::ClientConfig;
pub use errors::{Error, RateLimitOrigin, Result};
pub use models::{Country, Entity, Game, Location, Names, Region, SearchResultEnvelope, User};
pub use rate_limiter::{Clock, ManualClock, RateLimiter, RateWindow, SystemClock};
