//! Upstream API access: client, rate limiting, and the error taxonomy.
//!
//! The [`SearchSource`] trait is the seam between the fallback feed engine
//! and the network. [`SemanticScholarClient`] is the production
//! implementation; tests script responses through [`mock::MockSource`].

mod client;
pub mod mock;
mod throttle;

pub use client::{SemanticScholarClient, PAPER_FIELDS};
pub use throttle::RateLimiter;

use async_trait::async_trait;

use crate::models::Paper;

/// Errors produced by upstream calls and the fallback feed
#[derive(Debug, thiserror::Error)]
pub enum ScholarError {
    /// Upstream signaled HTTP 429; never retried locally
    #[error("rate limit exceeded, wait and try again shortly")]
    RateLimited,

    /// Transport failure or a non-success HTTP status other than 429
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// A single-paper search matched nothing
    #[error("no papers found")]
    NotFound,

    /// A single-paper recommendation lookup returned nothing
    #[error("no recommended papers returned")]
    NoRecommendations,

    /// The fallback stream is exhausted or upstream is unusable
    #[error("no fallback papers available")]
    NoFallbackAvailable,
}

impl From<reqwest::Error> for ScholarError {
    fn from(err: reqwest::Error) -> Self {
        ScholarError::RequestFailed(err.to_string())
    }
}

/// A paginated paper search backend.
#[async_trait]
pub trait SearchSource: Send + Sync + std::fmt::Debug {
    /// Fetch up to `limit` papers matching `query`, starting at `offset`.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Paper>, ScholarError>;
}
