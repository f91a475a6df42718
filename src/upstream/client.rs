//! Semantic Scholar API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::models::Paper;
use crate::upstream::{RateLimiter, ScholarError, SearchSource};

const SEARCH_URL: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const RECOMMEND_URL: &str = "https://api.semanticscholar.org/recommendations/v1/papers";

/// Field set requested on every search and recommendation call
pub const PAPER_FIELDS: &str = "title,abstract,authors,url,paperId,publicationDate,journal,publicationTypes,openAccessPdf,externalIds,citationCount";

/// Client for the Semantic Scholar search and recommendation APIs.
///
/// Every call goes through the shared [`RateLimiter`] first and makes exactly
/// one attempt; the caller decides what to do with an error result.
#[derive(Debug, Clone)]
pub struct SemanticScholarClient {
    client: Arc<Client>,
    api_key: String,
    limiter: Arc<RateLimiter>,
    search_url: String,
    recommend_url: String,
}

impl SemanticScholarClient {
    pub fn new(api_key: String, limiter: Arc<RateLimiter>) -> Self {
        Self::with_endpoints(api_key, limiter, SEARCH_URL, RECOMMEND_URL)
    }

    /// Create a client against non-default endpoints (used by tests)
    pub fn with_endpoints(
        api_key: String,
        limiter: Arc<RateLimiter>,
        search_url: impl Into<String>,
        recommend_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client: Arc::new(client),
            api_key,
            limiter,
            search_url: search_url.into(),
            recommend_url: recommend_url.into(),
        }
    }

    /// Search for papers matching `query`, starting at `offset`.
    ///
    /// Returns the full (possibly empty) result list. HTTP 429 maps to
    /// [`ScholarError::RateLimited`]; any other failure to
    /// [`ScholarError::RequestFailed`].
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Paper>, ScholarError> {
        self.limiter.throttle().await;
        debug!(query, limit, offset, "dispatching paper search");

        let response = self
            .client
            .get(&self.search_url)
            .header("x-api-key", &self.api_key)
            .query(&[
                ("query", query.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("fields", PAPER_FIELDS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ScholarError::RequestFailed(format!("search request failed: {}", e)))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!("search rate limit exceeded");
            return Err(ScholarError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ScholarError::RequestFailed(format!(
                "search returned status {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ScholarError::RequestFailed(format!("invalid search response: {}", e)))?;

        Ok(body.data)
    }

    /// Search for a single paper, mapping an empty result to `NotFound`.
    pub async fn search_one(&self, query: &str) -> Result<Paper, ScholarError> {
        self.search(query, 1, 0)
            .await?
            .into_iter()
            .next()
            .ok_or(ScholarError::NotFound)
    }

    /// Fetch up to `limit` recommendations from liked/disliked paper ids.
    pub async fn recommend(
        &self,
        positive_ids: &[String],
        negative_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Paper>, ScholarError> {
        self.limiter.throttle().await;
        debug!(
            positives = positive_ids.len(),
            negatives = negative_ids.len(),
            limit,
            "dispatching recommendation lookup"
        );

        let response = self
            .client
            .post(&self.recommend_url)
            .header("x-api-key", &self.api_key)
            .query(&[
                ("fields", PAPER_FIELDS.to_string()),
                ("limit", limit.to_string()),
            ])
            .json(&json!({
                "positivePaperIds": positive_ids,
                "negativePaperIds": negative_ids,
            }))
            .send()
            .await
            .map_err(|e| {
                ScholarError::RequestFailed(format!("recommendation request failed: {}", e))
            })?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!("recommendation rate limit exceeded");
            return Err(ScholarError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ScholarError::RequestFailed(format!(
                "recommendation returned status {}",
                response.status()
            )));
        }

        let body: RecommendationsResponse = response.json().await.map_err(|e| {
            ScholarError::RequestFailed(format!("invalid recommendation response: {}", e))
        })?;

        Ok(body.recommended_papers)
    }

    /// Fetch a single recommendation, mapping empty to `NoRecommendations`.
    pub async fn recommend_one(
        &self,
        positive_ids: &[String],
        negative_ids: &[String],
    ) -> Result<Paper, ScholarError> {
        self.recommend(positive_ids, negative_ids, 1)
            .await?
            .into_iter()
            .next()
            .ok_or(ScholarError::NoRecommendations)
    }
}

#[async_trait]
impl SearchSource for SemanticScholarClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Paper>, ScholarError> {
        SemanticScholarClient::search(self, query, limit, offset).await
    }
}

// ===== Semantic Scholar API envelopes =====

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    #[serde(rename = "recommendedPapers", default)]
    recommended_papers: Vec<Paper>,
}
