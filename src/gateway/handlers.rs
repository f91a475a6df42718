//! Request handlers.
//!
//! The external contract always yields a list of paper-shaped objects: every
//! upstream failure on the recommendation path is masked by a same-shape
//! fallback batch, never surfaced as an error status.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::gateway::AppState;
use crate::models::Paper;

/// Recommendation batch size, fixed server-side regardless of feed limit
const RECOMMENDATION_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    #[serde(default = "default_feed_limit")]
    pub limit: usize,
    pub field: Option<String>,
}

fn default_feed_limit() -> usize {
    1
}

/// `GET /feed?limit=&field=` — a best-effort batch from the fallback feed.
pub async fn feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Json<Vec<Paper>> {
    let mut feed = state.feed.lock().await;
    Json(feed.next_batch(params.limit, params.field.as_deref()).await)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationsRequest {
    pub positive_paper_ids: Vec<String>,
    pub negative_paper_ids: Vec<String>,
}

/// `POST /recommendations` — recommended papers for liked/disliked ids.
///
/// Without signal in both lists the recommend call is skipped entirely; on
/// any recommend error the response degrades to a fallback batch of the same
/// size.
pub async fn recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationsRequest>,
) -> Json<Vec<Paper>> {
    if request.positive_paper_ids.is_empty() || request.negative_paper_ids.is_empty() {
        warn!("no liked/disliked papers supplied, returning fallback batch");
        return Json(fallback_batch(&state).await);
    }

    match state
        .client
        .recommend(
            &request.positive_paper_ids,
            &request.negative_paper_ids,
            RECOMMENDATION_LIMIT,
        )
        .await
    {
        Ok(papers) => Json(papers),
        Err(err) => {
            warn!(%err, "recommendation lookup failed, returning fallback batch");
            Json(fallback_batch(&state).await)
        }
    }
}

async fn fallback_batch(state: &AppState) -> Vec<Paper> {
    let mut feed = state.feed.lock().await;
    feed.next_batch(RECOMMENDATION_LIMIT, None).await
}

/// `POST /reset-fallback` — clear the feed engine state.
pub async fn reset_fallback(State(state): State<AppState>) -> Json<Value> {
    state.feed.lock().await.reset();
    Json(json!({ "status": "fallback state reset" }))
}
