//! HTTP gateway: router, shared state, and request handlers.

pub mod handlers;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::feed::FallbackFeed;
use crate::upstream::SemanticScholarClient;

/// Shared state handed to every request handler.
///
/// The feed engine sits behind a single mutex held across each full
/// fetch-check-insert step, so concurrent requests cannot double-fetch a page
/// or hand out the same paper twice.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<SemanticScholarClient>,
    pub feed: Arc<Mutex<FallbackFeed>>,
}

impl AppState {
    pub fn new(client: Arc<SemanticScholarClient>, feed: FallbackFeed) -> Self {
        Self {
            client,
            feed: Arc::new(Mutex::new(feed)),
        }
    }
}

/// Build the gateway router with CORS restricted to `allowed_origins`.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    Router::new()
        .route("/feed", get(handlers::feed))
        .route("/recommendations", post(handlers::recommendations))
        .route("/reset-fallback", post(handlers::reset_fallback))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
