//! # Scholar Gateway
//!
//! A backend gateway exposing a deduplicated paper feed and a recommendation
//! lookup over the Semantic Scholar API.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (Paper)
//! - [`upstream`]: Semantic Scholar client, rate limiter, error taxonomy
//! - [`feed`]: The fallback pagination engine (seen-set deduplication)
//! - [`gateway`]: axum router and request handlers
//! - [`config`]: Configuration management

pub mod config;
pub mod feed;
pub mod gateway;
pub mod models;
pub mod upstream;

// Re-export commonly used types
pub use feed::{FallbackFeed, FeedOptions};
pub use models::Paper;
pub use upstream::{RateLimiter, ScholarError, SearchSource, SemanticScholarClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
