use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use scholar_gateway::config::{get_config, load_config};
use scholar_gateway::feed::{FallbackFeed, FeedOptions};
use scholar_gateway::gateway::{build_router, AppState};
use scholar_gateway::upstream::{RateLimiter, SearchSource, SemanticScholarClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholar Gateway - paper feed and recommendations backend
#[derive(Parser, Debug)]
#[command(name = "scholar-gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP gateway serving a deduplicated paper feed and recommendations", long_about = None)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Address to listen on (overrides configuration)
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up S2_API_KEY and friends from a .env file when present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("scholar_gateway={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => get_config().context("failed to load configuration from environment")?,
    };

    let api_key = config
        .upstream
        .api_key
        .clone()
        .context("Semantic Scholar API key is not set in the environment (S2_API_KEY)")?;

    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
        config.upstream.throttle_ms,
    )));
    let client = Arc::new(SemanticScholarClient::new(api_key, limiter));

    let options = FeedOptions {
        page_size: config.fallback.page_size,
        max_pages_per_call: config.fallback.max_pages_per_call,
    };
    let feed = FallbackFeed::new(Arc::clone(&client) as Arc<dyn SearchSource>, options);

    let state = AppState::new(client, feed);
    let router = build_router(state, &config.server.allowed_origins);

    let addr = cli.listen.unwrap_or(config.server.listen);
    tracing::info!(%addr, "scholar gateway listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, router)
        .await
        .context("server error")?;

    Ok(())
}
