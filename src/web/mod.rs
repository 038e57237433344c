mod error;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::browser::{ChromiumRenderer, RendererConfig};
use crate::cache::FeedCache;
use crate::config::Config;
use crate::feed::{FallbackChain, ListingSource, PostSource, RenderedPageSource};
use crate::plan::{GeminiClient, PlanGenerator};

pub use error::ApiError;
pub use routes::{GenerateIdeaRequest, PlanDocumentRequest, ScrapeParams};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub feed: Arc<dyn PostSource>,
    pub planner: Arc<PlanGenerator>,
    pub cache: Arc<FeedCache>,
}

impl AppState {
    /// Wire the production pipeline: listing first, rendered page as fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let listing = ListingSource::new(http.clone(), config.reddit_base_url.clone());
        let rendered = RenderedPageSource::new(
            ChromiumRenderer::new(RendererConfig::from_config(&config)),
            config.reddit_base_url.clone(),
        );
        let feed = FallbackChain::new(Box::new(listing), Box::new(rendered));

        let planner = PlanGenerator::new(GeminiClient::new(
            http,
            config.gemini_api_base.clone(),
            config.gemini_model.clone(),
        ));

        Ok(Self {
            cache: Arc::new(FeedCache::new(config.feed_cache_ttl)),
            config: Arc::new(config),
            feed: Arc::new(feed),
            planner: Arc::new(planner),
        })
    }
}

/// Start the web server and run until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails to bind or serve.
pub async fn serve(
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.web_host, state.config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let app = create_app(state);

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
