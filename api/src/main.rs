mod config;
mod handler;
mod service;

use axum::{
    routing::{get, post},
    Router,
};
use connectors::{GeminiAnalyzer, GeminiConfig, MarketAnalyzer};
use market::{Aggregator, MarketConfig, Poller};
use service::MarketService;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting CoinWatch API");

    // Load configuration from environment
    let api_config = config::ApiConfig::from_env();
    let market_config = MarketConfig::from_env()
        .map_err(|e| format!("Failed to load market configuration: {}", e))?;

    // Exchange connectors behind one aggregator
    let aggregator = Arc::new(
        Aggregator::from_config(&market_config.connectors)
            .map_err(|e| format!("Failed to create exchange connectors: {}", e))?,
    );

    let analyzer: Option<Arc<dyn MarketAnalyzer>> = match GeminiConfig::from_env() {
        Some(gemini) => Some(Arc::new(GeminiAnalyzer::new(gemini)?) as Arc<dyn MarketAnalyzer>),
        None => {
            warn!("GEMINI_API_KEY not set, market analysis disabled");
            None
        }
    };

    let poller = Poller::new(aggregator.clone(), market_config.intervals);
    let mut service = MarketService::new(aggregator, poller, analyzer);
    service.configure(market_config.initial);
    let service = Arc::new(RwLock::new(service));

    // Create CORS middleware
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Create Axum router with API routes
    let app = Router::new()
        .route("/api/v1/snapshot", get(handler::get_snapshot))
        .route("/api/v1/snapshot/initial", get(handler::get_initial_snapshot))
        .route("/api/v1/snapshot/poll", get(handler::poll_snapshot))
        .route(
            "/api/v1/config",
            get(handler::get_config).put(handler::put_config),
        )
        .route(
            "/api/v1/watchlist/:symbol",
            post(handler::add_symbol).delete(handler::remove_symbol),
        )
        .route(
            "/api/v1/analysis",
            get(handler::get_analysis).post(handler::run_analysis),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service.clone());

    // Start server
    let addr = api_config.addr()?;
    info!("Listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // release the poll timer before the runtime shuts down
    service.write().await.shutdown();
    info!("CoinWatch API stopped");

    Ok(())
}
