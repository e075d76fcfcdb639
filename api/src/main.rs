mod config;
mod handler;
mod screen;
mod service;

use axum::{
    routing::{get, post},
    Router,
};
use config::ApiConfig;
use connectors::{CoinGeckoConfig, CoinGeckoConnector};
use service::DashboardService;
use std::net::SocketAddr;
use std::sync::Arc;
use store::{FileStore, StoreConfig, WatchlistStore};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting CoinLizard dashboard API");

    // Load configuration from environment
    let api_config = ApiConfig::from_env();
    let store_config = StoreConfig::from_env();
    let coingecko_config = CoinGeckoConfig::from_env();

    // One watchlist shared by every view
    let storage = FileStore::open(&store_config.path)
        .await
        .map_err(|e| format!("Failed to open store {}: {}", store_config.path.display(), e))?;
    let watchlist = WatchlistStore::open(Arc::new(storage))
        .await
        .map_err(|e| format!("Failed to load watchlist: {}", e))?;

    info!("Using market data from {}", coingecko_config.base_url);
    let source = Arc::new(CoinGeckoConnector::new(coingecko_config));

    let service = Arc::new(DashboardService::new(source, Arc::new(watchlist)));

    // Create CORS middleware
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/v1/markets", get(handler::list_markets))
        .route("/api/v1/markets/current", get(handler::current_markets))
        .route("/api/v1/coins/:id", get(handler::get_coin))
        .route("/api/v1/coins/:id/chart", get(handler::get_chart))
        .route("/api/v1/watchlist", get(handler::get_watchlist))
        .route("/api/v1/watchlist/ids", get(handler::watchlist_ids))
        .route("/api/v1/watchlist/events", get(handler::watchlist_events))
        .route("/api/v1/watchlist/:id/toggle", post(handler::toggle_watchlist))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service);

    let addr: SocketAddr = api_config.socket_addr()?;
    info!("Listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
