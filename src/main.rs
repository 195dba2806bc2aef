// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use axum::{routing::get, Router};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;

use crate::application::chart_service::ChartService;
use crate::application::collector::PriceCollector;
use crate::application::streaming_service::StreamingChartService;
use crate::infrastructure::coingecko::CoingeckoClient;
use crate::infrastructure::config::{load_catalog, load_service_config};
use crate::infrastructure::gdelt::GdeltNewsSource;
use crate::infrastructure::influx_store::InfluxStore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_chart, health_check, list_assets, stream_chart};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_service_config()?;
    let catalog = load_catalog("config/catalog.toml")?;

    // Create repository and news source (infrastructure layer)
    let repository = Arc::new(InfluxStore::new(
        config.store.host,
        config.store.token,
        config.store.database,
        config.store.retention_policy,
        config.store.measurement,
    ));
    let news = Arc::new(GdeltNewsSource::new(&config.news));

    // Optionally run the background price collector in-process
    if config.collector.enabled {
        let quotes = Arc::new(CoingeckoClient::new(&config.collector)?);
        let collector = PriceCollector::new(
            repository.clone(),
            quotes,
            catalog.asset_ids(),
            Duration::from_secs(config.collector.period_secs),
        );
        tokio::spawn(collector.run());
    }

    // Create services (application layer)
    let chart_service = ChartService::new(repository.clone(), news.clone(), catalog.clone());
    let streaming_service = StreamingChartService::new(repository, news, catalog);

    // Create application state
    let state = Arc::new(AppState {
        chart_service,
        streaming_service,
    });

    // Build router (presentation layer)
    // Note: We handle compression manually in our response builders,
    // so we don't use CompressionLayer to avoid double compression/decompression
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/assets", get(list_assets))
        .route("/chart", get(get_chart))
        .route("/chart/stream", get(stream_chart))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    println!("Starting crypto-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
