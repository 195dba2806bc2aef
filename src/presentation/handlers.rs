// HTTP request handlers
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::asset::Asset;
use crate::domain::chart::PlotMode;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::json_response;
use crate::presentation::app_state::AppState;

#[derive(Deserialize)]
pub struct ChartQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Comma-separated asset ids.
    pub assets: Option<String>,
    pub mode: Option<PlotMode>,
    pub news: Option<bool>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List assets present in the store, enriched from the catalog
pub async fn list_assets(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);

    match state.chart_service.list_assets().await {
        Ok(assets) => match json_response(&assets, compress).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => {
            eprintln!("Error fetching assets: {}", e);
            // Return empty list on error
            match json_response(&Vec::<Asset>::new(), compress).await {
                Ok(response) => response,
                Err(status) => status.into_response(),
            }
        }
    }
}

/// Build the full chart view for one render pass
pub async fn get_chart(
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let assets = parse_asset_list(query.assets.as_deref());
    let mode = query.mode.unwrap_or_default();
    let with_news = query.news.unwrap_or(true);

    match state
        .chart_service
        .get_chart(query.start_date, query.end_date, &assets, mode, with_news)
        .await
    {
        Ok(view) => match json_response(&view, compress).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => {
            eprintln!("Error building chart: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": "store query failed" })),
            )
                .into_response()
        }
    }
}

/// Stream the chart progressively (skeleton, series, overlays, complete)
pub async fn stream_chart(
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let assets = parse_asset_list(query.assets.as_deref());
    let mode = query.mode.unwrap_or_default();
    let with_news = query.news.unwrap_or(true);

    let rx = state
        .streaming_service
        .stream_chart(query.start_date, query.end_date, assets, mode, with_news)
        .await;
    stream_from_receiver(rx, compress).await
}

// Check if the client accepts Brotli compression
fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get("accept-encoding")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

fn parse_asset_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}
