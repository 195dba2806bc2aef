// Chart service - Use case for building one render pass
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use crate::application::news_source::NewsSource;
use crate::application::price_repository::PriceRepository;
use crate::domain::align::align;
use crate::domain::asset::Asset;
use crate::domain::chart::{AssetSeries, ChartView, PlotMode, SeriesPoint};
use crate::domain::event::NewsEvent;
use crate::domain::identity::IdentityCatalog;
use crate::domain::layout::compute_layout;
use crate::domain::series::PriceSeries;
use crate::infrastructure::config::Catalog;

/// Store convention for day ranges: noon of the start date through 12:59:59
/// on the end date, both UTC.
pub fn day_range_bounds(start_date: NaiveDate, end_date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&start_date.and_hms_opt(12, 0, 0).expect("valid time"));
    let end = Utc.from_utc_datetime(&end_date.and_hms_opt(12, 59, 59).expect("valid time"));
    (start, end)
}

/// Absent dates default to the trailing 24 hours.
pub fn resolve_bounds(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match (start_date, end_date) {
        (Some(start), Some(end)) => day_range_bounds(start, end),
        _ => {
            let now = Utc::now();
            (now - Duration::hours(24), now)
        }
    }
}

#[derive(Clone)]
pub struct ChartService {
    repository: Arc<dyn PriceRepository>,
    news: Arc<dyn NewsSource>,
    catalog: Catalog,
    identities: IdentityCatalog,
}

impl ChartService {
    pub fn new(
        repository: Arc<dyn PriceRepository>,
        news: Arc<dyn NewsSource>,
        catalog: Catalog,
    ) -> Self {
        let identities = catalog.identity_catalog();
        Self {
            repository,
            news,
            catalog,
            identities,
        }
    }

    pub async fn list_assets(&self) -> anyhow::Result<Vec<Asset>> {
        let ids = self.repository.list_asset_ids().await?;
        Ok(ids
            .into_iter()
            .map(|id| {
                let color = self.catalog.color_for(&id);
                Asset::new(id, color)
            })
            .collect())
    }

    /// One full alignment/render pass: query the store, fetch news, align,
    /// compute layout. An empty store result renders as an empty chart, not
    /// an error.
    pub async fn get_chart(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        selected_assets: &[String],
        mode: PlotMode,
        with_news: bool,
    ) -> anyhow::Result<ChartView> {
        if selected_assets.is_empty() {
            return Ok(ChartView::empty(mode));
        }

        let (start, end) = resolve_bounds(start_date, end_date);
        let series = self.repository.query_range(start, end).await?;
        tracing::debug!("range query returned {} samples", series.len());
        if series.is_empty() {
            return Ok(ChartView::empty(mode));
        }

        let asset_series = self.build_asset_series(&series, selected_assets, mode);

        let mut anchors = Vec::new();
        let mut overlay_layout = None;
        if with_news && mode.supports_overlays() {
            let events = self.fetch_events(start, end).await;
            overlay_layout = compute_layout(&series, layout_assets(selected_assets, mode));
            anchors = align(&series, &events, selected_assets, &self.identities);
        }

        Ok(ChartView {
            mode,
            series: asset_series,
            anchors,
            overlay_layout,
        })
    }

    fn build_asset_series(
        &self,
        series: &PriceSeries,
        selected_assets: &[String],
        mode: PlotMode,
    ) -> Vec<AssetSeries> {
        let mut out = Vec::new();
        for (i, asset_id) in selected_assets.iter().enumerate() {
            let points: Vec<SeriesPoint> = series
                .samples()
                .iter()
                .filter_map(|sample| {
                    sample.values.get(asset_id).map(|value| SeriesPoint {
                        time: sample.time,
                        value: *value,
                    })
                })
                .collect();

            // Selected asset absent from the whole range: no line for it.
            if points.is_empty() {
                continue;
            }

            let axis = match mode {
                PlotMode::MultiY => i,
                _ => 0,
            };
            out.push(AssetSeries {
                asset: Asset::new(asset_id.clone(), self.catalog.color_for(asset_id)),
                axis,
                points,
            });
        }
        out
    }

    async fn fetch_events(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<NewsEvent> {
        let mut events = Vec::new();
        for subject in &self.catalog.subjects {
            match self.news.search(&subject.name, start, end).await {
                Ok(found) => events.extend(found),
                Err(e) => {
                    // Degrade to no overlays for this subject.
                    eprintln!("Error fetching news for {}: {}", subject.name, e);
                }
            }
        }
        events
    }
}

/// Multi-Y charts anchor overlays against the first selected asset's range;
/// single-axis charts use the range across the whole selection.
fn layout_assets(selected_assets: &[String], mode: PlotMode) -> &[String] {
    match mode {
        PlotMode::MultiY => &selected_assets[..1],
        _ => selected_assets,
    }
}
