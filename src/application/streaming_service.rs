// Streaming chart service - Progressive loading over chunked JSON
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::application::chart_service::resolve_bounds;
use crate::application::news_source::NewsSource;
use crate::application::price_repository::PriceRepository;
use crate::domain::align::{align, Anchor};
use crate::domain::asset::Asset;
use crate::domain::chart::{PlotMode, SeriesPoint};
use crate::domain::event::NewsEvent;
use crate::domain::identity::IdentityCatalog;
use crate::domain::layout::{compute_layout, OverlayLayout};
use crate::infrastructure::config::Catalog;

/// Messages of the progressive chart protocol, in emission order: skeleton
/// first, one series update per asset as data lands, overlays once news
/// aligns, then a completion event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartStreamMessage {
    Skeleton {
        mode: PlotMode,
        assets: Vec<Asset>,
    },
    SeriesUpdate {
        asset_id: String,
        axis: usize,
        points: Vec<SeriesPoint>,
    },
    OverlayUpdate {
        anchors: Vec<Anchor>,
        layout: Option<OverlayLayout>,
    },
    Complete {
        widgets: usize,
        duration_ms: i64,
    },
}

#[derive(Clone)]
pub struct StreamingChartService {
    repository: Arc<dyn PriceRepository>,
    news: Arc<dyn NewsSource>,
    catalog: Catalog,
    identities: IdentityCatalog,
}

impl StreamingChartService {
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

    pub async fn stream_chart(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        selected_assets: Vec<String>,
        mode: PlotMode,
        with_news: bool,
    ) -> mpsc::Receiver<ChartStreamMessage> {
        let (tx, rx) = mpsc::channel(100);
        let start_time = Instant::now();
        let (start, end) = resolve_bounds(start_date, end_date);

        // 1. Skeleton immediately, so the frontend can paint placeholders.
        let assets: Vec<Asset> = selected_assets
            .iter()
            .map(|id| Asset::new(id.clone(), self.catalog.color_for(id)))
            .collect();
        let _ = tx.send(ChartStreamMessage::Skeleton { mode, assets }).await;

        // 2. The rest runs off the handler task and lands as it completes.
        let repository = self.repository.clone();
        let news = self.news.clone();
        let identities = self.identities.clone();
        let subjects: Vec<String> = self
            .catalog
            .subjects
            .iter()
            .map(|s| s.name.clone())
            .collect();

        tokio::spawn(async move {
            let mut widgets = 0usize;

            let series = match repository.query_range(start, end).await {
                Ok(series) => series,
                Err(e) => {
                    tracing::error!("store range query failed: {}", e);
                    let _ = tx
                        .send(ChartStreamMessage::Complete {
                            widgets,
                            duration_ms: start_time.elapsed().as_millis() as i64,
                        })
                        .await;
                    return;
                }
            };

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

                // Only send if we have data
                if points.is_empty() {
                    continue;
                }

                let axis = match mode {
                    PlotMode::MultiY => i,
                    _ => 0,
                };
                widgets += 1;
                let _ = tx
                    .send(ChartStreamMessage::SeriesUpdate {
                        asset_id: asset_id.clone(),
                        axis,
                        points,
                    })
                    .await;
            }

            let overlays_apply = with_news
                && mode.supports_overlays()
                && !series.is_empty()
                && !selected_assets.is_empty();
            if overlays_apply {
                let events = fetch_events_concurrently(news.as_ref(), &subjects, start, end).await;

                let layout_assets: &[String] = match mode {
                    PlotMode::MultiY => &selected_assets[..1],
                    _ => &selected_assets,
                };
                let layout = compute_layout(&series, layout_assets);
                let anchors = align(&series, &events, &selected_assets, &identities);

                if layout.is_some() {
                    widgets += 1;
                    let _ = tx
                        .send(ChartStreamMessage::OverlayUpdate { anchors, layout })
                        .await;
                }
            }

            let _ = tx
                .send(ChartStreamMessage::Complete {
                    widgets,
                    duration_ms: start_time.elapsed().as_millis() as i64,
                })
                .await;
        });

        rx
    }
}

/// One news search per subject, concurrently; a failed subject degrades to
/// no events for it.
async fn fetch_events_concurrently(
    news: &dyn NewsSource,
    subjects: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<NewsEvent> {
    let searches = subjects
        .iter()
        .map(|subject| async move { (subject.clone(), news.search(subject, start, end).await) });

    let mut events = Vec::new();
    for (subject, result) in join_all(searches).await {
        match result {
            Ok(found) => events.extend(found),
            Err(e) => tracing::warn!("news search failed for {}: {}", subject, e),
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::{PriceSample, PriceSeries};
    use crate::infrastructure::config::{AssetEntry, SubjectEntry};
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct FakeRepository {
        samples: Vec<PriceSample>,
    }

    #[async_trait]
    impl PriceRepository for FakeRepository {
        async fn list_asset_ids(&self) -> anyhow::Result<Vec<String>> {
            Ok(vec!["bitcoin".to_string()])
        }

        async fn query_range(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> anyhow::Result<PriceSeries> {
            Ok(PriceSeries::new(self.samples.clone()))
        }

        async fn append_sample(&self, _sample: &PriceSample) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct FakeNews;

    #[async_trait]
    impl NewsSource for FakeNews {
        async fn search(
            &self,
            subject: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> anyhow::Result<Vec<NewsEvent>> {
            Ok(vec![NewsEvent {
                seen_at: "20250107T153000Z".to_string(),
                subject: subject.to_string(),
                title: Some("Headline".to_string()),
                url: None,
                source_domain: None,
            }])
        }
    }

    fn sample(secs: i64, value: f64) -> PriceSample {
        PriceSample::new(
            Utc.timestamp_opt(secs, 0).unwrap(),
            [("bitcoin".to_string(), value)].into_iter().collect(),
        )
    }

    fn service(samples: Vec<PriceSample>) -> StreamingChartService {
        StreamingChartService::new(
            Arc::new(FakeRepository { samples }),
            Arc::new(FakeNews),
            Catalog {
                assets: vec![AssetEntry {
                    id: "bitcoin".to_string(),
                    color: Some("#F7931A".to_string()),
                }],
                subjects: vec![SubjectEntry {
                    name: "trump".to_string(),
                    icon: "images/round/trump.png".to_string(),
                }],
                default_subject: "trump".to_string(),
            },
        )
    }

    async fn drain(mut rx: mpsc::Receiver<ChartStreamMessage>) -> Vec<ChartStreamMessage> {
        let mut messages = Vec::new();
        while let Some(msg) = rx.recv().await {
            messages.push(msg);
        }
        messages
    }

    #[tokio::test]
    async fn emits_skeleton_series_overlays_complete_in_order() {
        let svc = service(vec![sample(0, 10.0), sample(100, 20.0)]);
        let rx = svc
            .stream_chart(
                None,
                None,
                vec!["bitcoin".to_string()],
                PlotMode::Overlaid,
                true,
            )
            .await;
        let messages = drain(rx).await;

        assert!(matches!(messages[0], ChartStreamMessage::Skeleton { .. }));
        assert!(matches!(messages[1], ChartStreamMessage::SeriesUpdate { .. }));
        assert!(matches!(messages[2], ChartStreamMessage::OverlayUpdate { .. }));
        match &messages[3] {
            ChartStreamMessage::Complete { widgets, .. } => assert_eq!(*widgets, 2),
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_store_still_completes() {
        let svc = service(vec![]);
        let rx = svc
            .stream_chart(
                None,
                None,
                vec!["bitcoin".to_string()],
                PlotMode::Overlaid,
                true,
            )
            .await;
        let messages = drain(rx).await;

        assert!(matches!(messages[0], ChartStreamMessage::Skeleton { .. }));
        assert!(matches!(
            messages.last().unwrap(),
            ChartStreamMessage::Complete { .. }
        ));
        assert!(
            !messages
                .iter()
                .any(|m| matches!(m, ChartStreamMessage::SeriesUpdate { .. }))
        );
    }
}
