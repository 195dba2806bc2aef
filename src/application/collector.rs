// Background price collector - scheduled fetch, transform, store
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::application::price_repository::PriceRepository;
use crate::domain::series::PriceSample;

const FETCH_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(10);

/// Source of spot quotes for a set of asset ids.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(&self, asset_ids: &[String]) -> anyhow::Result<HashMap<String, f64>>;
}

/// Polls the quote API on a fixed period and appends one sample per cycle.
/// A failed fetch retries a few times, then the cycle is skipped; the store
/// keeps whatever cadence the quote API allows.
pub struct PriceCollector {
    repository: Arc<dyn PriceRepository>,
    quotes: Arc<dyn QuoteSource>,
    asset_ids: Vec<String>,
    period: Duration,
    retry_delay: Duration,
}

impl PriceCollector {
    pub fn new(
        repository: Arc<dyn PriceRepository>,
        quotes: Arc<dyn QuoteSource>,
        asset_ids: Vec<String>,
        period: Duration,
    ) -> Self {
        Self {
            repository,
            quotes,
            asset_ids,
            period,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Run the collector loop. Call from `tokio::spawn`.
    pub async fn run(self) {
        info!(period_secs = self.period.as_secs(), "price collector started");

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.collect_once().await {
                error!("price collection cycle failed: {}", e);
            }
        }
    }

    async fn collect_once(&self) -> anyhow::Result<()> {
        let quotes = self.fetch_with_retry().await?;
        if quotes.is_empty() {
            warn!("quote API returned no prices; skipping cycle");
            return Ok(());
        }

        let sample = PriceSample::new(Utc::now(), quotes);
        self.repository.append_sample(&sample).await?;
        info!(assets = sample.values.len(), "stored price sample");
        Ok(())
    }

    async fn fetch_with_retry(&self) -> anyhow::Result<HashMap<String, f64>> {
        let mut last_err = None;
        for attempt in 1..=FETCH_ATTEMPTS {
            match self.quotes.fetch_quotes(&self.asset_ids).await {
                Ok(quotes) => return Ok(quotes),
                Err(e) => {
                    warn!(attempt, "quote fetch failed: {}", e);
                    last_err = Some(e);
                    if attempt < FETCH_ATTEMPTS {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("quote fetch failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingRepository {
        samples: Mutex<Vec<PriceSample>>,
    }

    #[async_trait]
    impl PriceRepository for RecordingRepository {
        async fn list_asset_ids(&self) -> anyhow::Result<Vec<String>> {
            Ok(vec![])
        }

        async fn query_range(
            &self,
            _start: chrono::DateTime<Utc>,
            _end: chrono::DateTime<Utc>,
        ) -> anyhow::Result<crate::domain::series::PriceSeries> {
            Ok(crate::domain::series::PriceSeries::default())
        }

        async fn append_sample(&self, sample: &PriceSample) -> anyhow::Result<()> {
            self.samples.lock().unwrap().push(sample.clone());
            Ok(())
        }
    }

    struct FlakyQuotes {
        failures_before_success: Mutex<u32>,
    }

    #[async_trait]
    impl QuoteSource for FlakyQuotes {
        async fn fetch_quotes(
            &self,
            asset_ids: &[String],
        ) -> anyhow::Result<HashMap<String, f64>> {
            let mut remaining = self.failures_before_success.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                anyhow::bail!("simulated quote outage");
            }
            Ok(asset_ids.iter().map(|id| (id.clone(), 42.0)).collect())
        }
    }

    fn collector(failures: u32) -> (PriceCollector, Arc<RecordingRepository>) {
        let repository = Arc::new(RecordingRepository {
            samples: Mutex::new(Vec::new()),
        });
        let collector = PriceCollector {
            repository: repository.clone(),
            quotes: Arc::new(FlakyQuotes {
                failures_before_success: Mutex::new(failures),
            }),
            asset_ids: vec!["bitcoin".to_string()],
            period: Duration::from_secs(300),
            retry_delay: Duration::from_millis(1),
        };
        (collector, repository)
    }

    #[tokio::test]
    async fn stores_one_sample_per_cycle() {
        let (collector, repository) = collector(0);
        collector.collect_once().await.unwrap();

        let stored = repository.samples.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].values.get("bitcoin"), Some(&42.0));
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let (collector, repository) = collector(2);
        collector.collect_once().await.unwrap();
        assert_eq!(repository.samples.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_exhausting_attempts() {
        let (collector, repository) = collector(5);
        assert!(collector.collect_once().await.is_err());
        assert!(repository.samples.lock().unwrap().is_empty());
    }
}
