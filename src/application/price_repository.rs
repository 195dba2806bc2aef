// Repository trait for price series access
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::series::{PriceSample, PriceSeries};

#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// List the asset ids present in the store.
    async fn list_asset_ids(&self) -> anyhow::Result<Vec<String>>;

    /// Range query by absolute time bounds, inclusive on both ends.
    /// Returns an empty series when the range holds no samples.
    async fn query_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<PriceSeries>;

    /// Append one sample (the collector's write path).
    async fn append_sample(&self, sample: &PriceSample) -> anyhow::Result<()>;
}
