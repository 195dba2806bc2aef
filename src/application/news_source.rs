// Source trait for news event search
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::event::NewsEvent;

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Search events for one subject inside the time window. The subject is
    /// assigned by the caller per sub-query, not parsed from the rows. An
    /// empty result means "no events", never an error.
    async fn search(
        &self,
        subject: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<NewsEvent>>;
}
