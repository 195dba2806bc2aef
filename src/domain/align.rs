// Temporal alignment of news events to price samples
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::event::NewsEvent;
use crate::domain::identity::IdentityCatalog;
use crate::domain::series::{PriceSample, PriceSeries};

/// The visual binding of one event to one matched sample for one asset.
/// Consumed by the renderer together with the overlay layout: the marker sits
/// at (`event_time`, baseline) and the connector drops to (`event_time`,
/// `value`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anchor {
    pub event_time: DateTime<Utc>,
    pub sample_time: DateTime<Utc>,
    pub asset: String,
    pub value: f64,
    pub label: String,
    pub identity: String,
}

/// Match each event to the sample nearest in time and emit one anchor per
/// (event, selected asset) pair where the asset has a value at that sample.
///
/// Events with unparseable timestamps are skipped with a warning; events
/// outside the series span match the boundary sample. Pure: no I/O, no
/// rendering scale baked in.
pub fn align(
    series: &PriceSeries,
    events: &[NewsEvent],
    selected_assets: &[String],
    identities: &IdentityCatalog,
) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    if series.is_empty() || selected_assets.is_empty() {
        return anchors;
    }

    for event in events {
        let event_time = match event.normalized_time() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("skipping news event for '{}': {}", event.subject, e);
                continue;
            }
        };

        let sample = nearest_sample(series, event_time);
        let identity = identities.resolve(&event.subject);

        for asset in selected_assets {
            let Some(value) = sample.values.get(asset) else {
                continue;
            };
            anchors.push(Anchor {
                event_time,
                sample_time: sample.time,
                asset: asset.clone(),
                value: *value,
                label: event.label(),
                identity: identity.id.clone(),
            });
        }
    }

    anchors
}

/// Sample minimizing absolute time distance to `at`. Exactly-equidistant
/// neighbors resolve to the earlier sample.
fn nearest_sample(series: &PriceSeries, at: DateTime<Utc>) -> &PriceSample {
    let samples = series.samples();
    let idx = samples.partition_point(|s| s.time < at);

    if idx == 0 {
        return &samples[0];
    }
    if idx == samples.len() {
        return &samples[idx - 1];
    }

    let before = &samples[idx - 1];
    let after = &samples[idx];
    if at - before.time <= after.time - at {
        before
    } else {
        after
    }
}
