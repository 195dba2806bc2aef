// Price series domain models
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One stored sample: a timestamp and the quotes that were captured with it.
/// An asset missing from `values` was not quoted at that instant - absent,
/// not zero.
#[derive(Debug, Clone)]
pub struct PriceSample {
    pub time: DateTime<Utc>,
    pub values: HashMap<String, f64>,
}

impl PriceSample {
    pub fn new(time: DateTime<Utc>, values: HashMap<String, f64>) -> Self {
        Self { time, values }
    }
}

/// An ordered run of samples for one render pass. Timestamps strictly
/// increase; the constructor sorts and drops duplicate instants so callers
/// can rely on that.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    pub fn new(mut samples: Vec<PriceSample>) -> Self {
        samples.sort_by_key(|s| s.time);
        samples.dedup_by_key(|s| s.time);
        Self { samples }
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// First and last sample timestamps, if any.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        Some((first.time, last.time))
    }

    /// Min and max value over the given assets across all samples.
    /// `None` when no sample carries any of the assets.
    pub fn value_bounds(&self, assets: &[String]) -> Option<(f64, f64)> {
        let mut bounds: Option<(f64, f64)> = None;
        for sample in &self.samples {
            for asset in assets {
                if let Some(value) = sample.values.get(asset) {
                    bounds = Some(match bounds {
                        Some((min, max)) => (min.min(*value), max.max(*value)),
                        None => (*value, *value),
                    });
                }
            }
        }
        bounds
    }
}
