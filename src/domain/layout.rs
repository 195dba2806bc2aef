// Overlay geometry derived from the series' own scale
use serde::Serialize;

use crate::domain::series::PriceSeries;

// Marker row sits this fraction of the value range above the series maximum.
const VERTICAL_OFFSET_FRACTION: f64 = 0.15;
// Marker width as a fraction of the visible time span.
const WIDTH_FRACTION: f64 = 0.015;
// Marker height as a fraction of the value range.
const HEIGHT_FRACTION: f64 = 0.08;
// Substitute range for a flat series: proportional to the magnitude, floored.
const FLAT_RANGE_FRACTION: f64 = 1e-3;
const MIN_VALUE_RANGE: f64 = 1e-6;
// Marker width when the series has a single sample (zero time span).
const MIN_WIDTH_MS: f64 = 60_000.0;

/// Scale-derived geometry for one render pass. Recomputed when the series or
/// the asset selection changes; independent of which events are active.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayLayout {
    /// Distance between the series maximum and the marker row.
    pub vertical_offset: f64,
    /// Y coordinate of the marker row.
    pub marker_baseline_y: f64,
    /// Marker width in x-axis milliseconds.
    pub overlay_width_ms: f64,
    /// Marker height in value units.
    pub overlay_height: f64,
}

impl OverlayLayout {
    /// Where the dashed connector starts: the marker's bottom edge (markers
    /// are centered on the baseline).
    pub fn connector_top_y(&self) -> f64 {
        self.marker_baseline_y - self.overlay_height / 2.0
    }
}

/// Derive overlay geometry from the selected assets' value range and the
/// series' time span, so markers stay proportionate at any zoom or
/// magnitude. `None` only when the series carries no values for the
/// selection.
pub fn compute_layout(series: &PriceSeries, selected_assets: &[String]) -> Option<OverlayLayout> {
    let (min, max) = series.value_bounds(selected_assets)?;
    let (first, last) = series.time_span()?;

    let mut value_range = max - min;
    if value_range <= 0.0 {
        value_range = (max.abs() * FLAT_RANGE_FRACTION).max(MIN_VALUE_RANGE);
    }

    let span_ms = (last - first).num_milliseconds() as f64;
    let overlay_width_ms = if span_ms > 0.0 {
        span_ms * WIDTH_FRACTION
    } else {
        MIN_WIDTH_MS
    };

    let vertical_offset = value_range * VERTICAL_OFFSET_FRACTION;
    Some(OverlayLayout {
        vertical_offset,
        marker_baseline_y: max + vertical_offset,
        overlay_width_ms,
        overlay_height: value_range * HEIGHT_FRACTION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::PriceSample;
    use chrono::{TimeZone, Utc};

    fn sample(secs: i64, values: &[(&str, f64)]) -> PriceSample {
        PriceSample::new(
            Utc.timestamp_opt(secs, 0).unwrap(),
            values
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        )
    }

    fn assets(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn scales_with_value_range_and_time_span() {
        let series = PriceSeries::new(vec![
            sample(0, &[("a", 10.0)]),
            sample(100, &[("a", 20.0)]),
            sample(200, &[("a", 15.0)]),
        ]);

        let layout = compute_layout(&series, &assets(&["a"])).unwrap();
        assert_eq!(layout.vertical_offset, 10.0 * 0.15);
        assert_eq!(layout.marker_baseline_y, 20.0 + 10.0 * 0.15);
        assert_eq!(layout.overlay_width_ms, 200_000.0 * 0.015);
        assert_eq!(layout.overlay_height, 10.0 * 0.08);
    }

    #[test]
    fn connector_hangs_from_marker_bottom_edge() {
        let series = PriceSeries::new(vec![
            sample(0, &[("a", 10.0)]),
            sample(100, &[("a", 20.0)]),
        ]);

        let layout = compute_layout(&series, &assets(&["a"])).unwrap();
        assert_eq!(
            layout.connector_top_y(),
            layout.marker_baseline_y - layout.overlay_height / 2.0
        );
        assert!(layout.connector_top_y() > 20.0);
    }

    #[test]
    fn flat_series_substitutes_positive_epsilon() {
        let series = PriceSeries::new(vec![
            sample(0, &[("a", 50.0)]),
            sample(100, &[("a", 50.0)]),
        ]);

        let layout = compute_layout(&series, &assets(&["a"])).unwrap();
        let epsilon = 50.0 * 1e-3;
        assert!(layout.overlay_height > 0.0);
        assert!(layout.overlay_width_ms > 0.0);
        assert_eq!(layout.marker_baseline_y, 50.0 + epsilon * 0.15);
        // The marker row must sit above the line, not on it.
        assert!(layout.marker_baseline_y > 50.0);
    }

    #[test]
    fn all_zero_series_still_gets_positive_geometry() {
        let series = PriceSeries::new(vec![
            sample(0, &[("a", 0.0)]),
            sample(100, &[("a", 0.0)]),
        ]);

        let layout = compute_layout(&series, &assets(&["a"])).unwrap();
        assert!(layout.overlay_height > 0.0);
        assert!(layout.marker_baseline_y > 0.0);
    }

    #[test]
    fn single_sample_series_uses_fallback_width() {
        let series = PriceSeries::new(vec![sample(0, &[("a", 5.0)])]);
        let layout = compute_layout(&series, &assets(&["a"])).unwrap();
        assert_eq!(layout.overlay_width_ms, 60_000.0);
    }

    #[test]
    fn selection_change_changes_layout() {
        let series = PriceSeries::new(vec![
            sample(0, &[("a", 10.0), ("b", 100.0)]),
            sample(100, &[("a", 20.0), ("b", 300.0)]),
        ]);

        let narrow = compute_layout(&series, &assets(&["a"])).unwrap();
        let wide = compute_layout(&series, &assets(&["a", "b"])).unwrap();
        assert_ne!(narrow, wide);
        assert_eq!(wide.marker_baseline_y, 300.0 + (300.0 - 10.0) * 0.15);
    }

    #[test]
    fn empty_series_or_selection_yields_none() {
        let series = PriceSeries::new(vec![sample(0, &[("a", 5.0)])]);
        assert!(compute_layout(&PriceSeries::default(), &assets(&["a"])).is_none());
        assert!(compute_layout(&series, &[]).is_none());
        assert!(compute_layout(&series, &assets(&["missing"])).is_none());
    }
}
