// Chart view models handed to the renderer
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::align::Anchor;
use crate::domain::asset::Asset;
use crate::domain::layout::OverlayLayout;

/// How the frontend lays the selected assets out. News overlays attach in
/// the overlaid modes only; separated subplots render without them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotMode {
    #[default]
    Overlaid,
    MultiY,
    Separated,
}

impl PlotMode {
    pub fn supports_overlays(&self) -> bool {
        !matches!(self, PlotMode::Separated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// One asset's line. `axis` is 0 except in multi-Y mode, where each asset
/// gets its own axis in selection order.
#[derive(Debug, Clone, Serialize)]
pub struct AssetSeries {
    pub asset: Asset,
    pub axis: usize,
    pub points: Vec<SeriesPoint>,
}

/// Everything the renderer needs for one pass: lines, news anchors, and the
/// overlay geometry they share.
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub mode: PlotMode,
    pub series: Vec<AssetSeries>,
    pub anchors: Vec<Anchor>,
    pub overlay_layout: Option<OverlayLayout>,
}

impl ChartView {
    pub fn empty(mode: PlotMode) -> Self {
        Self {
            mode,
            series: Vec::new(),
            anchors: Vec::new(),
            overlay_layout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_mode_round_trips_snake_case() {
        assert_eq!(
            serde_json::from_str::<PlotMode>("\"multi_y\"").unwrap(),
            PlotMode::MultiY
        );
        assert_eq!(serde_json::to_string(&PlotMode::Overlaid).unwrap(), "\"overlaid\"");
    }

    #[test]
    fn separated_mode_drops_overlays() {
        assert!(PlotMode::Overlaid.supports_overlays());
        assert!(PlotMode::MultiY.supports_overlays());
        assert!(!PlotMode::Separated.supports_overlays());
    }
}
