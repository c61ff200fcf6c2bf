//! Zoom-to-resolution selection and the per-resolution tuning table.
//!
//! Every row picks a padding and a grid cell size so that one cache grid cell
//! holds roughly 40-60 hexes at mid latitudes, whatever the resolution.

use crate::core::constants::COARSEST_DISPLAY_RESOLUTION;
use h3o::Resolution;
use serde::{Deserialize, Serialize};

/// Tuning for a single display resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionTuning {
    pub resolution: Resolution,
    /// Largest zoom span (exclusive) still rendered at this resolution
    pub max_span: f64,
    /// Degrees added around a query window to avoid edge gaps
    pub padding_deg: f64,
    /// Degrees per side of one cache grid cell
    pub cell_size_deg: f64,
}

impl ResolutionTuning {
    pub const fn new(
        resolution: Resolution,
        max_span: f64,
        padding_deg: f64,
        cell_size_deg: f64,
    ) -> Self {
        Self {
            resolution,
            max_span,
            padding_deg,
            cell_size_deg,
        }
    }
}

/// Finest first. The coarsest row's `max_span` is unbounded.
pub const DEFAULT_TUNING: [ResolutionTuning; 7] = [
    ResolutionTuning::new(Resolution::Ten, 0.02, 0.001, 0.01),
    ResolutionTuning::new(Resolution::Nine, 0.05, 0.0025, 0.025),
    ResolutionTuning::new(Resolution::Eight, 0.15, 0.006, 0.06),
    ResolutionTuning::new(Resolution::Seven, 0.4, 0.016, 0.16),
    ResolutionTuning::new(Resolution::Six, 1.2, 0.045, 0.45),
    ResolutionTuning::new(Resolution::Five, 3.5, 0.12, 1.2),
    ResolutionTuning::new(Resolution::Four, f64::MAX, 0.3, 3.0),
];

/// Maps an angular span to a display resolution and its tuning row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSelector {
    table: Vec<ResolutionTuning>,
}

impl ResolutionSelector {
    /// Builds a selector from rows ordered finest first with ascending spans
    pub fn new(mut table: Vec<ResolutionTuning>) -> Self {
        table.sort_by(|a, b| b.resolution.cmp(&a.resolution));
        Self { table }
    }

    /// Picks the finest resolution whose threshold is strictly greater than
    /// `span`, so a span sitting exactly on a threshold resolves coarse.
    ///
    /// Callers must reject spans that are not finite and positive.
    pub fn select(&self, span: f64) -> Resolution {
        self.table
            .iter()
            .find(|row| span < row.max_span)
            .or_else(|| self.table.last())
            .map(|row| row.resolution)
            .unwrap_or(COARSEST_DISPLAY_RESOLUTION)
    }

    /// Tuning for `resolution`; resolutions outside the table use the coarsest row
    pub fn tuning(&self, resolution: Resolution) -> ResolutionTuning {
        self.table
            .iter()
            .find(|row| row.resolution == resolution)
            .or_else(|| self.table.last())
            .copied()
            .unwrap_or(DEFAULT_TUNING[DEFAULT_TUNING.len() - 1])
    }

    pub fn padding(&self, resolution: Resolution) -> f64 {
        self.tuning(resolution).padding_deg
    }

    pub fn cell_size(&self, resolution: Resolution) -> f64 {
        self.tuning(resolution).cell_size_deg
    }
}

impl Default for ResolutionSelector {
    fn default() -> Self {
        Self::new(DEFAULT_TUNING.to_vec())
    }
}
