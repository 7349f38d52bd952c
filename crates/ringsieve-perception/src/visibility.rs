//! Polar-histogram visibility estimator.
//!
//! Each scan is binned into a `vertical_bins × HORIZONTAL_BINS` grid: the row
//! is the point's ring id, the column its azimuth sector within the ROI's
//! azimuth range.  Only points accepted by the [`RoiPredicate`] are counted,
//! and counts saturate at 255.
//!
//! A cell is *filled* when its count exceeds `noise_threshold`.  The score is
//!
//! ```text
//! visibility = 1 − filled / (vertical_bins × HORIZONTAL_BINS)
//! ```
//!
//! so an empty scan is fully visible (1.0) and a scan that saturates every
//! cell is fully obscured (0.0).

use ringsieve_types::CloudHeader;
use tracing::debug;

use crate::layout::ScanView;
use crate::roi::RoiPredicate;

/// Azimuth sectors per ring (10° each over a full turn).
pub const HORIZONTAL_BINS: usize = 36;

/// Occupancy cell value for a filled cell.
pub const FILLED: u8 = 255;

/// Grid and score for one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityReport {
    pub header: CloudHeader,
    pub vertical_bins: usize,
    pub horizontal_bins: usize,
    /// Row-major occupancy grid, one byte per cell: [`FILLED`] or 0.
    pub occupancy: Vec<u8>,
    pub filled_cells: usize,
    /// Fraction of cells not flagged, in `[0, 1]`.
    pub visibility: f32,
}

impl VisibilityReport {
    /// Occupancy value at (`ring`, `sector`).
    pub fn cell(&self, ring: usize, sector: usize) -> u8 {
        self.occupancy[ring * self.horizontal_bins + sector]
    }
}

/// Histogram builder parameterised by one configuration snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityHistogram {
    pub vertical_bins: usize,
    pub noise_threshold: u8,
    pub roi: RoiPredicate,
}

impl VisibilityHistogram {
    pub fn new(vertical_bins: usize, noise_threshold: u8, roi: RoiPredicate) -> Self {
        Self {
            vertical_bins,
            noise_threshold,
            roi,
        }
    }

    /// Saturating per-cell counts, row-major.
    pub fn counts(&self, view: &ScanView<'_>) -> Vec<u8> {
        let mut grid = vec![0u8; self.vertical_bins * HORIZONTAL_BINS];
        let (min_azimuth, max_azimuth) = self.roi.azimuth_range();
        let resolution = (max_azimuth - min_azimuth) / HORIZONTAL_BINS as f32;
        let mut outside_rows = 0usize;

        for point in view.points() {
            let row = point.ring() as usize;
            if row >= self.vertical_bins {
                outside_rows += 1;
                continue;
            }
            let azimuth = point.azimuth();
            if !azimuth.is_finite() {
                continue;
            }
            let azimuth = azimuth.max(0.0);
            if azimuth < min_azimuth || azimuth > max_azimuth {
                continue;
            }
            if !self.roi.accepts(&point) {
                continue;
            }
            let column = (((azimuth - min_azimuth) / resolution) as usize).min(HORIZONTAL_BINS - 1);
            let cell = &mut grid[row * HORIZONTAL_BINS + column];
            *cell = cell.saturating_add(1);
        }

        if outside_rows > 0 {
            debug!(
                points = outside_rows,
                vertical_bins = self.vertical_bins,
                "ring ids beyond the visibility grid were not counted"
            );
        }
        grid
    }

    /// Build the occupancy grid and visibility score for `view`.
    pub fn evaluate(&self, view: &ScanView<'_>, header: CloudHeader) -> VisibilityReport {
        let occupancy: Vec<u8> = self
            .counts(view)
            .into_iter()
            .map(|count| if count > self.noise_threshold { FILLED } else { 0 })
            .collect();
        let filled_cells = occupancy.iter().filter(|&&cell| cell == FILLED).count();
        let total = occupancy.len();
        let visibility = if total == 0 {
            1.0
        } else {
            1.0 - filled_cells as f32 / total as f32
        };

        VisibilityReport {
            header,
            vertical_bins: self.vertical_bins,
            horizontal_bins: HORIZONTAL_BINS,
            occupancy,
            filled_cells,
            visibility: visibility.clamp(0.0, 1.0),
        }
    }
}
