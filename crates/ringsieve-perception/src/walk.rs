//! Segmentation of one ring into walks.
//!
//! A *walk* is a maximal run of consecutive points in a ring whose neighbours
//! are geometrically continuous:
//!
//! ```text
//! azimuth gap  = (next.azimuth − current.azimuth) mod 36000   < 100 cdeg
//! range test   = max(d_c, d_n) < min(d_c, d_n) · distance_ratio
//! ```
//!
//! The walks produced for a ring partition it: every position appears in
//! exactly one walk, in order.

use crate::layout::{PointRecord, ScanView};

/// One full sensor revolution in centidegrees.
pub const FULL_TURN_CDEG: f32 = 36000.0;

/// Largest azimuth step (exclusive, centidegrees) between two points of one
/// walk.
pub const MAX_AZIMUTH_STEP_CDEG: f32 = 100.0;

/// An inclusive range `[first, last]` of positions within one ring's index
/// list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walk {
    pub first: usize,
    pub last: usize,
}

impl Walk {
    /// Number of points in the walk.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// Always false: a walk holds at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The walk's positions.
    pub fn positions(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// Forward azimuth gap from `current` to `next`, corrected for wrap-around.
pub fn azimuth_gap(current: f32, next: f32) -> f32 {
    let diff = next - current;
    if diff < 0.0 { diff + FULL_TURN_CDEG } else { diff }
}

/// True when two ranges are within the multiplicative `ratio` of each other.
pub fn ranges_similar(a: f32, b: f32, ratio: f32) -> bool {
    a.max(b) < a.min(b) * ratio
}

/// True when `next` continues the walk that `current` belongs to.
pub fn continues(current: &PointRecord<'_>, next: &PointRecord<'_>, distance_ratio: f32) -> bool {
    ranges_similar(current.distance(), next.distance(), distance_ratio)
        && azimuth_gap(current.azimuth(), next.azimuth()) < MAX_AZIMUTH_STEP_CDEG
}

/// Iterator over the walks of one ring.
///
/// Rings holding fewer than two points yield nothing.
///
/// ```
/// use ringsieve_perception::layout::ScanView;
/// use ringsieve_perception::sensor::{SensorPoint, encode_sensor_cloud};
/// use ringsieve_perception::walk::{Walk, Walks};
///
/// let cloud = encode_sensor_cloud("lidar", &[
///     SensorPoint::polar(0, 100.0, 5.0),
///     SensorPoint::polar(0, 150.0, 5.0),
///     SensorPoint::polar(0, 5000.0, 5.0),
/// ], false);
/// let view = ScanView::new(&cloud).unwrap();
/// let walks: Vec<Walk> = Walks::new(&view, &[0, 1, 2], 1.03).collect();
/// assert_eq!(walks, vec![Walk { first: 0, last: 1 }, Walk { first: 2, last: 2 }]);
/// ```
#[derive(Debug)]
pub struct Walks<'v, 'a> {
    view: &'v ScanView<'a>,
    ring: &'v [usize],
    distance_ratio: f32,
    next_first: usize,
}

impl<'v, 'a> Walks<'v, 'a> {
    pub fn new(view: &'v ScanView<'a>, ring: &'v [usize], distance_ratio: f32) -> Self {
        // Short rings are skipped outright.
        let next_first = if ring.len() < 2 { ring.len() } else { 0 };
        Self {
            view,
            ring,
            distance_ratio,
            next_first,
        }
    }
}

impl Iterator for Walks<'_, '_> {
    type Item = Walk;

    fn next(&mut self) -> Option<Walk> {
        let first = self.next_first;
        if first >= self.ring.len() {
            return None;
        }

        let mut last = first;
        let mut current = self.view.point(self.ring[last]);
        while last + 1 < self.ring.len() {
            let next = self.view.point(self.ring[last + 1]);
            if !continues(&current, &next, self.distance_ratio) {
                break;
            }
            current = next;
            last += 1;
        }

        self.next_first = last + 1;
        Some(Walk { first, last })
    }
}
