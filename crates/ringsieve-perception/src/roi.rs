//! Region-of-interest predicates for the visibility histogram.
//!
//! The configured [`RoiMode`] is resolved once per configuration snapshot into
//! an [`RoiPredicate`] carrying its bounds, so the per-point test is a single
//! match on a closed set of variants.
//!
//! | Mode | Point counts when | Histogram azimuth range |
//! |------|-------------------|-------------------------|
//! | `Fixed_xyz_ROI` | always | `[0, 36000]` |
//! | `Box_ROI` | strictly inside the [`Aabb`] | `[0, 36000]` |
//! | `Fixed_azimuth_ROI` | `min < azimuth < max` and `distance < max_distance` | `[min, max]` |

use crate::config::{FilterConfig, RoiMode};
use crate::layout::PointRecord;
use crate::walk::FULL_TURN_CDEG;

/// A point in 3-D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// An axis-aligned bounding box, defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    /// Create a bounding box from its two opposite corners.
    ///
    /// The corners are normalised so that `min ≤ max` per axis.
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// True when the point lies strictly inside the box (boundary excluded).
    pub fn contains_interior(&self, p: Point3) -> bool {
        p.x > self.min.x
            && p.x < self.max.x
            && p.y > self.min.y
            && p.y < self.max.y
            && p.z > self.min.z
            && p.z < self.max.z
    }
}

/// A resolved ROI test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoiPredicate {
    /// Every point counts.
    All,
    /// Points strictly inside the box count.
    Box(Aabb),
    /// Points inside the azimuth sector (centidegrees, exclusive) and closer
    /// than `max_distance` count.
    Sector {
        min_azimuth: f32,
        max_azimuth: f32,
        max_distance: f32,
    },
}

impl RoiPredicate {
    /// Resolve the predicate selected by `config.roi_mode`.
    pub fn from_config(config: &FilterConfig) -> Self {
        match config.roi_mode {
            RoiMode::FixedXyz => RoiPredicate::All,
            RoiMode::Box => RoiPredicate::Box(Aabb::new(
                Point3::new(config.x_min, config.y_min, config.z_min),
                Point3::new(config.x_max, config.y_max, config.z_max),
            )),
            RoiMode::Azimuth => RoiPredicate::Sector {
                min_azimuth: config.min_azimuth_deg * 100.0,
                max_azimuth: config.max_azimuth_deg * 100.0,
                max_distance: config.max_distance,
            },
        }
    }

    /// Azimuth interval `[min, max]` (centidegrees) the histogram spans.
    pub fn azimuth_range(&self) -> (f32, f32) {
        match *self {
            RoiPredicate::Sector {
                min_azimuth,
                max_azimuth,
                ..
            } => (min_azimuth, max_azimuth),
            _ => (0.0, FULL_TURN_CDEG),
        }
    }

    /// True when `point` contributes to its histogram bin.
    pub fn accepts(&self, point: &PointRecord<'_>) -> bool {
        match *self {
            RoiPredicate::All => true,
            RoiPredicate::Box(aabb) => {
                aabb.contains_interior(Point3::new(point.x(), point.y(), point.z()))
            }
            RoiPredicate::Sector {
                min_azimuth,
                max_azimuth,
                max_distance,
            } => {
                let azimuth = point.azimuth();
                azimuth > min_azimuth && azimuth < max_azimuth && point.distance() < max_distance
            }
        }
    }
}
