//! Accept/reject decision for a walk.
//!
//! A walk is kept as an object return ([`Verdict::Cluster`]) when it is dense
//! enough *or* spatially long enough:
//!
//! - `len >= num_points_threshold`, or
//! - `|first − last| >= object_length_threshold` (3-D Euclidean distance
//!   between the walk's endpoints).
//!
//! Everything else is [`Verdict::Noise`].

use crate::layout::ScanView;
use crate::walk::Walk;

/// Outcome of classifying one walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Cluster,
    Noise,
}

/// Threshold-based walk classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterClassifier {
    pub num_points_threshold: usize,
    pub object_length_threshold: f32,
}

impl ClusterClassifier {
    pub fn new(num_points_threshold: usize, object_length_threshold: f32) -> Self {
        Self {
            num_points_threshold,
            object_length_threshold,
        }
    }

    /// Classify `walk`, whose positions index into `ring`.
    pub fn classify(&self, view: &ScanView<'_>, ring: &[usize], walk: Walk) -> Verdict {
        if walk.len() >= self.num_points_threshold {
            return Verdict::Cluster;
        }

        let [x0, y0, z0] = view.point(ring[walk.first]).position();
        let [x1, y1, z1] = view.point(ring[walk.last]).position();
        let (dx, dy, dz) = (x1 - x0, y1 - y0, z1 - z0);
        let length_sq = dx * dx + dy * dy + dz * dz;

        if length_sq >= self.object_length_threshold * self.object_length_threshold {
            Verdict::Cluster
        } else {
            Verdict::Noise
        }
    }
}
