//! Per-ring bucketing of a scan.
//!
//! [`RingTable::build`] walks the scan once and appends each record index to
//! the bucket of its ring, so every bucket preserves scan (azimuth) order.
//! Buckets are reserved up front and never grow past `max_points_per_ring`.
//!
//! Two per-point conditions are handled here rather than failing the scan:
//! - ring id `>= max_rings`: the point is skipped,
//! - bucket already full: the point is dropped.
//!
//! Both are counted in [`BucketStats`] and reported with a single warning per
//! scan.

use tracing::warn;

use crate::layout::ScanView;

/// Points the bucketizer did not place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketStats {
    /// Points whose ring id was out of range.
    pub skipped_ring: usize,
    /// Points dropped because their ring bucket was full.
    pub dropped_capacity: usize,
}

/// Record indices grouped by ring id, in scan order.
#[derive(Debug)]
pub struct RingTable {
    rings: Vec<Vec<usize>>,
}

impl RingTable {
    /// Empty table with `max_rings` buckets of `max_points_per_ring` capacity.
    pub fn with_capacity(max_rings: u16, max_points_per_ring: usize) -> Self {
        let rings = (0..max_rings)
            .map(|_| Vec::with_capacity(max_points_per_ring))
            .collect();
        Self { rings }
    }

    /// Bucket every record of `view`.
    pub fn build(
        view: &ScanView<'_>,
        max_rings: u16,
        max_points_per_ring: usize,
    ) -> (Self, BucketStats) {
        // A ring can never hold more points than the scan has.
        let mut table = Self::with_capacity(max_rings, max_points_per_ring.min(view.len()));
        let mut stats = BucketStats::default();
        let mut first_bad_ring = None;
        let mut first_full_ring = None;

        for (index, point) in view.points().enumerate() {
            let ring = point.ring();
            let Some(bucket) = table.rings.get_mut(ring as usize) else {
                stats.skipped_ring += 1;
                first_bad_ring.get_or_insert(ring);
                continue;
            };
            if bucket.len() >= max_points_per_ring {
                stats.dropped_capacity += 1;
                first_full_ring.get_or_insert(ring);
                continue;
            }
            bucket.push(index);
        }

        if let Some(ring) = first_bad_ring {
            warn!(
                skipped = stats.skipped_ring,
                first_ring = ring,
                max_rings,
                "skipping points with out-of-range ring id"
            );
        }
        if let Some(ring) = first_full_ring {
            warn!(
                dropped = stats.dropped_capacity,
                first_ring = ring,
                max_points_per_ring,
                "ring capacity exceeded; dropping excess points"
            );
        }

        (table, stats)
    }

    /// Number of ring buckets (`max_rings`).
    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Record indices of `ring`, or an empty slice for an unknown ring.
    pub fn ring(&self, ring: u16) -> &[usize] {
        self.rings
            .get(ring as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over `(ring id, indices)` for every bucket, empty ones included.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &[usize])> {
        self.rings
            .iter()
            .enumerate()
            .map(|(ring, indices)| (ring as u16, indices.as_slice()))
    }

    /// Total number of bucketed points.
    pub fn len(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
