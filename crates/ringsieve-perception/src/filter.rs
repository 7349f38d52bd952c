//! [`RingOutlierFilter`] – the per-scan pipeline.
//!
//! One call to [`RingOutlierFilter::filter`] runs, in order:
//!
//! 1. [`ScanView::new`] – validate the field layout (fatal on error),
//! 2. [`RingTable::build`] – bucket points by ring,
//! 3. [`Walks`] – segment each ring,
//! 4. [`ClusterClassifier`] – accept or reject each walk,
//! 5. [`OutputAssembler`] – write accepted (and optionally rejected) points,
//! 6. [`VisibilityHistogram`] – only when noise output is enabled.
//!
//! Parameters live in a [`SharedConfig`]: a versioned, immutable
//! [`ConfigSnapshot`] behind an `Arc`.  A scan clones the `Arc` once at its
//! start and reads only that snapshot, so [`SharedConfig::update`] never blocks
//! on, or changes the parameters of, a scan in flight.
//!
//! # Example
//!
//! ```
//! use ringsieve_perception::{FilterConfig, RingOutlierFilter};
//! use ringsieve_perception::sensor::{SensorPoint, encode_sensor_cloud};
//!
//! let filter = RingOutlierFilter::new(FilterConfig::default()).unwrap();
//! let points: Vec<_> = (0..8).map(|i| SensorPoint::polar(0, i as f32 * 50.0, 5.0)).collect();
//! let scan = encode_sensor_cloud("lidar", &points, false);
//!
//! let out = filter.filter(&scan, None).unwrap();
//! assert_eq!(out.points.width, 8);
//! assert!(out.noise.is_none());
//! ```

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use ringsieve_types::{PointCloud, SieveError};
use tracing::debug;

use crate::assembler::OutputAssembler;
use crate::classifier::{ClusterClassifier, Verdict};
use crate::config::FilterConfig;
use crate::layout::ScanView;
use crate::ring_table::RingTable;
use crate::roi::RoiPredicate;
use crate::transform::RigidTransform;
use crate::visibility::{VisibilityHistogram, VisibilityReport};
use crate::walk::Walks;

// ────────────────────────────────────────────────────────────────────────────
// Shared configuration
// ────────────────────────────────────────────────────────────────────────────

/// An immutable parameter set together with everything derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    /// Incremented on every successful update; starts at 0.
    pub version: u64,
    pub config: FilterConfig,
    pub roi: RoiPredicate,
}

impl ConfigSnapshot {
    fn new(version: u64, config: FilterConfig) -> Self {
        let roi = RoiPredicate::from_config(&config);
        Self {
            version,
            config,
            roi,
        }
    }
}

/// Runtime-updatable filter parameters.
#[derive(Debug)]
pub struct SharedConfig {
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl SharedConfig {
    /// Wrap a validated `config` as version 0.
    pub fn new(config: FilterConfig) -> Result<Self, SieveError> {
        config.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(ConfigSnapshot::new(0, config))),
        })
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn version(&self) -> u64 {
        self.current.read().version
    }

    /// Apply `change` to a copy of the current parameters and publish the
    /// result as a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::InvalidConfig`] and keeps the current snapshot
    /// when the changed parameters fail validation.
    pub fn update<F>(&self, change: F) -> Result<u64, SieveError>
    where
        F: FnOnce(&mut FilterConfig),
    {
        let mut current = self.current.write();
        let mut next = current.config.clone();
        change(&mut next);
        next.validate()?;

        let version = current.version + 1;
        for change in next.changes_from(&current.config) {
            debug!(
                version,
                parameter = change.key,
                old = %change.old,
                new = %change.new,
                "setting new parameter value"
            );
        }
        *current = Arc::new(ConfigSnapshot::new(version, next));
        Ok(version)
    }

    /// Replace all parameters at once.
    pub fn replace(&self, config: FilterConfig) -> Result<u64, SieveError> {
        self.update(|current| *current = config)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Results
// ────────────────────────────────────────────────────────────────────────────

/// Per-scan counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub input_points: usize,
    /// Points skipped because their ring id was `>= max_rings`.
    pub skipped_ring: usize,
    /// Points dropped because their ring exceeded `max_points_per_ring`.
    pub dropped_capacity: usize,
    /// Points in rings of two or more points; each was classified.
    pub evaluated_points: usize,
    pub walks: usize,
    pub cluster_walks: usize,
    pub accepted_points: usize,
    pub rejected_points: usize,
}

/// Everything produced for one scan.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    /// Accepted points, `{x, y, z, intensity}`.
    pub points: PointCloud,
    /// Rejected points; present when `publish_noise_points` is set.
    pub noise: Option<PointCloud>,
    /// Present when `publish_noise_points` is set.
    pub visibility: Option<VisibilityReport>,
    pub stats: ScanStats,
    /// Version of the [`ConfigSnapshot`] the scan ran against.
    pub config_version: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// RingOutlierFilter
// ────────────────────────────────────────────────────────────────────────────

/// Ring-continuity noise filter for spinning-LIDAR scans.
#[derive(Debug)]
pub struct RingOutlierFilter {
    config: SharedConfig,
}

impl RingOutlierFilter {
    /// Create a filter with validated initial parameters.
    pub fn new(config: FilterConfig) -> Result<Self, SieveError> {
        Ok(Self {
            config: SharedConfig::new(config)?,
        })
    }

    /// Handle for reading and updating parameters at runtime.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Filter one scan.
    ///
    /// When `transform` is given, every emitted point is mapped through it and
    /// the output clouds are stamped with its target frame.
    ///
    /// # Errors
    ///
    /// Returns the layout error from [`ScanView::new`] when the scan is
    /// malformed; no partial output is produced.
    pub fn filter(
        &self,
        input: &PointCloud,
        transform: Option<&RigidTransform>,
    ) -> Result<FilterOutput, SieveError> {
        let started = Instant::now();
        let snapshot = self.config.snapshot();
        let cfg = &snapshot.config;

        let view = ScanView::new(input)?;
        let (table, bucket_stats) = RingTable::build(&view, cfg.max_rings, cfg.max_points_per_ring);
        let classifier = ClusterClassifier::new(cfg.num_points_threshold, cfg.object_length_threshold);
        let mut assembler = OutputAssembler::new(
            view.len(),
            input.is_bigendian,
            cfg.publish_noise_points,
            transform,
        );

        let mut stats = ScanStats {
            input_points: view.len(),
            skipped_ring: bucket_stats.skipped_ring,
            dropped_capacity: bucket_stats.dropped_capacity,
            ..ScanStats::default()
        };

        for (_, ring) in table.iter() {
            if ring.len() < 2 {
                continue;
            }
            stats.evaluated_points += ring.len();

            for walk in Walks::new(&view, ring, cfg.distance_ratio) {
                let verdict = classifier.classify(&view, ring, walk);
                stats.walks += 1;
                match verdict {
                    Verdict::Cluster => {
                        stats.cluster_walks += 1;
                        stats.accepted_points += walk.len();
                    }
                    Verdict::Noise => stats.rejected_points += walk.len(),
                }
                assembler.emit(&view, ring, walk, verdict);
            }
        }

        let (points, noise) = assembler.finish(&input.header, input.is_dense);

        let visibility = cfg.publish_noise_points.then(|| {
            VisibilityHistogram::new(cfg.vertical_bins, cfg.noise_threshold, snapshot.roi)
                .evaluate(&view, input.header.clone())
        });

        debug!(
            frame = %input.header.frame_id,
            config_version = snapshot.version,
            input = stats.input_points,
            accepted = stats.accepted_points,
            rejected = stats.rejected_points,
            walks = stats.walks,
            visibility = visibility.as_ref().map(|v| v.visibility),
            processing_ms = started.elapsed().as_secs_f64() * 1e3,
            "scan filtered"
        );

        Ok(FilterOutput {
            points,
            noise,
            visibility,
            stats,
            config_version: snapshot.version,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoiMode;
    use crate::sensor::{SensorPoint, encode_sensor_cloud};

    fn ring_of(ring: u16, azimuths: &[f32], distance: f32) -> Vec<SensorPoint> {
        azimuths
            .iter()
            .map(|&az| SensorPoint::polar(ring, az, distance))
            .collect()
    }

    #[test]
    fn shared_config_starts_at_version_zero() {
        let shared = SharedConfig::new(FilterConfig::default()).unwrap();
        assert_eq!(shared.version(), 0);
        assert_eq!(shared.snapshot().roi, RoiPredicate::All);
    }

    #[test]
    fn update_publishes_new_snapshot_and_rederives_roi() {
        let shared = SharedConfig::new(FilterConfig::default()).unwrap();
        let before = shared.snapshot();

        let version = shared
            .update(|c| {
                c.roi_mode = RoiMode::Azimuth;
                c.num_points_threshold = 6;
            })
            .unwrap();

        assert_eq!(version, 1);
        let after = shared.snapshot();
        assert_eq!(after.config.num_points_threshold, 6);
        assert!(matches!(after.roi, RoiPredicate::Sector { .. }));
        // A snapshot taken earlier is unaffected.
        assert_eq!(before.config.num_points_threshold, 4);
        assert_eq!(before.version, 0);
    }

    #[test]
    fn invalid_update_keeps_current_snapshot() {
        let shared = SharedConfig::new(FilterConfig::default()).unwrap();
        let err = shared.update(|c| c.distance_ratio = 0.5).unwrap_err();
        assert!(matches!(err, SieveError::InvalidConfig(_)));
        assert_eq!(shared.version(), 0);
        assert!((shared.snapshot().config.distance_ratio - 1.03).abs() < 1e-6);
    }

    #[test]
    fn oversized_ring_capacity_update_is_rejected() {
        let filter = RingOutlierFilter::new(FilterConfig::default()).unwrap();
        let err = filter
            .config()
            .update(|c| c.max_points_per_ring = usize::MAX / 4)
            .unwrap_err();
        assert!(matches!(err, SieveError::InvalidConfig(_)));

        let scan = encode_sensor_cloud("lidar", &ring_of(0, &[0.0], 5.0), false);
        let out = filter.filter(&scan, None).unwrap();
        assert_eq!(out.config_version, 0);
        assert_eq!(out.stats.input_points, 1);
    }

    #[test]
    fn invalid_initial_config_is_rejected() {
        let cfg = FilterConfig {
            max_rings: 0,
            ..FilterConfig::default()
        };
        assert!(RingOutlierFilter::new(cfg).is_err());
    }

    #[test]
    fn malformed_scan_fails_whole_invocation() {
        let filter = RingOutlierFilter::new(FilterConfig::default()).unwrap();
        let mut scan = encode_sensor_cloud("lidar", &ring_of(0, &[0.0, 50.0], 5.0), false);
        scan.fields.retain(|f| f.name != "distance");
        assert_eq!(
            filter.filter(&scan, None).unwrap_err(),
            SieveError::MissingField("distance".to_string())
        );
    }

    #[test]
    fn dense_walk_passes_sparse_noise_rejected() {
        let filter = RingOutlierFilter::new(FilterConfig {
            publish_noise_points: true,
            ..FilterConfig::default()
        })
        .unwrap();

        let mut points = ring_of(0, &[0.0, 50.0, 100.0, 150.0, 200.0], 10.0);
        // An isolated speck at 1.2 m in the middle of nowhere.
        points.extend(ring_of(0, &[9000.0], 1.2));
        let scan = encode_sensor_cloud("lidar", &points, false);

        let out = filter.filter(&scan, None).unwrap();
        assert_eq!(out.points.width, 5);
        assert_eq!(out.noise.as_ref().unwrap().width, 1);
        assert_eq!(out.stats.walks, 2);
        assert_eq!(out.stats.cluster_walks, 1);
        assert!(out.visibility.is_some());
        assert_eq!(out.config_version, 0);
    }

    #[test]
    fn single_point_rings_are_not_evaluated() {
        let filter = RingOutlierFilter::new(FilterConfig {
            publish_noise_points: true,
            ..FilterConfig::default()
        })
        .unwrap();
        let mut points = ring_of(1, &[0.0], 5.0);
        points.extend(ring_of(2, &[0.0, 50.0, 100.0, 150.0], 5.0));
        let scan = encode_sensor_cloud("lidar", &points, false);

        let out = filter.filter(&scan, None).unwrap();
        assert_eq!(out.stats.evaluated_points, 4);
        assert_eq!(out.points.width, 4);
        assert_eq!(out.noise.unwrap().width, 0);
    }

    #[test]
    fn out_of_range_rings_are_skipped_not_fatal() {
        let filter = RingOutlierFilter::new(FilterConfig {
            max_rings: 16,
            ..FilterConfig::default()
        })
        .unwrap();
        let mut points = ring_of(3, &[0.0, 50.0, 100.0, 150.0], 5.0);
        points.extend(ring_of(40, &[0.0, 50.0, 100.0, 150.0], 5.0));
        let scan = encode_sensor_cloud("lidar", &points, false);

        let out = filter.filter(&scan, None).unwrap();
        assert_eq!(out.stats.skipped_ring, 4);
        assert_eq!(out.points.width, 4);
    }

    #[test]
    fn scan_uses_snapshot_version_at_start() {
        let filter = RingOutlierFilter::new(FilterConfig::default()).unwrap();
        filter.config().update(|c| c.num_points_threshold = 2).unwrap();

        let scan = encode_sensor_cloud("lidar", &ring_of(0, &[0.0, 10.0], 5.0), false);
        let out = filter.filter(&scan, None).unwrap();
        assert_eq!(out.config_version, 1);
        assert_eq!(out.points.width, 2);
    }

    #[test]
    fn concurrent_scans_and_updates() {
        let filter = Arc::new(RingOutlierFilter::new(FilterConfig::default()).unwrap());
        let scan = Arc::new(encode_sensor_cloud(
            "lidar",
            &ring_of(0, &[0.0, 50.0, 100.0, 150.0, 200.0, 250.0], 5.0),
            false,
        ));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let filter = Arc::clone(&filter);
                let scan = Arc::clone(&scan);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let out = filter.filter(&scan, None).unwrap();
                        assert_eq!(out.points.width, 6);
                    }
                })
            })
            .collect();

        for i in 0..50 {
            filter
                .config()
                .update(|c| c.object_length_threshold = 0.1 + i as f32 * 0.01)
                .unwrap();
        }
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(filter.config().version(), 50);
    }
}
