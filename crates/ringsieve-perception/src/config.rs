//! Filter parameters.
//!
//! [`FilterConfig`] holds every tunable of the ring outlier filter.  It is
//! (de)serialisable so it can live in a TOML file; missing keys fall back to
//! the defaults listed below.
//!
//! | Key | Default | Used by |
//! |---|---|---|
//! | `distance_ratio` | 1.03 | walk segmentation |
//! | `object_length_threshold` | 0.1 m | cluster classifier |
//! | `num_points_threshold` | 4 | cluster classifier |
//! | `max_rings` | 128 | ring bucketing |
//! | `max_points_per_ring` | 4000 | ring bucketing |
//! | `publish_noise_points` | false | noise cloud + visibility |
//! | `x_min`/`x_max`, `y_min`/`y_max`, `z_min`/`z_max` | -12/18, -2/2, 0/10 | box ROI |
//! | `min_azimuth_deg`/`max_azimuth_deg`, `max_distance` | 135/225, 12 m | sector ROI |
//! | `vertical_bins` | 128 | visibility grid rows |
//! | `max_azimuth_diff` | 50.0 | parameter-file compatibility only |
//! | `noise_threshold` | 2 | visibility grid threshold |
//! | `roi_mode` | `"Fixed_xyz_ROI"` | visibility ROI |

use std::fmt;

use ringsieve_types::SieveError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Region-of-interest policy for the visibility histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoiMode {
    /// Every point contributes to its bin.
    #[default]
    FixedXyz,
    /// Only points strictly inside the configured Cartesian box contribute.
    Box,
    /// Only points inside the configured azimuth sector and closer than
    /// `max_distance` contribute.
    Azimuth,
}

impl RoiMode {
    pub const FIXED_XYZ: &'static str = "Fixed_xyz_ROI";
    pub const BOX: &'static str = "Box_ROI";
    pub const AZIMUTH: &'static str = "Fixed_azimuth_ROI";

    /// Parse a mode name.  `"No_ROI"` is accepted as an alias of the default.
    pub fn parse(name: &str) -> Result<Self, SieveError> {
        match name {
            Self::FIXED_XYZ | "No_ROI" => Ok(RoiMode::FixedXyz),
            Self::BOX => Ok(RoiMode::Box),
            Self::AZIMUTH => Ok(RoiMode::Azimuth),
            other => Err(SieveError::UnknownRoiMode(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoiMode::FixedXyz => Self::FIXED_XYZ,
            RoiMode::Box => Self::BOX,
            RoiMode::Azimuth => Self::AZIMUTH,
        }
    }
}

/// Unknown names fall back to the default mode with a warning.
impl From<String> for RoiMode {
    fn from(name: String) -> Self {
        RoiMode::parse(&name).unwrap_or_else(|e| {
            warn!(error = %e, fallback = RoiMode::FIXED_XYZ, "falling back to default ROI mode");
            RoiMode::default()
        })
    }
}

impl From<RoiMode> for String {
    fn from(mode: RoiMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for RoiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunable parameters of the ring outlier filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Two neighbouring ranges belong to one walk when
    /// `max < min * distance_ratio`.
    #[serde(default = "default_distance_ratio")]
    pub distance_ratio: f32,

    /// Minimum first-to-last extent (metres) that makes a short walk an
    /// object.
    #[serde(default = "default_object_length_threshold")]
    pub object_length_threshold: f32,

    /// Walks with at least this many points are always objects.
    #[serde(default = "default_num_points_threshold")]
    pub num_points_threshold: usize,

    #[serde(default = "default_max_rings")]
    pub max_rings: u16,

    #[serde(default = "default_max_points_per_ring")]
    pub max_points_per_ring: usize,

    /// Emit the noise cloud and run the visibility estimator.
    #[serde(default)]
    pub publish_noise_points: bool,

    #[serde(default = "default_x_min")]
    pub x_min: f32,
    #[serde(default = "default_x_max")]
    pub x_max: f32,
    #[serde(default = "default_y_min")]
    pub y_min: f32,
    #[serde(default = "default_y_max")]
    pub y_max: f32,
    #[serde(default = "default_z_min")]
    pub z_min: f32,
    #[serde(default = "default_z_max")]
    pub z_max: f32,

    #[serde(default = "default_min_azimuth_deg")]
    pub min_azimuth_deg: f32,
    #[serde(default = "default_max_azimuth_deg")]
    pub max_azimuth_deg: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,

    /// Rows of the visibility grid; ring ids at or above this are not counted.
    #[serde(default = "default_vertical_bins")]
    pub vertical_bins: usize,

    /// Read from parameter files but not consulted: walk segmentation uses a
    /// fixed 1° azimuth step.
    #[serde(default = "default_max_azimuth_diff")]
    pub max_azimuth_diff: f32,

    /// A visibility cell is flagged when its count exceeds this value.
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold: u8,

    #[serde(default)]
    pub roi_mode: RoiMode,
}

fn default_distance_ratio() -> f32 {
    1.03
}
fn default_object_length_threshold() -> f32 {
    0.1
}
fn default_num_points_threshold() -> usize {
    4
}
fn default_max_rings() -> u16 {
    128
}
fn default_max_points_per_ring() -> usize {
    4000
}
fn default_x_min() -> f32 {
    -12.0
}
fn default_x_max() -> f32 {
    18.0
}
fn default_y_min() -> f32 {
    -2.0
}
fn default_y_max() -> f32 {
    2.0
}
fn default_z_min() -> f32 {
    0.0
}
fn default_z_max() -> f32 {
    10.0
}
fn default_min_azimuth_deg() -> f32 {
    135.0
}
fn default_max_azimuth_deg() -> f32 {
    225.0
}
fn default_max_distance() -> f32 {
    12.0
}
fn default_vertical_bins() -> usize {
    128
}
fn default_max_azimuth_diff() -> f32 {
    50.0
}
fn default_noise_threshold() -> u8 {
    2
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            distance_ratio: default_distance_ratio(),
            object_length_threshold: default_object_length_threshold(),
            num_points_threshold: default_num_points_threshold(),
            max_rings: default_max_rings(),
            max_points_per_ring: default_max_points_per_ring(),
            publish_noise_points: false,
            x_min: default_x_min(),
            x_max: default_x_max(),
            y_min: default_y_min(),
            y_max: default_y_max(),
            z_min: default_z_min(),
            z_max: default_z_max(),
            min_azimuth_deg: default_min_azimuth_deg(),
            max_azimuth_deg: default_max_azimuth_deg(),
            max_distance: default_max_distance(),
            vertical_bins: default_vertical_bins(),
            max_azimuth_diff: default_max_azimuth_diff(),
            noise_threshold: default_noise_threshold(),
            roi_mode: RoiMode::default(),
        }
    }
}

/// Largest accepted `max_points_per_ring`.
pub const MAX_POINTS_PER_RING_LIMIT: usize = 1 << 20;

/// One parameter whose value differs between two configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamChange {
    pub key: &'static str,
    pub old: String,
    pub new: String,
}

macro_rules! changed_params {
    ($old:expr, $new:expr; $($field:ident),+ $(,)?) => {{
        let mut changes = Vec::new();
        $(
            if $old.$field != $new.$field {
                changes.push(ParamChange {
                    key: stringify!($field),
                    old: format!("{:?}", $old.$field),
                    new: format!("{:?}", $new.$field),
                });
            }
        )+
        changes
    }};
}

impl FilterConfig {
    /// Parameters of `self` that differ from `previous`, in declaration order.
    pub fn changes_from(&self, previous: &FilterConfig) -> Vec<ParamChange> {
        changed_params!(previous, self;
            distance_ratio,
            object_length_threshold,
            num_points_threshold,
            max_rings,
            max_points_per_ring,
            publish_noise_points,
            x_min,
            x_max,
            y_min,
            y_max,
            z_min,
            z_max,
            min_azimuth_deg,
            max_azimuth_deg,
            max_distance,
            vertical_bins,
            max_azimuth_diff,
            noise_threshold,
            roi_mode,
        )
    }

    /// Reject parameter combinations the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> Result<(), SieveError> {
        let invalid = |msg: String| Err(SieveError::InvalidConfig(msg));

        if !(self.distance_ratio.is_finite() && self.distance_ratio >= 1.0) {
            return invalid(format!(
                "distance_ratio must be a finite value >= 1.0, got {}",
                self.distance_ratio
            ));
        }
        if !(self.object_length_threshold.is_finite() && self.object_length_threshold >= 0.0) {
            return invalid(format!(
                "object_length_threshold must be finite and >= 0, got {}",
                self.object_length_threshold
            ));
        }
        if self.max_rings == 0 {
            return invalid("max_rings must be > 0".to_string());
        }
        if self.max_points_per_ring == 0 || self.max_points_per_ring > MAX_POINTS_PER_RING_LIMIT {
            return invalid(format!(
                "max_points_per_ring must be in 1..={MAX_POINTS_PER_RING_LIMIT}, got {}",
                self.max_points_per_ring
            ));
        }
        if self.vertical_bins == 0 {
            return invalid("vertical_bins must be > 0".to_string());
        }
        for (name, lo, hi) in [
            ("x", self.x_min, self.x_max),
            ("y", self.y_min, self.y_max),
            ("z", self.z_min, self.z_max),
        ] {
            if lo > hi {
                return invalid(format!("{name}_min ({lo}) exceeds {name}_max ({hi})"));
            }
        }
        if !(0.0..=360.0).contains(&self.min_azimuth_deg)
            || !(0.0..=360.0).contains(&self.max_azimuth_deg)
            || self.min_azimuth_deg >= self.max_azimuth_deg
        {
            return invalid(format!(
                "azimuth sector [{}, {}] must satisfy 0 <= min < max <= 360",
                self.min_azimuth_deg, self.max_azimuth_deg
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = FilterConfig::default();
        assert!((cfg.distance_ratio - 1.03).abs() < 1e-6);
        assert!((cfg.object_length_threshold - 0.1).abs() < 1e-6);
        assert_eq!(cfg.num_points_threshold, 4);
        assert_eq!(cfg.max_rings, 128);
        assert_eq!(cfg.max_points_per_ring, 4000);
        assert!(!cfg.publish_noise_points);
        assert_eq!(cfg.vertical_bins, 128);
        assert_eq!(cfg.noise_threshold, 2);
        assert_eq!(cfg.roi_mode, RoiMode::FixedXyz);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: FilterConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, FilterConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let cfg: FilterConfig = toml::from_str(
            "distance_ratio = 1.05\nroi_mode = \"Fixed_azimuth_ROI\"\npublish_noise_points = true\n",
        )
        .unwrap();
        assert!((cfg.distance_ratio - 1.05).abs() < 1e-6);
        assert_eq!(cfg.roi_mode, RoiMode::Azimuth);
        assert!(cfg.publish_noise_points);
        assert_eq!(cfg.num_points_threshold, 4);
    }

    #[test]
    fn unknown_roi_mode_falls_back_to_default() {
        let cfg: FilterConfig = toml::from_str("roi_mode = \"Spiral_ROI\"\n").unwrap();
        assert_eq!(cfg.roi_mode, RoiMode::FixedXyz);
    }

    #[test]
    fn roi_mode_parse_rejects_unknown_names() {
        assert_eq!(RoiMode::parse("No_ROI").unwrap(), RoiMode::FixedXyz);
        assert_eq!(RoiMode::parse("Box_ROI").unwrap(), RoiMode::Box);
        assert!(matches!(
            RoiMode::parse("Spiral_ROI"),
            Err(SieveError::UnknownRoiMode(_))
        ));
    }

    #[test]
    fn roi_mode_serializes_by_name() {
        let cfg = FilterConfig {
            roi_mode: RoiMode::Box,
            ..FilterConfig::default()
        };
        let raw = toml::to_string(&cfg).unwrap();
        assert!(raw.contains("roi_mode = \"Box_ROI\""));
        let back: FilterConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn validate_rejects_ratio_below_one() {
        let cfg = FilterConfig {
            distance_ratio: 0.9,
            ..FilterConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SieveError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_inverted_box() {
        let cfg = FilterConfig {
            y_min: 2.0,
            y_max: -2.0,
            ..FilterConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("y_min"));
    }

    #[test]
    fn validate_rejects_zero_bins_and_empty_sector() {
        let zero_bins = FilterConfig {
            vertical_bins: 0,
            ..FilterConfig::default()
        };
        assert!(zero_bins.validate().is_err());

        let empty_sector = FilterConfig {
            min_azimuth_deg: 200.0,
            max_azimuth_deg: 200.0,
            ..FilterConfig::default()
        };
        assert!(empty_sector.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_ring_capacity() {
        let huge = FilterConfig {
            max_points_per_ring: usize::MAX / 4,
            ..FilterConfig::default()
        };
        let err = huge.validate().unwrap_err();
        assert!(err.to_string().contains("max_points_per_ring"));

        let at_limit = FilterConfig {
            max_points_per_ring: MAX_POINTS_PER_RING_LIMIT,
            ..FilterConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn changes_from_lists_only_changed_keys() {
        let old = FilterConfig::default();
        let new = FilterConfig {
            num_points_threshold: 6,
            roi_mode: RoiMode::Box,
            ..FilterConfig::default()
        };
        let changes = new.changes_from(&old);
        let keys: Vec<_> = changes.iter().map(|c| c.key).collect();
        assert_eq!(keys, ["num_points_threshold", "roi_mode"]);
        assert_eq!(changes[0].old, "4");
        assert_eq!(changes[0].new, "6");
        assert!(old.changes_from(&old).is_empty());
    }
}
