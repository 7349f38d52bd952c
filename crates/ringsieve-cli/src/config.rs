//! Configuration file – reads/writes `~/.ringsieve/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ringsieve_perception::FilterConfig;
use ringsieve_perception::transform::{Quaternion, RigidTransform, Transform3D, Vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Persisted configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Filter parameters.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Optional sensor mount; when present, output points are moved into
    /// `target_frame`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformConfig>,
}

/// A sensor-to-target transform written as translation + quaternion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub target_frame: String,

    /// `[x, y, z]` in metres.
    #[serde(default)]
    pub translation: [f32; 3],

    /// `[w, x, y, z]`; normalised on use.
    #[serde(default = "default_rotation")]
    pub rotation: [f32; 4],
}

fn default_rotation() -> [f32; 4] {
    [1.0, 0.0, 0.0, 0.0]
}

impl TransformConfig {
    pub fn to_rigid(&self) -> RigidTransform {
        let [tx, ty, tz] = self.translation;
        let [w, x, y, z] = self.rotation;
        let mount = Transform3D::new(
            Vec3::new(tx, ty, tz),
            Quaternion::new(w, x, y, z).normalized(),
        );
        RigidTransform::from_transform(&self.target_frame, mount)
    }
}

/// Return the path to `~/.ringsieve/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".ringsieve").join("config.toml")
}

/// Parse the config at `path` as written.  Returns `None` if the file does
/// not exist.
pub(crate) fn read_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Failed to parse config: {}", e))
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
///
/// Environment overrides are applied and the filter parameters validated
/// before returning.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    let Some(mut cfg) = read_from(path)? else {
        return Ok(None);
    };
    apply_env_overrides(&mut cfg);
    cfg.filter.validate().map_err(|e| e.to_string())?;
    Ok(Some(cfg))
}

/// Like [`load_from`], falling back to defaults (plus environment
/// overrides) when the file does not exist.
pub fn load_or_default(path: &Path) -> Result<Config, String> {
    if let Some(cfg) = load_from(path)? {
        return Ok(cfg);
    }
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg);
    cfg.filter.validate().map_err(|e| e.to_string())?;
    Ok(cfg)
}

/// Apply `RINGSIEVE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `RINGSIEVE_DISTANCE_RATIO` | `filter.distance_ratio` |
/// | `RINGSIEVE_OBJECT_LENGTH_THRESHOLD` | `filter.object_length_threshold` |
/// | `RINGSIEVE_NUM_POINTS_THRESHOLD` | `filter.num_points_threshold` |
/// | `RINGSIEVE_PUBLISH_NOISE_POINTS` | `filter.publish_noise_points` |
/// | `RINGSIEVE_NOISE_THRESHOLD` | `filter.noise_threshold` |
/// | `RINGSIEVE_ROI_MODE` | `filter.roi_mode` |
///
/// Values that do not parse are ignored with a warning.
pub fn apply_env_overrides(cfg: &mut Config) {
    let f = &mut cfg.filter;
    override_from_env("RINGSIEVE_DISTANCE_RATIO", &mut f.distance_ratio);
    override_from_env("RINGSIEVE_OBJECT_LENGTH_THRESHOLD", &mut f.object_length_threshold);
    override_from_env("RINGSIEVE_NUM_POINTS_THRESHOLD", &mut f.num_points_threshold);
    override_from_env("RINGSIEVE_PUBLISH_NOISE_POINTS", &mut f.publish_noise_points);
    override_from_env("RINGSIEVE_NOISE_THRESHOLD", &mut f.noise_threshold);
    if let Ok(v) = std::env::var("RINGSIEVE_ROI_MODE") {
        f.roi_mode = v.into();
    }
}

fn override_from_env<T: FromStr>(name: &str, slot: &mut T) {
    let Ok(raw) = std::env::var(name) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!(variable = name, value = %raw, "ignoring unparseable override"),
    }
}

/// Save the config to `path`, creating parent directories if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
