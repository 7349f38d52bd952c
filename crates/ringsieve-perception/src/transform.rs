//! Rigid transforms applied to filtered points.
//!
//! The filter itself only needs a homogeneous 4×4 matrix
//! ([`RigidTransform`]).  [`Transform3D`] describes the same thing as a
//! translation + unit quaternion, which is how sensor mounts are usually
//! written down, and converts into the matrix form.
//!
//! # Example
//!
//! ```rust
//! use ringsieve_perception::transform::{Quaternion, RigidTransform, Transform3D, Vec3};
//!
//! // Sensor mounted 1.5 m above base_link, no rotation.
//! let mount = Transform3D::new(Vec3::new(0.0, 0.0, 1.5), Quaternion::identity());
//! let tf = RigidTransform::from_transform("base_link", mount);
//!
//! let p = tf.apply([2.0, 0.0, 0.0]);
//! assert!((p[2] - 1.5).abs() < 1e-5);
//! ```

use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Primitive types
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D translation vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    /// Create a quaternion.  Use [`normalized`][Self::normalized] when the
    /// components come from user input.
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Scale to unit length.  A zero quaternion becomes the identity.
    pub fn normalized(self) -> Self {
        let n = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if n <= f32::EPSILON {
            return Self::identity();
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transform3D
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body 3-D transform: rotation followed by translation.
///
/// Maps a point `p` to `rotation · p + translation`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Transform3D {
    /// Create a transform from a translation and rotation.
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Homogeneous 4×4 matrix of this transform.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let Quaternion { w, x, y, z } = self.rotation;
        let t = self.translation;
        Matrix4::new(
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
            t.x,
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
            t.y,
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
            t.z,
            0.0,
            0.0,
            0.0,
            1.0,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RigidTransform
// ────────────────────────────────────────────────────────────────────────────

/// A homogeneous transform into `target_frame`, applied to every emitted
/// point.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidTransform {
    pub target_frame: String,
    pub matrix: Matrix4<f32>,
}

impl RigidTransform {
    pub fn new(target_frame: &str, matrix: Matrix4<f32>) -> Self {
        Self {
            target_frame: target_frame.to_string(),
            matrix,
        }
    }

    pub fn from_transform(target_frame: &str, transform: Transform3D) -> Self {
        Self::new(target_frame, transform.to_matrix())
    }

    /// Transform `(x, y, z, 1)` and drop the homogeneous coordinate.
    pub fn apply(&self, [x, y, z]: [f32; 3]) -> [f32; 3] {
        let p = self.matrix * Vector4::new(x, y, z, 1.0);
        [p.x, p.y, p.z]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(p, q)| (p - q).abs() < 1e-5)
    }

    fn yaw(degrees: f32) -> Quaternion {
        let half = degrees.to_radians() / 2.0;
        Quaternion::new(half.cos(), 0.0, 0.0, half.sin())
    }

    // ── Quaternion ──────────────────────────────────────────────────────────

    #[test]
    fn normalized_scales_to_unit_length() {
        let q = Quaternion::new(2.0, 0.0, 0.0, 0.0).normalized();
        assert_eq!(q, Quaternion::identity());
        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized(), Quaternion::identity());
    }

    // ── Transform3D ─────────────────────────────────────────────────────────

    #[test]
    fn identity_rotation_without_offset_is_identity_matrix() {
        let t = Transform3D::new(Vec3::new(0.0, 0.0, 0.0), Quaternion::identity());
        assert_eq!(t.to_matrix(), Matrix4::identity());
    }

    #[test]
    fn matrix_of_90deg_yaw_rotates_x_to_y() {
        let m = Transform3D::new(Vec3::new(0.0, 0.0, 0.0), yaw(90.0)).to_matrix();
        let p = m * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!(close([p.x, p.y, p.z], [0.0, 1.0, 0.0]), "got {p:?}");
    }

    #[test]
    fn roll_180_with_offset_flips_y_and_z() {
        // Half turn about x: (x, y, z) -> (x, -y, -z), then translate.
        let roll = Quaternion::new(0.0, 1.0, 0.0, 0.0);
        let tf = RigidTransform::from_transform(
            "map",
            Transform3D::new(Vec3::new(1.0, -2.0, 0.5), roll),
        );
        assert!(close(tf.apply([3.0, 1.0, -4.0]), [4.0, -3.0, 4.5]));
    }

    // ── RigidTransform ──────────────────────────────────────────────────────

    #[test]
    fn translation_only_shifts_points() {
        let tf = RigidTransform::from_transform(
            "base_link",
            Transform3D::new(Vec3::new(1.0, 2.0, 3.0), Quaternion::identity()),
        );
        assert!(close(tf.apply([0.5, 0.5, 0.5]), [1.5, 2.5, 3.5]));
        assert_eq!(tf.target_frame, "base_link");
    }

    #[test]
    fn yaw_then_translate() {
        let tf = RigidTransform::from_transform(
            "base_link",
            Transform3D::new(Vec3::new(0.0, 0.0, 1.0), yaw(90.0)),
        );
        assert!(close(tf.apply([1.0, 0.0, 0.0]), [0.0, 1.0, 1.0]));
    }
}
