use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Datatype tag of a [`PointField`], numbered as in `sensor_msgs/PointField`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PointFieldType {
    Int8 = 1,
    Uint8 = 2,
    Int16 = 3,
    Uint16 = 4,
    Int32 = 5,
    Uint32 = 6,
    Float32 = 7,
    Float64 = 8,
}

impl PointFieldType {
    /// Size in bytes of one element of this type.
    pub fn size(self) -> usize {
        match self {
            PointFieldType::Int8 | PointFieldType::Uint8 => 1,
            PointFieldType::Int16 | PointFieldType::Uint16 => 2,
            PointFieldType::Int32 | PointFieldType::Uint32 | PointFieldType::Float32 => 4,
            PointFieldType::Float64 => 8,
        }
    }
}

/// A named field inside one point record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointField {
    /// e.g., "x", "ring", "azimuth"
    pub name: String,
    /// Byte offset from the start of the point record.
    pub offset: u32,
    pub datatype: PointFieldType,
    pub count: u32,
}

impl PointField {
    pub fn new(name: &str, offset: u32, datatype: PointFieldType) -> Self {
        Self {
            name: name.to_string(),
            offset,
            datatype,
            count: 1,
        }
    }
}

/// Frame and acquisition time shared by every message derived from one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudHeader {
    pub frame_id: String,
    pub stamp: DateTime<Utc>,
}

/// A structured point cloud: a flat byte buffer of fixed-stride records whose
/// layout is described by `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub header: CloudHeader,
    pub height: u32,
    pub width: u32,
    pub fields: Vec<PointField>,
    pub is_bigendian: bool,
    /// Size of one point record in bytes.
    pub point_step: u32,
    /// Size of one row in bytes.
    pub row_step: u32,
    pub data: Vec<u8>,
    /// True when the cloud contains no invalid (NaN) points.
    pub is_dense: bool,
}

impl PointCloud {
    /// Number of point records (`width * height`).
    pub fn point_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&PointField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Standard layouts
// ────────────────────────────────────────────────────────────────────────────

/// Stride of the `{x, y, z, intensity}` output record.
pub const XYZI_POINT_STEP: u32 = 16;

/// Stride of the `PointXYZIRADRT` sensor record.
pub const XYZIRADRT_POINT_STEP: u32 = 48;

/// Fields of the `{x, y, z, intensity}` output record, all FLOAT32.
pub fn xyzi_fields() -> Vec<PointField> {
    vec![
        PointField::new("x", 0, PointFieldType::Float32),
        PointField::new("y", 4, PointFieldType::Float32),
        PointField::new("z", 8, PointFieldType::Float32),
        PointField::new("intensity", 12, PointFieldType::Float32),
    ]
}

/// Fields of the `PointXYZIRADRT` sensor record emitted by spinning LIDAR
/// drivers.
///
/// ```text
/// x:f32 @0  y:f32 @4  z:f32 @8  intensity:f32 @12  ring:u16 @16
/// azimuth:f32 @20  elevation:f32 @24  distance:f32 @28
/// return_type:u8 @32  time_stamp:f64 @40
/// ```
pub fn xyziradrt_fields() -> Vec<PointField> {
    vec![
        PointField::new("x", 0, PointFieldType::Float32),
        PointField::new("y", 4, PointFieldType::Float32),
        PointField::new("z", 8, PointFieldType::Float32),
        PointField::new("intensity", 12, PointFieldType::Float32),
        PointField::new("ring", 16, PointFieldType::Uint16),
        PointField::new("azimuth", 20, PointFieldType::Float32),
        PointField::new("elevation", 24, PointFieldType::Float32),
        PointField::new("distance", 28, PointFieldType::Float32),
        PointField::new("return_type", 32, PointFieldType::Uint8),
        PointField::new("time_stamp", 40, PointFieldType::Float64),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Error type shared by the ring filter, its configuration layer and the CLI.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SieveError {
    #[error("Malformed input: required field '{0}' is missing")]
    MissingField(String),

    #[error("Malformed input: field '{field}' has datatype {actual:?}, expected {expected:?}")]
    FieldType {
        field: String,
        expected: PointFieldType,
        actual: PointFieldType,
    },

    #[error("Malformed input: field '{field}' at offset {offset} does not fit in a {point_step}-byte record")]
    FieldOutOfBounds {
        field: String,
        offset: u32,
        point_step: u32,
    },

    #[error("Malformed input: point_step is zero")]
    ZeroStride,

    #[error("Malformed input: buffer holds {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },

    #[error("Configuration Error: unknown ROI mode '{0}'")]
    UnknownRoiMode(String),

    #[error("Configuration Error: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud_with(fields: Vec<PointField>) -> PointCloud {
        PointCloud {
            header: CloudHeader {
                frame_id: "lidar_top".to_string(),
                stamp: Utc::now(),
            },
            height: 2,
            width: 3,
            fields,
            is_bigendian: false,
            point_step: XYZIRADRT_POINT_STEP,
            row_step: XYZIRADRT_POINT_STEP * 3,
            data: Vec::new(),
            is_dense: true,
        }
    }

    #[test]
    fn field_type_sizes() {
        assert_eq!(PointFieldType::Uint8.size(), 1);
        assert_eq!(PointFieldType::Uint16.size(), 2);
        assert_eq!(PointFieldType::Float32.size(), 4);
        assert_eq!(PointFieldType::Float64.size(), 8);
    }

    #[test]
    fn point_count_is_width_times_height() {
        let cloud = cloud_with(xyziradrt_fields());
        assert_eq!(cloud.point_count(), 6);
    }

    #[test]
    fn field_lookup_by_name() {
        let cloud = cloud_with(xyziradrt_fields());
        let ring = cloud.field("ring").unwrap();
        assert_eq!(ring.offset, 16);
        assert_eq!(ring.datatype, PointFieldType::Uint16);
        assert!(cloud.field("rgb").is_none());
    }

    #[test]
    fn sensor_layout_fits_in_stride() {
        for f in xyziradrt_fields() {
            assert!(f.offset as usize + f.datatype.size() <= XYZIRADRT_POINT_STEP as usize);
        }
        for f in xyzi_fields() {
            assert!(f.offset as usize + f.datatype.size() <= XYZI_POINT_STEP as usize);
        }
    }

    #[test]
    fn header_roundtrip() {
        let header = CloudHeader {
            frame_id: "base_link".to_string(),
            stamp: Utc::now(),
        };
        let json = serde_json::to_string(&header).unwrap();
        let back: CloudHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(header, back);
    }

    #[test]
    fn sieve_error_display() {
        let err = SieveError::MissingField("ring".to_string());
        assert!(err.to_string().contains("ring"));

        let err2 = SieveError::UnknownRoiMode("Spiral_ROI".to_string());
        assert!(err2.to_string().contains("Configuration Error"));
    }
}
