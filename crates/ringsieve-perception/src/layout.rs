//! Typed, zero-copy access to the point records of a scan.
//!
//! [`ScanView::new`] resolves and validates the byte offsets of the fields the
//! filter reads (`x`, `y`, `z`, `intensity`, `ring`, `azimuth`, `distance`)
//! once per scan.  After that, [`PointRecord`] accessors are plain slice reads
//! that honour the cloud's declared byte order.

use ringsieve_types::{PointCloud, PointFieldType, SieveError};

/// Byte offsets of the fields the filter reads, checked against the stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLayout {
    pub point_step: usize,
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub intensity: usize,
    pub ring: usize,
    pub azimuth: usize,
    pub distance: usize,
    pub big_endian: bool,
}

impl ScanLayout {
    /// Resolve the required fields of `cloud`.
    ///
    /// # Errors
    ///
    /// - [`SieveError::ZeroStride`] – `point_step` is zero.
    /// - [`SieveError::MissingField`] – a required field is not declared.
    /// - [`SieveError::FieldType`] – a field has an unexpected datatype.
    /// - [`SieveError::FieldOutOfBounds`] – a field does not fit in the record.
    pub fn from_cloud(cloud: &PointCloud) -> Result<Self, SieveError> {
        if cloud.point_step == 0 {
            return Err(SieveError::ZeroStride);
        }
        let offset = |name: &str, expected: PointFieldType| -> Result<usize, SieveError> {
            let field = cloud
                .field(name)
                .ok_or_else(|| SieveError::MissingField(name.to_string()))?;
            if field.datatype != expected {
                return Err(SieveError::FieldType {
                    field: name.to_string(),
                    expected,
                    actual: field.datatype,
                });
            }
            if field.offset as usize + expected.size() > cloud.point_step as usize {
                return Err(SieveError::FieldOutOfBounds {
                    field: name.to_string(),
                    offset: field.offset,
                    point_step: cloud.point_step,
                });
            }
            Ok(field.offset as usize)
        };

        Ok(Self {
            point_step: cloud.point_step as usize,
            x: offset("x", PointFieldType::Float32)?,
            y: offset("y", PointFieldType::Float32)?,
            z: offset("z", PointFieldType::Float32)?,
            intensity: offset("intensity", PointFieldType::Float32)?,
            ring: offset("ring", PointFieldType::Uint16)?,
            azimuth: offset("azimuth", PointFieldType::Float32)?,
            distance: offset("distance", PointFieldType::Float32)?,
            big_endian: cloud.is_bigendian,
        })
    }
}

/// A validated, read-only view over the records of one scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanView<'a> {
    data: &'a [u8],
    layout: ScanLayout,
    len: usize,
}

impl<'a> ScanView<'a> {
    /// Validate `cloud` and build a view over its records.
    ///
    /// # Errors
    ///
    /// Any error of [`ScanLayout::from_cloud`], or
    /// [`SieveError::BufferLength`] when the buffer does not hold exactly
    /// `width * height` records.
    pub fn new(cloud: &'a PointCloud) -> Result<Self, SieveError> {
        let layout = ScanLayout::from_cloud(cloud)?;
        let len = cloud.point_count();
        let expected = len * layout.point_step;
        if cloud.data.len() != expected {
            return Err(SieveError::BufferLength {
                expected,
                actual: cloud.data.len(),
            });
        }
        Ok(Self {
            data: &cloud.data,
            layout,
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn layout(&self) -> &ScanLayout {
        &self.layout
    }

    /// The record at position `index` (scan order).
    ///
    /// # Panics
    ///
    /// Panics when `index >= self.len()`.
    pub fn point(&self, index: usize) -> PointRecord<'a> {
        let start = index * self.layout.point_step;
        PointRecord {
            bytes: &self.data[start..start + self.layout.point_step],
            layout: self.layout,
        }
    }

    /// Iterate over all records in scan order.
    pub fn points(&self) -> impl Iterator<Item = PointRecord<'a>> + '_ {
        (0..self.len).map(|i| self.point(i))
    }
}

/// One point record borrowed from the scan buffer.
#[derive(Debug, Clone, Copy)]
pub struct PointRecord<'a> {
    bytes: &'a [u8],
    layout: ScanLayout,
}

impl PointRecord<'_> {
    pub fn x(&self) -> f32 {
        self.read_f32(self.layout.x)
    }

    pub fn y(&self) -> f32 {
        self.read_f32(self.layout.y)
    }

    pub fn z(&self) -> f32 {
        self.read_f32(self.layout.z)
    }

    pub fn intensity(&self) -> f32 {
        self.read_f32(self.layout.intensity)
    }

    pub fn ring(&self) -> u16 {
        let mut raw = [0u8; 2];
        raw.copy_from_slice(&self.bytes[self.layout.ring..self.layout.ring + 2]);
        if self.layout.big_endian {
            u16::from_be_bytes(raw)
        } else {
            u16::from_le_bytes(raw)
        }
    }

    /// Azimuth in centidegrees (0–36000).
    pub fn azimuth(&self) -> f32 {
        self.read_f32(self.layout.azimuth)
    }

    /// Range in metres.
    pub fn distance(&self) -> f32 {
        self.read_f32(self.layout.distance)
    }

    pub fn position(&self) -> [f32; 3] {
        [self.x(), self.y(), self.z()]
    }

    fn read_f32(&self, offset: usize) -> f32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[offset..offset + 4]);
        if self.layout.big_endian {
            f32::from_be_bytes(raw)
        } else {
            f32::from_le_bytes(raw)
        }
    }
}
