//! Encoding of `PointXYZIRADRT` sensor scans.
//!
//! Spinning-LIDAR drivers publish one record per return with the layout given
//! by [`xyziradrt_fields`].  [`encode_sensor_cloud`] packs decoded
//! [`SensorPoint`]s into that layout, in either byte order, so recorded or
//! synthetic returns can be fed through the filter.

use chrono::Utc;
use ringsieve_types::{CloudHeader, PointCloud, XYZIRADRT_POINT_STEP, xyziradrt_fields};

/// One decoded LIDAR return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
    pub ring: u16,
    /// Centidegrees, 0–36000.
    pub azimuth: f32,
    pub elevation: f32,
    /// Metres.
    pub distance: f32,
    pub return_type: u8,
    pub time_stamp: f64,
}

impl SensorPoint {
    pub fn new(
        x: f32,
        y: f32,
        z: f32,
        intensity: f32,
        ring: u16,
        azimuth: f32,
        distance: f32,
    ) -> Self {
        Self {
            x,
            y,
            z,
            intensity,
            ring,
            azimuth,
            elevation: 0.0,
            distance,
            return_type: 0,
            time_stamp: 0.0,
        }
    }

    /// A return in the horizontal plane at `azimuth` centidegrees and
    /// `distance` metres.
    pub fn polar(ring: u16, azimuth: f32, distance: f32) -> Self {
        let theta = (azimuth / 100.0).to_radians();
        Self::new(
            distance * theta.cos(),
            distance * theta.sin(),
            0.0,
            0.0,
            ring,
            azimuth,
            distance,
        )
    }
}

/// Pack `points` into a single-row `PointXYZIRADRT` cloud in `frame_id`.
pub fn encode_sensor_cloud(frame_id: &str, points: &[SensorPoint], big_endian: bool) -> PointCloud {
    let step = XYZIRADRT_POINT_STEP as usize;
    let mut data = vec![0u8; points.len() * step];

    for (record, p) in data.chunks_exact_mut(step).zip(points) {
        let mut put = |offset: usize, le: &[u8], be: &[u8]| {
            let bytes = if big_endian { be } else { le };
            record[offset..offset + bytes.len()].copy_from_slice(bytes);
        };
        put(0, &p.x.to_le_bytes(), &p.x.to_be_bytes());
        put(4, &p.y.to_le_bytes(), &p.y.to_be_bytes());
        put(8, &p.z.to_le_bytes(), &p.z.to_be_bytes());
        put(12, &p.intensity.to_le_bytes(), &p.intensity.to_be_bytes());
        put(16, &p.ring.to_le_bytes(), &p.ring.to_be_bytes());
        put(20, &p.azimuth.to_le_bytes(), &p.azimuth.to_be_bytes());
        put(24, &p.elevation.to_le_bytes(), &p.elevation.to_be_bytes());
        put(28, &p.distance.to_le_bytes(), &p.distance.to_be_bytes());
        put(32, &[p.return_type], &[p.return_type]);
        put(40, &p.time_stamp.to_le_bytes(), &p.time_stamp.to_be_bytes());
    }

    PointCloud {
        header: CloudHeader {
            frame_id: frame_id.to_string(),
            stamp: Utc::now(),
        },
        height: 1,
        width: points.len() as u32,
        fields: xyziradrt_fields(),
        is_bigendian: big_endian,
        point_step: XYZIRADRT_POINT_STEP,
        row_step: XYZIRADRT_POINT_STEP * points.len() as u32,
        data,
        is_dense: true,
    }
}
