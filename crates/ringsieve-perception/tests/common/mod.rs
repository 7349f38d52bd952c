//! Synthetic scan builder shared by the integration tests.

#![allow(dead_code)]

use ringsieve_perception::sensor::{SensorPoint, encode_sensor_cloud};
use ringsieve_types::PointCloud;

/// Accumulates returns in scan order.
#[derive(Debug, Default)]
pub struct ScanBuilder {
    points: Vec<SensorPoint>,
}

impl ScanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` returns on `ring` from `start` centidegrees in `step`
    /// increments, all at `distance` metres.  Azimuths wrap at 36000.
    pub fn arc(mut self, ring: u16, start: f32, step: f32, count: usize, distance: f32) -> Self {
        for i in 0..count {
            let azimuth = (start + step * i as f32) % 36000.0;
            self.points.push(SensorPoint::polar(ring, azimuth, distance));
        }
        self
    }

    /// A single isolated return.
    pub fn speck(mut self, ring: u16, azimuth: f32, distance: f32) -> Self {
        self.points.push(SensorPoint::polar(ring, azimuth, distance));
        self
    }

    /// Pseudo-random returns over `rings` rings, deterministic in `seed`.
    pub fn scatter(mut self, rings: u16, count: usize, seed: u64) -> Self {
        let mut state = seed.max(1);
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        for _ in 0..count {
            let ring = (next() % rings as u64) as u16;
            let azimuth = (next() % 36000) as f32;
            let distance = 1.0 + (next() % 4000) as f32 / 100.0;
            self.points.push(SensorPoint::polar(ring, azimuth, distance));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn build(&self, big_endian: bool) -> PointCloud {
        encode_sensor_cloud("velodyne", &self.points, big_endian)
    }
}

/// Decode an `{x, y, z, intensity}` output cloud.
pub fn decode_xyzi(cloud: &PointCloud) -> Vec<[f32; 4]> {
    cloud
        .data
        .chunks_exact(cloud.point_step as usize)
        .map(|record| {
            let mut out = [0.0f32; 4];
            for (i, value) in out.iter_mut().enumerate() {
                let mut b = [0u8; 4];
                b.copy_from_slice(&record[i * 4..i * 4 + 4]);
                *value = if cloud.is_bigendian {
                    f32::from_be_bytes(b)
                } else {
                    f32::from_le_bytes(b)
                };
            }
            out
        })
        .collect()
}
