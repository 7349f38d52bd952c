//! Raw scan files.
//!
//! Input scans are headerless dumps of `PointXYZIRADRT` records (48 bytes
//! each).  Filtered clouds are written the same way as packed
//! `{x, y, z, intensity}` records, and the visibility grid as a binary PGM
//! image with one row per ring.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use ringsieve_perception::VisibilityReport;
use ringsieve_types::{CloudHeader, PointCloud, XYZIRADRT_POINT_STEP, xyziradrt_fields};

/// Read a raw `PointXYZIRADRT` dump into a single-row cloud.
pub fn read_scan(path: &Path, frame_id: &str, big_endian: bool) -> Result<PointCloud, String> {
    let data =
        fs::read(path).map_err(|e| format!("Failed to read scan at {}: {}", path.display(), e))?;
    scan_from_bytes(data, frame_id, big_endian)
}

pub(crate) fn scan_from_bytes(
    data: Vec<u8>,
    frame_id: &str,
    big_endian: bool,
) -> Result<PointCloud, String> {
    let step = XYZIRADRT_POINT_STEP as usize;
    if data.len() % step != 0 {
        return Err(format!(
            "Scan is {} bytes, not a whole number of {}-byte records",
            data.len(),
            step
        ));
    }
    let width = u32::try_from(data.len() / step)
        .map_err(|_| format!("Scan of {} bytes is too large", data.len()))?;

    Ok(PointCloud {
        header: CloudHeader {
            frame_id: frame_id.to_string(),
            stamp: Utc::now(),
        },
        height: 1,
        width,
        fields: xyziradrt_fields(),
        is_bigendian: big_endian,
        point_step: XYZIRADRT_POINT_STEP,
        row_step: width * XYZIRADRT_POINT_STEP,
        data,
        is_dense: true,
    })
}

/// Write the packed records of `cloud`.
pub fn write_cloud(path: &Path, cloud: &PointCloud) -> Result<(), String> {
    fs::write(path, &cloud.data)
        .map_err(|e| format!("Failed to write cloud at {}: {}", path.display(), e))
}

/// Write the occupancy grid as a binary (P5) PGM image.
pub fn write_grid(path: &Path, report: &VisibilityReport) -> Result<(), String> {
    let mut image = Vec::with_capacity(report.occupancy.len() + 32);
    write!(
        image,
        "P5\n{} {}\n255\n",
        report.horizontal_bins, report.vertical_bins
    )
    .map_err(|e| e.to_string())?;
    image.extend_from_slice(&report.occupancy);
    fs::write(path, image)
        .map_err(|e| format!("Failed to write grid at {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringsieve_perception::sensor::{SensorPoint, encode_sensor_cloud};
    use ringsieve_perception::{FilterConfig, RingOutlierFilter};

    #[test]
    fn raw_dump_reads_back_as_sensor_cloud() {
        let points: Vec<_> = (0..5)
            .map(|i| SensorPoint::polar(2, i as f32 * 50.0, 4.0))
            .collect();
        let encoded = encode_sensor_cloud("lidar", &points, false);

        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("scan.bin");
        fs::write(&path, &encoded.data).expect("write");

        let scan = read_scan(&path, "lidar", false).expect("read");
        assert_eq!(scan.width, 5);
        assert_eq!(scan.point_step, 48);
        assert_eq!(scan.fields, encoded.fields);
        assert_eq!(scan.data, encoded.data);
    }

    #[test]
    fn truncated_dump_is_rejected() {
        let err = scan_from_bytes(vec![0u8; 50], "lidar", false).unwrap_err();
        assert!(err.contains("48-byte"));
    }

    #[test]
    fn empty_dump_is_an_empty_scan() {
        let scan = scan_from_bytes(Vec::new(), "lidar", false).expect("empty ok");
        assert_eq!(scan.width, 0);
        assert_eq!(scan.row_step, 0);
    }

    #[test]
    fn grid_is_written_as_pgm() {
        let cfg = FilterConfig {
            publish_noise_points: true,
            vertical_bins: 4,
            ..FilterConfig::default()
        };
        let scan = encode_sensor_cloud("lidar", &[SensorPoint::polar(0, 0.0, 3.0)], false);
        let report = RingOutlierFilter::new(cfg)
            .unwrap()
            .filter(&scan, None)
            .unwrap()
            .visibility
            .unwrap();

        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("grid.pgm");
        write_grid(&path, &report).expect("write");

        let bytes = fs::read(&path).expect("read");
        let header = b"P5\n36 4\n255\n";
        assert!(bytes.starts_with(header));
        assert_eq!(bytes.len(), header.len() + 36 * 4);
    }
}
