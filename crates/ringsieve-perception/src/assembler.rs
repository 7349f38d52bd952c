//! Assembly of the filtered and noise clouds.
//!
//! [`CloudWriter`] owns a buffer pre-sized for the whole scan and appends
//! 16-byte `{x, y, z, intensity}` records at a running offset.
//! [`OutputAssembler`] routes each classified walk to the output writer or,
//! when noise output is enabled, to the noise writer.  Writers are truncated
//! to what was written and stamped with cloud metadata on
//! [`finish`][OutputAssembler::finish].

use ringsieve_types::{CloudHeader, PointCloud, XYZI_POINT_STEP, xyzi_fields};

use crate::classifier::Verdict;
use crate::layout::{PointRecord, ScanView};
use crate::transform::RigidTransform;
use crate::walk::Walk;

const STEP: usize = XYZI_POINT_STEP as usize;

/// Append-only writer of `{x, y, z, intensity}` records.
#[derive(Debug)]
pub struct CloudWriter {
    data: Vec<u8>,
    written: usize,
    big_endian: bool,
}

impl CloudWriter {
    /// Writer with room for `max_points` records in the given byte order.
    pub fn with_capacity(max_points: usize, big_endian: bool) -> Self {
        Self {
            data: vec![0u8; max_points * STEP],
            written: 0,
            big_endian,
        }
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.written / STEP
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Append `point`, transformed when `transform` is given.  Intensity is
    /// copied unchanged.
    ///
    /// # Panics
    ///
    /// Panics when more records are pushed than the writer was sized for.
    pub fn push(&mut self, point: &PointRecord<'_>, transform: Option<&RigidTransform>) {
        let position = point.position();
        let [x, y, z] = match transform {
            Some(tf) => tf.apply(position),
            None => position,
        };
        let record = &mut self.data[self.written..self.written + STEP];
        for (slot, value) in record.chunks_exact_mut(4).zip([x, y, z, point.intensity()]) {
            let bytes = if self.big_endian {
                value.to_be_bytes()
            } else {
                value.to_le_bytes()
            };
            slot.copy_from_slice(&bytes);
        }
        self.written += STEP;
    }

    /// Truncate to the written records and wrap them in a single-row cloud.
    pub fn finish(mut self, header: CloudHeader, is_dense: bool) -> PointCloud {
        self.data.truncate(self.written);
        let width = (self.data.len() / STEP) as u32;
        PointCloud {
            header,
            height: 1,
            width,
            fields: xyzi_fields(),
            is_bigendian: self.big_endian,
            point_step: XYZI_POINT_STEP,
            row_step: width * XYZI_POINT_STEP,
            data: self.data,
            is_dense,
        }
    }
}

/// Routes classified walks into the output and (optional) noise writers.
#[derive(Debug)]
pub struct OutputAssembler<'t> {
    transform: Option<&'t RigidTransform>,
    output: CloudWriter,
    noise: Option<CloudWriter>,
}

impl<'t> OutputAssembler<'t> {
    /// Assembler for a scan of `max_points` records.  The noise writer is only
    /// allocated when `with_noise` is set.
    pub fn new(
        max_points: usize,
        big_endian: bool,
        with_noise: bool,
        transform: Option<&'t RigidTransform>,
    ) -> Self {
        Self {
            transform,
            output: CloudWriter::with_capacity(max_points, big_endian),
            noise: with_noise.then(|| CloudWriter::with_capacity(max_points, big_endian)),
        }
    }

    /// Copy every point of `walk` to the writer selected by `verdict`.
    /// Rejected walks are discarded when no noise writer exists.
    pub fn emit(&mut self, view: &ScanView<'_>, ring: &[usize], walk: Walk, verdict: Verdict) {
        let writer = match verdict {
            Verdict::Cluster => &mut self.output,
            Verdict::Noise => match self.noise.as_mut() {
                Some(noise) => noise,
                None => return,
            },
        };
        for position in walk.positions() {
            writer.push(&view.point(ring[position]), self.transform);
        }
    }

    pub fn output_len(&self) -> usize {
        self.output.len()
    }

    pub fn noise_len(&self) -> Option<usize> {
        self.noise.as_ref().map(CloudWriter::len)
    }

    /// Finish both writers.  Clouds are stamped with the transform's target
    /// frame when a transform was applied, else with `header`'s frame.
    pub fn finish(self, header: &CloudHeader, is_dense: bool) -> (PointCloud, Option<PointCloud>) {
        let header = CloudHeader {
            frame_id: self
                .transform
                .map_or_else(|| header.frame_id.clone(), |tf| tf.target_frame.clone()),
            stamp: header.stamp,
        };
        let noise = self.noise.map(|w| w.finish(header.clone(), is_dense));
        (self.output.finish(header, is_dense), noise)
    }
}
