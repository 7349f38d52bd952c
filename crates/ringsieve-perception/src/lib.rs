//! `ringsieve-perception` – ring outlier filtering for spinning-LIDAR scans.
//!
//! Rain, dust and exhaust show up in a LIDAR scan as short, isolated runs of
//! returns along a laser ring.  Real surfaces produce long runs of neighbours
//! at similar range.  The filter walks each ring in scan order, groups
//! neighbouring returns into *walks*, and keeps a walk only when it is dense
//! enough or physically long enough.
//!
//! # Modules
//!
//! - [`layout`] – [`ScanView`][layout::ScanView]: validated, zero-copy access
//!   to the named fields of a packed input cloud.
//! - [`ring_table`] – [`RingTable`][ring_table::RingTable]: per-ring point
//!   buckets with bounded capacity.
//! - [`walk`] – [`Walks`][walk::Walks]: segments one ring into maximal runs of
//!   continuous neighbours.
//! - [`classifier`] – [`ClusterClassifier`][classifier::ClusterClassifier]:
//!   accepts or rejects a walk.
//! - [`assembler`] – [`OutputAssembler`][assembler::OutputAssembler]: writes
//!   accepted and rejected points into `{x, y, z, intensity}` clouds.
//! - [`roi`] and [`visibility`] –
//!   [`VisibilityHistogram`][visibility::VisibilityHistogram]: polar occupancy
//!   grid and scalar visibility score.
//! - [`transform`] – optional rigid transform applied to emitted points.
//! - [`config`] – [`FilterConfig`]: tunable parameters and their validation.
//! - [`filter`] – [`RingOutlierFilter`]: the per-scan pipeline with
//!   runtime-updatable, versioned parameters.
//! - [`sensor`] – builds XYZIRADRT scans from in-memory points.

pub mod assembler;
pub mod classifier;
pub mod config;
pub mod filter;
pub mod layout;
pub mod ring_table;
pub mod roi;
pub mod sensor;
pub mod transform;
pub mod visibility;
pub mod walk;

pub use config::{FilterConfig, RoiMode};
pub use filter::{ConfigSnapshot, FilterOutput, RingOutlierFilter, ScanStats, SharedConfig};
pub use visibility::VisibilityReport;
