//! Domain types for measurements
//!
//! - `point`: marker positions
//! - `kind`: measurement kinds and the tag registry
//! - `measurement`: measurements with server identity
//! - `snapshot`: images attached to a measurement

mod kind;
mod measurement;
mod point;
mod snapshot;

pub use kind::{KindDescriptor, KindRegistry, MarkerRequirement};
pub use measurement::{Measurement, MeasurementId, MeasurementRecord, MeasurementRef, UNASSIGNED_ID};
pub use point::Point3;
pub use snapshot::{Snapshot, SnapshotId, SnapshotRef};
