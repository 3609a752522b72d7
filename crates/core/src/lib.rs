//! Domain model for MeasVRe measurements
//!
//! Measurements are derived values (distance, angle, area, trace, volume)
//! taken from user-placed 3D markers. Snapshots are images attached to a
//! single measurement. Both carry a local identity that is stable for the
//! lifetime of the object and a server identity assigned on first upload.

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{
    KindDescriptor, KindRegistry, MarkerRequirement, Measurement, MeasurementId, MeasurementRecord,
    MeasurementRef, Point3, Snapshot, SnapshotId, SnapshotRef, UNASSIGNED_ID,
};
