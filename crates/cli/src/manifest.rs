// FILE: crates/cli/src/manifest.rs
//! JSON description of measurements to push
//!
//! ```json
//! {
//!   "scale": 1.0,
//!   "measurements": [
//!     { "kind": "Distance", "markers": [[0, 0, 0], [3, 4, 0]], "snapshots": ["wall.png"] },
//!     { "kind": "Area", "markers": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "value": 0.5 }
//!   ]
//! }
//! ```
//!
//! Snapshot paths are relative to the manifest file.

use anyhow::{bail, Context, Result};
use measvre_core::{KindRegistry, Measurement, MeasurementRef, Point3};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// World-to-real scale factor applied by the built-in evaluators
    #[serde(default = "default_scale")]
    pub scale: f64,
    pub measurements: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub kind: String,
    pub markers: Vec<[f64; 3]>,
    /// Explicit value; required for kinds without an evaluator
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub snapshots: Vec<PathBuf>,
}

/// A measurement ready to be added, with its encoded snapshots
pub struct PreparedMeasurement {
    pub measurement: MeasurementRef,
    pub snapshots: Vec<Vec<u8>>,
}

fn default_scale() -> f64 {
    1.0
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid measurement file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(contents)?;
        if !manifest.scale.is_finite() || manifest.scale <= 0.0 {
            bail!("scale must be a positive number, got {}", manifest.scale);
        }
        Ok(manifest)
    }

    /// Builds measurements against `registry`, reading snapshots relative to `base_dir`
    pub fn prepare(&self, registry: &KindRegistry, base_dir: &Path) -> Result<Vec<PreparedMeasurement>> {
        self.measurements
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry
                    .prepare(registry, self.scale, base_dir)
                    .with_context(|| format!("measurement #{}", index + 1))
            })
            .collect()
    }
}

impl ManifestEntry {
    fn prepare(&self, registry: &KindRegistry, scale: f64, base_dir: &Path) -> Result<PreparedMeasurement> {
        let kind = registry.resolve(&self.kind)?.clone();
        let markers: Vec<Point3> = self.markers.iter().copied().map(Point3::from).collect();

        let measurement = match self.value {
            Some(value) => Measurement::new(kind, markers, value)?,
            None => Measurement::measure(kind, markers, scale)
                .with_context(|| format!("{} needs an explicit value", self.kind))?,
        };

        let snapshots = self
            .snapshots
            .iter()
            .map(|path| {
                let full = base_dir.join(path);
                std::fs::read(&full).with_context(|| format!("Failed to read snapshot {}", full.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PreparedMeasurement {
            measurement,
            snapshots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_defaults() {
        let manifest = Manifest::parse(r#"{"measurements": []}"#).unwrap();
        assert_eq!(manifest.scale, 1.0);
        assert!(manifest.measurements.is_empty());
    }

    #[test]
    fn test_negative_scale_rejected() {
        assert!(Manifest::parse(r#"{"scale": -2, "measurements": []}"#).is_err());
    }

    #[test]
    fn test_prepare_evaluates_values() {
        let manifest = Manifest::parse(
            r#"{"scale": 2.0, "measurements": [
                {"kind": "Distance", "markers": [[0,0,0],[3,4,0]]}
            ]}"#,
        )
        .unwrap();

        let prepared = manifest
            .prepare(&KindRegistry::with_builtins(), Path::new("."))
            .unwrap();
        assert_eq!(prepared.len(), 1);
        assert!((prepared[0].measurement.value() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_kind_without_evaluator_needs_value() {
        let manifest = Manifest::parse(
            r#"{"measurements": [{"kind": "Area", "markers": [[0,0,0],[1,0,0],[0,1,0]]}]}"#,
        )
        .unwrap();
        let registry = KindRegistry::with_builtins();
        assert!(manifest.prepare(&registry, Path::new(".")).is_err());

        let manifest = Manifest::parse(
            r#"{"measurements": [{"kind": "Area", "markers": [[0,0,0],[1,0,0],[0,1,0]], "value": 0.5}]}"#,
        )
        .unwrap();
        let prepared = manifest.prepare(&registry, Path::new(".")).unwrap();
        assert_eq!(prepared[0].measurement.value(), 0.5);
    }

    #[test]
    fn test_unknown_kind_and_bad_marker_count() {
        let registry = KindRegistry::with_builtins();

        let unknown = Manifest::parse(r#"{"measurements": [{"kind": "Perimeter", "markers": []}]}"#).unwrap();
        assert!(unknown.prepare(&registry, Path::new(".")).is_err());

        let short = Manifest::parse(r#"{"measurements": [{"kind": "Angle", "markers": [[0,0,0]]}]}"#).unwrap();
        assert!(short.prepare(&registry, Path::new(".")).is_err());
    }

    #[test]
    fn test_snapshots_read_relative_to_base() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("wall.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let manifest = Manifest::parse(
            r#"{"measurements": [
                {"kind": "Distance", "markers": [[0,0,0],[1,0,0]], "snapshots": ["wall.png"]}
            ]}"#,
        )
        .unwrap();

        let prepared = manifest
            .prepare(&KindRegistry::with_builtins(), dir.path())
            .unwrap();
        assert_eq!(prepared[0].snapshots, vec![vec![0x89, b'P', b'N', b'G']]);
    }

    #[test]
    fn test_missing_snapshot_file() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::parse(
            r#"{"measurements": [
                {"kind": "Distance", "markers": [[0,0,0],[1,0,0]], "snapshots": ["gone.png"]}
            ]}"#,
        )
        .unwrap();
        assert!(manifest.prepare(&KindRegistry::with_builtins(), dir.path()).is_err());
    }
}
