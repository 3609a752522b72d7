//! Measurement kinds and the tag registry
//!
//! Kinds are looked up by their textual tag (`"Distance"`, `"Angle"`, ...).
//! Unknown tags are rejected when the registry is consulted, so a bad tag
//! in configuration fails at startup instead of at measurement time.

use crate::error::{CoreError, CoreResult};
use crate::types::Point3;
use std::collections::HashMap;
use std::fmt;

/// How many markers a measurement kind accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRequirement {
    /// Exactly this many markers
    Exactly(usize),
    /// This many markers or more
    AtLeast(usize),
}

impl MarkerRequirement {
    /// Returns true if `count` markers satisfy the requirement
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            MarkerRequirement::Exactly(n) => count == n,
            MarkerRequirement::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for MarkerRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerRequirement::Exactly(n) => write!(f, "exactly {}", n),
            MarkerRequirement::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Computes a measurement value from its markers and a scale factor
pub type Evaluator = fn(&[Point3], f64) -> f64;

/// Describes one measurement kind
#[derive(Debug, Clone)]
pub struct KindDescriptor {
    tag: String,
    requirement: MarkerRequirement,
    evaluator: Option<Evaluator>,
}

impl KindDescriptor {
    /// Creates a kind whose value is supplied by the caller
    pub fn new(tag: impl Into<String>, requirement: MarkerRequirement) -> Self {
        Self {
            tag: tag.into(),
            requirement,
            evaluator: None,
        }
    }

    /// Attaches a built-in evaluator
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn requirement(&self) -> MarkerRequirement {
        self.requirement
    }

    /// Checks the marker count against the kind's requirement
    pub fn check_markers(&self, count: usize) -> CoreResult<()> {
        if self.requirement.accepts(count) {
            Ok(())
        } else {
            Err(CoreError::MarkerCount {
                kind: self.tag.clone(),
                expected: self.requirement.to_string(),
                actual: count,
            })
        }
    }

    /// Evaluates the kind on `markers`, if it has a built-in evaluator
    ///
    /// Hull-based kinds (area, volume) return `None`; their value comes
    /// from the external geometry library.
    pub fn evaluate(&self, markers: &[Point3], scale: f64) -> Option<f64> {
        self.evaluator.map(|f| f(markers, scale))
    }
}

impl PartialEq for KindDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.requirement == other.requirement
    }
}

fn distance(markers: &[Point3], scale: f64) -> f64 {
    markers[0].distance(&markers[1]) * scale
}

fn angle(markers: &[Point3], _scale: f64) -> f64 {
    let a = markers[0].sub(&markers[1]);
    let b = markers[2].sub(&markers[1]);
    a.angle_to(&b)
}

fn trace(markers: &[Point3], scale: f64) -> f64 {
    markers.windows(2).map(|w| w[0].distance(&w[1])).sum::<f64>() * scale
}

/// Registry mapping kind tags to their descriptors
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<String, KindDescriptor>,
}

impl KindRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in kinds
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins = [
            KindDescriptor::new("Distance", MarkerRequirement::Exactly(2)).with_evaluator(distance),
            KindDescriptor::new("Angle", MarkerRequirement::Exactly(3)).with_evaluator(angle),
            KindDescriptor::new("Area", MarkerRequirement::AtLeast(3)),
            KindDescriptor::new("Trace", MarkerRequirement::AtLeast(2)).with_evaluator(trace),
            KindDescriptor::new("Volume", MarkerRequirement::AtLeast(4)),
        ];
        for kind in builtins {
            registry.kinds.insert(kind.tag.clone(), kind);
        }
        registry
    }

    /// Registers an additional kind
    pub fn register(&mut self, kind: KindDescriptor) -> CoreResult<()> {
        if self.kinds.contains_key(kind.tag()) {
            return Err(CoreError::DuplicateKind(kind.tag.clone()));
        }
        self.kinds.insert(kind.tag.clone(), kind);
        Ok(())
    }

    /// Looks up a kind by tag
    pub fn resolve(&self, tag: &str) -> CoreResult<&KindDescriptor> {
        self.kinds
            .get(tag)
            .ok_or_else(|| CoreError::UnknownKind(tag.to_string()))
    }

    /// Returns a registry restricted to `tags`, failing on the first unknown one
    pub fn restrict_to<S: AsRef<str>>(&self, tags: &[S]) -> CoreResult<KindRegistry> {
        let mut restricted = KindRegistry::new();
        for tag in tags {
            let kind = self.resolve(tag.as_ref())?;
            restricted.kinds.insert(kind.tag.clone(), kind.clone());
        }
        Ok(restricted)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_builtins_registered() {
        let registry = KindRegistry::with_builtins();
        assert_eq!(
            registry.tags(),
            vec!["Angle", "Area", "Distance", "Trace", "Volume"]
        );
    }

    #[test]
    fn test_unknown_tag_fails() {
        let registry = KindRegistry::with_builtins();
        assert_eq!(
            registry.resolve("MeasVRe.Distance").unwrap_err(),
            CoreError::UnknownKind("MeasVRe.Distance".to_string())
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = KindRegistry::with_builtins();
        let result = registry.register(KindDescriptor::new("Distance", MarkerRequirement::Exactly(2)));
        assert!(matches!(result, Err(CoreError::DuplicateKind(_))));
    }

    #[test]
    fn test_register_custom_kind() {
        let mut registry = KindRegistry::new();
        registry
            .register(KindDescriptor::new("Perimeter", MarkerRequirement::AtLeast(3)))
            .unwrap();
        assert!(registry.resolve("Perimeter").is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_restrict_to_subset() {
        let registry = KindRegistry::with_builtins();
        let restricted = registry.restrict_to(&["Distance", "Angle"]).unwrap();
        assert_eq!(restricted.tags(), vec!["Angle", "Distance"]);
        assert!(registry.restrict_to(&["Distance", "Bogus"]).is_err());
    }

    #[test]
    fn test_marker_requirements() {
        let registry = KindRegistry::with_builtins();
        let distance = registry.resolve("Distance").unwrap();
        assert!(distance.check_markers(2).is_ok());
        assert!(distance.check_markers(3).is_err());

        let area = registry.resolve("Area").unwrap();
        assert!(area.check_markers(2).is_err());
        assert!(area.check_markers(7).is_ok());
    }

    #[test]
    fn test_builtin_evaluators() {
        let registry = KindRegistry::with_builtins();

        let d = registry.resolve("Distance").unwrap();
        assert_eq!(d.evaluate(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)], 2.5), Some(2.5));

        let a = registry.resolve("Angle").unwrap();
        let deg = a
            .evaluate(&[p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0)], 1.0)
            .unwrap();
        assert!((deg - 90.0).abs() < 1e-9);

        let t = registry.resolve("Trace").unwrap();
        let len = t
            .evaluate(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)], 1.0)
            .unwrap();
        assert_eq!(len, 2.0);

        let v = registry.resolve("Volume").unwrap();
        assert_eq!(v.evaluate(&[], 1.0), None);
    }
}
