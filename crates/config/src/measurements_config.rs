//! Measurement kinds section

use crate::validation::{ConfigSection, ValidationError, Validator};
use measvre_core::{CoreResult, KindRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Measurement kinds offered to the user
///
/// Tags are resolved against the kind registry at startup; an unknown tag
/// is a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeasurementsConfig {
    pub kinds: Vec<String>,
}

impl Default for MeasurementsConfig {
    fn default() -> Self {
        Self {
            kinds: KindRegistry::with_builtins()
                .tags()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl MeasurementsConfig {
    /// Registry restricted to the configured kinds
    pub fn registry(&self) -> CoreResult<KindRegistry> {
        KindRegistry::with_builtins().restrict_to(&self.kinds)
    }
}

impl ConfigSection for MeasurementsConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = Vec::new();
        if self.kinds.is_empty() {
            results.push(Err(ValidationError::new("measurements.kinds", "must list at least one kind")));
        }

        let builtins = KindRegistry::with_builtins();
        let mut seen = HashSet::new();
        for tag in &self.kinds {
            results.push(Validator::not_empty(tag, "measurements.kinds"));
            if !seen.insert(tag.as_str()) {
                results.push(Err(ValidationError::with_value("measurements.kinds", "duplicate kind", tag)));
            }
            if builtins.resolve(tag).is_err() {
                results.push(Err(ValidationError::with_value("measurements.kinds", "unknown kind", tag)));
            }
        }
        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.kinds = other.kinds;
    }

    fn section_name(&self) -> &'static str {
        "measurements"
    }
}
