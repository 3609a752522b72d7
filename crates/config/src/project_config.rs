//! Project section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Project created on the logging server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Name sent when creating a project
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "my_project".to_string(),
        }
    }
}

impl ConfigSection for ProjectConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![Validator::not_empty(&self.name, "project.name")])
    }

    fn merge(&mut self, other: Self) {
        self.name = other.name;
    }

    fn section_name(&self) -> &'static str {
        "project"
    }
}
