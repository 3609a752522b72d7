//! Validation of configuration values
//!
//! Every config section implements `ConfigSection`; `Validator` holds the
//! checks the sections share.

pub use crate::error::ValidationError;

/// A section of the config file
pub trait ConfigSection: Default {
    /// Validates the section, returning every problem found
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another section into this one; values from `other` win
    fn merge(&mut self, other: Self);

    /// Name of the TOML table holding this section
    fn section_name(&self) -> &'static str;
}

/// Shared field checks
pub struct Validator;

impl Validator {
    /// Value must lie within `min..=max`
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ));
        }
        Ok(())
    }

    /// String must contain something other than whitespace
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new(field, "must not be empty"));
        }
        Ok(())
    }

    /// String must not contain whitespace
    pub fn no_whitespace(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.chars().any(char::is_whitespace) {
            return Err(ValidationError::with_value(field, "must not contain whitespace", value));
        }
        Ok(())
    }

    /// `lower` must not exceed `upper`
    pub fn ordered<T>(lower: T, upper: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if lower > upper {
            return Err(ValidationError::with_value(
                field,
                format!("must not exceed {}", upper),
                lower,
            ));
        }
        Ok(())
    }

    /// Folds individual results into one
    pub fn collect_errors(results: Vec<Result<(), ValidationError>>) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(Result::err).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
