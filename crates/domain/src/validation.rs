//! Structured field validation.
//!
//! Commands and composite value objects validate themselves explicitly and
//! report every violated field at once instead of stopping at the first one.

use serde::{Deserialize, Serialize};

/// A single violated constraint on an input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the offending field, e.g. `settings.abTest.variants[1].weight`.
    pub field: String,

    /// Human-readable description of the violated constraint.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// An ordered list of field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty error list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list holding exactly one error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a violated constraint.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Appends every error of `other`, prefixing its field paths with `prefix`.
    pub fn merge_nested(&mut self, prefix: &str, other: ValidationErrors) {
        for error in other.errors {
            let field = if error.field.is_empty() {
                prefix.to_string()
            } else if error.field.starts_with('[') {
                format!("{prefix}{}", error.field)
            } else {
                format!("{prefix}.{}", error.field)
            };
            self.errors.push(FieldError::new(field, error.message));
        }
    }

    /// Returns true when no constraint was violated.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Returns true if any error was recorded for exactly this field path.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Converts the collected errors into a result.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Checks that a text field is present and within `max_chars` characters.
pub(crate) fn check_required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max_chars: usize,
) {
    if value.trim().is_empty() {
        errors.add(field, "is required");
    } else {
        check_max_chars(errors, field, value, max_chars);
    }
}

/// Checks that a text field is at most `max_chars` characters long.
pub(crate) fn check_max_chars(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max_chars: usize,
) {
    if value.chars().count() > max_chars {
        errors.add(field, format!("must be at most {max_chars} characters"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_errors_into_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_display_joins_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "is required");
        errors.add("budget", "must be positive");

        assert_eq!(
            errors.to_string(),
            "name: is required; budget: must be positive"
        );
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_merge_nested_prefixes_paths() {
        let mut inner = ValidationErrors::new();
        inner.add("weight", "out of range");
        inner.add("[2]", "duplicate");
        inner.add("", "invalid");

        let mut outer = ValidationErrors::new();
        outer.merge_nested("settings.abTest", inner);

        assert!(outer.has_field("settings.abTest.weight"));
        assert!(outer.has_field("settings.abTest[2]"));
        assert!(outer.has_field("settings.abTest"));
    }

    #[test]
    fn test_required_text_checks() {
        let mut errors = ValidationErrors::new();
        check_required_text(&mut errors, "name", "   ", 10);
        check_required_text(&mut errors, "title", "ééééééééééé", 10);
        check_required_text(&mut errors, "ok", "fine", 10);

        assert!(errors.has_field("name"));
        assert!(errors.has_field("title"));
        assert!(!errors.has_field("ok"));
    }
}
