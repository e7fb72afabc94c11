//! Error classification shared by every layer.

use serde::{Deserialize, Serialize};

/// Coarse classification of a failure, independent of where it was raised.
///
/// Callers branch on the kind (e.g. to map to a response status or decide
/// whether to retry) instead of matching on concrete error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or out-of-range input, caught before any mutation.
    Validation,

    /// The input was well formed but violates an aggregate invariant or
    /// requests a disallowed transition.
    BusinessRule,

    /// The addressed aggregate does not exist.
    NotFound,

    /// Duplicate name, or a version mismatch detected by persistence.
    Conflict,

    /// A collaborator (persistence, transport) failed.
    Infrastructure,
}

impl ErrorKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::BusinessRule => "business_rule",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
