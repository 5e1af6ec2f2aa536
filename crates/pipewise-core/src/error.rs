//! Schema and validation error types.

use std::fmt;

use strum::IntoStaticStr;
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Node implementations report domain failures through this type; the
/// runtime wraps it together with the name of the failing node.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for schema declaration operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while declaring a schema, before any value is validated.
#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SchemaError {
    /// The type token is not part of the supported set.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A `dict[K, V]` token did not contain exactly two type arguments.
    #[error("invalid dict type specification: {0}")]
    InvalidDictSpec(String),

    /// The same field name was declared twice in one schema.
    #[error("duplicate field: {0}")]
    DuplicateField(String),

    /// The schema is not a mapping of field names to type tokens.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

/// The reason a single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// A declared field is absent.
    Missing,
    /// The value has the wrong JSON kind for the declared type.
    TypeMismatch {
        /// The declared type token.
        expected: String,
        /// The JSON kind that was found.
        found: &'static str,
    },
    /// A mapping was expected (record or dict) but something else was found.
    NotAnObject {
        /// The JSON kind that was found.
        found: &'static str,
    },
    /// A dict key could not be read as the declared key type.
    InvalidKey {
        /// The declared key type token.
        expected: String,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("field required"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::NotAnObject { found } => write!(f, "expected an object, found {found}"),
            Self::InvalidKey { expected } => write!(f, "key is not a valid {expected}"),
        }
    }
}

/// A single failed check, located by its path inside the validated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted/indexed path, e.g. `items[2]` or `meta.score`. Empty for the root.
    pub path: String,
    /// What went wrong.
    pub kind: ViolationKind,
}

impl FieldViolation {
    pub(crate) fn new(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

/// A value did not match a synthesized record type.
///
/// Carries every violation found in the value, not only the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    /// Name of the record type the value was validated against.
    pub record: String,
    /// All violations, in field declaration order.
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Returns whether some violation is located at `path`.
    pub fn has_violation_at(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.violations.len();
        let noun = if count == 1 { "error" } else { "errors" };
        write!(f, "{count} validation {noun} for {}", self.record)?;
        for violation in &self.violations {
            write!(f, "; {violation}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let error = ValidationError {
            record: "ReviewOutput".into(),
            violations: vec![
                FieldViolation::new("score", ViolationKind::Missing),
                FieldViolation::new(
                    "tags[1]",
                    ViolationKind::TypeMismatch {
                        expected: "str".into(),
                        found: "number",
                    },
                ),
            ],
        };

        assert_eq!(
            error.to_string(),
            "2 validation errors for ReviewOutput; score: field required; \
             tags[1]: expected str, found number"
        );
        assert!(error.has_violation_at("tags[1]"));
        assert!(!error.has_violation_at("tags"));
    }

    #[test]
    fn root_violation_is_labelled() {
        let violation = FieldViolation::new("", ViolationKind::NotAnObject { found: "string" });
        assert_eq!(violation.to_string(), "<root>: expected an object, found string");
    }

    #[test]
    fn schema_error_kind_names() {
        let kind: &'static str = SchemaError::UnsupportedType("set".into()).into();
        assert_eq!(kind, "unsupported_type");
    }
}
