//! # Shared Error Vocabulary
//!
//! Validation errors raised by domain primitives and request-shaping code.
//! Subsystem-specific errors (pipeline, archive, verification) live in
//! their own crates; this crate only defines what every layer shares.

use thiserror::Error;

/// A domain-level validation failure, carrying the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was missing or empty.
    #[error("field '{field}' must not be empty")]
    Empty {
        /// The field that failed validation.
        field: &'static str,
    },

    /// A field exceeded its maximum length.
    #[error("field '{field}' must not exceed {max} characters, got {actual}")]
    TooLong {
        /// The field that failed validation.
        field: &'static str,
        /// The maximum allowed length.
        max: usize,
        /// The provided length.
        actual: usize,
    },

    /// A field held a value outside its permitted set.
    #[error("field '{field}' has invalid value: {reason}")]
    Invalid {
        /// The field that failed validation.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Validate a free-text field: trimmed, non-empty, bounded length.
///
/// Returns the trimmed value on success.
pub fn validated_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.len() > max {
        return Err(ValidationError::TooLong {
            field,
            max,
            actual: trimmed.len(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_text_trims_and_accepts() {
        assert_eq!(validated_text("name", "  Asha  ", 64).unwrap(), "Asha");
    }

    #[test]
    fn validated_text_rejects_empty() {
        let err = validated_text("name", "   ", 64).unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "name" });
    }

    #[test]
    fn validated_text_rejects_overlong() {
        let long = "x".repeat(65);
        let err = validated_text("name", &long, 64).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 64, actual: 65, .. }));
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = ValidationError::Invalid {
            field: "status",
            reason: "unknown value".into(),
        };
        assert!(err.to_string().contains("status"));
    }
}
