//! # DomainError
//!
//! Centralized error handling for the petboard core.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// A single field-level validation failure, suitable for re-rendering a
/// form next to the offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Accumulates field-level failures so a caller sees every problem in a
/// submission at once instead of the first one only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Flat `field: message` lines for plain rendering.
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Ok(()) when no failure was recorded, otherwise the accumulated set.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Field-level failures; the caller re-renders the form with them.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The operation was denied before any store call was made.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Referenced entity absent (e.g. pet, identity).
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Resource already exists (e.g. duplicate email, review slug).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (storage, notification transport).
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        DomainError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl std::fmt::Display) -> Self {
        DomainError::Internal(msg.to_string())
    }
}

/// A specialized Result type for petboard domain logic.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn collected_failures_surface_every_field() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "must not be empty");
        errors.push("age", "must be between 1 and 100");
        let err = errors.into_result().unwrap_err();
        match err {
            DomainError::Validation(v) => {
                assert!(v.contains_field("name"));
                assert!(v.contains_field("age"));
                assert_eq!(v.messages().len(), 2);
            }
            other => panic!("expected validation error, got {other}"),
        }
    }
}
