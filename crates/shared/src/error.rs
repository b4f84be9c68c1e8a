//! Application-wide error types.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Per-field validation messages, keyed by the request field name.
///
/// Ordered so that responses are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Creates an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless the field already has one.
    ///
    /// The first failed check for a field wins.
    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Records `message` for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Returns true if no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Number of failed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Moves every entry of `other` into `self`, keeping existing messages.
    pub fn merge(&mut self, other: Self) {
        for (field, message) in other.0 {
            self.0.entry(field).or_insert(message);
        }
    }

    /// Moves every entry of `other` into `self` under `prefix.field`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: Self) {
        for (field, message) in other.0 {
            self.0.entry(format!("{prefix}.{field}")).or_insert(message);
        }
    }

    /// Converts into `Err` when at least one field failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when it is not empty.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found, or the key can never match (< 1).
    #[error("Not found: {0}")]
    NotFound(String),

    /// One or more request fields failed validation.
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    /// Optimistic concurrency conflict.
    ///
    /// Part of the public taxonomy; no invoice operation raises it.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store call exceeded its deadline.
    #[error("Store timeout: {0}")]
    Timeout(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a validation error for a single field.
    #[must_use]
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 422,
            Self::Conflict(_) => 409,
            Self::Timeout(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_failed",
            Self::Conflict(_) => "edit_conflict",
            Self::Timeout(_) | Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Returns true if the error must not leak its detail to clients.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Database(_) | Self::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Unauthorized(String::new()).status_code(), 401);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(
            AppError::Validation(FieldErrors::new()).status_code(),
            422
        );
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(AppError::Timeout(String::new()).status_code(), 500);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Unauthorized(String::new()).error_code(),
            "unauthorized"
        );
        assert_eq!(AppError::NotFound(String::new()).error_code(), "not_found");
        assert_eq!(
            AppError::field("x", "y").error_code(),
            "validation_failed"
        );
        assert_eq!(AppError::Conflict(String::new()).error_code(), "edit_conflict");
        assert_eq!(
            AppError::Database(String::new()).error_code(),
            "internal_error"
        );
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        assert!(AppError::Database("boom".into()).is_internal());
        assert!(AppError::Timeout("3s".into()).is_internal());
        assert!(AppError::Internal("boom".into()).is_internal());
        assert!(!AppError::NotFound("invoice".into()).is_internal());
        assert!(!AppError::field("company_id", "must be provided").is_internal());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("invoice 4".into()).to_string(),
            "Not found: invoice 4"
        );
        assert_eq!(
            AppError::field("company_id", "must be provided").to_string(),
            "Validation error: company_id: must be provided"
        );
    }

    #[test]
    fn test_field_errors_first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.check(false, "page", "must be greater than zero");
        errors.check(false, "page", "must be a maximum of 10 million");
        errors.check(true, "limit", "must be greater than zero");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("page"), Some("must be greater than zero"));
        assert_eq!(errors.get("limit"), None);
    }

    #[test]
    fn test_field_errors_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.add("product_id", "must be provided");
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.get("product_id"), Some("must be provided"));
    }

    #[test]
    fn test_field_errors_merge_and_serialize() {
        let mut left = FieldErrors::new();
        left.add("b", "left");
        let mut right = FieldErrors::new();
        right.add("a", "right");
        right.add("b", "ignored");
        left.merge(right);

        let json = serde_json::to_value(&left).unwrap();
        assert_eq!(json, serde_json::json!({ "a": "right", "b": "left" }));
    }

    #[test]
    fn test_field_errors_merge_prefixed() {
        let mut item = FieldErrors::new();
        item.add("product_id", "must be provided");
        let mut errors = FieldErrors::new();
        errors.merge_prefixed("invoice_items.1", item);

        assert_eq!(
            errors.get("invoice_items.1.product_id"),
            Some("must be provided")
        );
    }
}
