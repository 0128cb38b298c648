//! Field validation primitives.
//!
//! Repositories run every applicable check before an insert or
//! update and aggregate all failures into a single `BadRequest`, so
//! the caller sees the complete list rather than only the first
//! problem. Unique indexes in the schema remain the authoritative
//! backstop under concurrent writes.

use crate::error::TrolleyError;
use crate::scope::grants;

/// One failed validation check, rendered as `"<field>: <message>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Collapse accumulated failures into one `BadRequest`, or `Ok` when
/// there are none.
pub fn aggregate(errors: Vec<ValidationError>) -> Result<(), TrolleyError> {
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(ValidationError::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(TrolleyError::BadRequest { message })
}

/// Required-field check: `None` or empty string fails.
pub fn require<'a>(
    field: &str,
    value: Option<&'a str>,
    errors: &mut Vec<ValidationError>,
) -> Option<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.push(ValidationError::new(field, "Is required"));
            None
        }
    }
}

/// A group scope must be non-empty and contain no spaces (it has to
/// survive inside a space-delimited grant list).
pub fn check_group_scope(scope: &str, errors: &mut Vec<ValidationError>) {
    if scope.contains(' ') {
        errors.push(ValidationError::new(
            "scope",
            format!("Scope '{scope}' must not contain spaces"),
        ));
    }
}

/// A user scope must consist solely of well-formed grants.
pub fn check_user_scope(scope: &str, errors: &mut Vec<ValidationError>) {
    let parsed = grants(scope).count();
    let tokens = scope.split_whitespace().count();
    if parsed != tokens {
        errors.push(ValidationError::new(
            "scope",
            format!("Scope '{scope}' contains malformed permission grants"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_joins_all_failures() {
        let errors = vec![
            ValidationError::new("name", "Is required"),
            ValidationError::new("scope", "Is required"),
        ];
        let err = aggregate(errors).unwrap_err();
        assert_eq!(err.to_string(), "name: Is required, scope: Is required");
    }

    #[test]
    fn aggregate_empty_is_ok() {
        assert!(aggregate(Vec::new()).is_ok());
    }

    #[test]
    fn require_rejects_missing_and_empty() {
        let mut errors = Vec::new();
        assert!(require("name", None, &mut errors).is_none());
        assert!(require("name", Some(""), &mut errors).is_none());
        assert_eq!(errors.len(), 2);

        let mut errors = Vec::new();
        assert_eq!(require("name", Some("x"), &mut errors), Some("x"));
        assert!(errors.is_empty());
    }

    #[test]
    fn group_scope_rejects_spaces() {
        let mut errors = Vec::new();
        check_group_scope("scope1", &mut errors);
        assert!(errors.is_empty());

        check_group_scope("two words", &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "scope");
    }

    #[test]
    fn user_scope_rejects_malformed_grants() {
        let mut errors = Vec::new();
        check_user_scope("superuser scope1:admin scope1:regular", &mut errors);
        assert!(errors.is_empty());

        check_user_scope("scope1:owner", &mut errors);
        assert_eq!(errors.len(), 1);
    }
}
