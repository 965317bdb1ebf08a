//! # Validation Results
//!
//! Every validator call returns a [`ValidationOutcome`]: a validity flag,
//! the list of failures (`None` when valid), and the resulting value,
//! which reflects any transforms that ran.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Keyword that failed, e.g. `required`, `additionalProperties`, `transform`.
    pub keyword: String,
    /// JSON Pointer to the failing value in the validated document.
    pub instance_path: String,
    /// JSON Pointer to the failing keyword in the schema.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
    /// Structured parameters, when the failing check supplied any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Value of the failing keyword (verbose mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    /// Schema node containing the failing keyword (verbose mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_schema: Option<Value>,
    /// The failing value (verbose mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Result envelope of a validator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// `true` when no check failed.
    pub valid: bool,
    /// The failures, or `None` when valid.
    pub errors: Option<Vec<ValidationIssue>>,
    /// The validated value after transforms.
    pub data: Value,
}

impl ValidationOutcome {
    pub(crate) fn new(issues: Vec<ValidationIssue>, data: Value) -> Self {
        let valid = issues.is_empty();
        Self {
            valid,
            errors: if valid { None } else { Some(issues) },
            data,
        }
    }

    /// The failures, empty when valid.
    pub fn issues(&self) -> &[ValidationIssue] {
        self.errors.as_deref().unwrap_or_default()
    }
}

/// Render issues one per line, for error messages.
pub(crate) fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issue(instance_path: &str) -> ValidationIssue {
        ValidationIssue {
            keyword: "required".to_string(),
            instance_path: instance_path.to_string(),
            schema_path: "/required".to_string(),
            message: "\"a\" is a required property".to_string(),
            params: None,
            schema: None,
            parent_schema: None,
            data: None,
        }
    }

    #[test]
    fn test_outcome_valid_has_no_errors() {
        let outcome = ValidationOutcome::new(Vec::new(), json!(1));
        assert!(outcome.valid);
        assert_eq!(outcome.errors, None);
        assert!(outcome.issues().is_empty());
    }

    #[test]
    fn test_outcome_invalid() {
        let outcome = ValidationOutcome::new(vec![issue("")], json!({}));
        assert!(!outcome.valid);
        assert_eq!(outcome.issues().len(), 1);
    }

    #[test]
    fn test_issue_display() {
        assert_eq!(issue("").to_string(), "(root): \"a\" is a required property");
        assert_eq!(issue("/x").to_string(), "/x: \"a\" is a required property");
        assert_eq!(render_issues(&[issue(""), issue("/x")]).lines().count(), 2);
    }

    #[test]
    fn test_outcome_serializes_envelope() {
        let outcome = ValidationOutcome::new(Vec::new(), json!({"a": 1}));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"valid": true, "errors": null, "data": {"a": 1}})
        );
        let invalid = ValidationOutcome::new(vec![issue("/x")], json!(null));
        let rendered = serde_json::to_value(&invalid).unwrap();
        assert_eq!(rendered["errors"][0]["keyword"], json!("required"));
        assert!(rendered["errors"][0].get("schema").is_none());
    }
}
