//! # Validate Subcommand
//!
//! `shape validate --schema <file> --data <file>` compiles the schema,
//! validates the data and reports the result envelope as JSON. With
//! `--assert`, a valid document prints the (transformed) data alone and
//! an invalid one prints the failure.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::{json, Value};
use shape_core::{MatcherOptions, Schema, ValidatorOptions};
use shape_validator::{get_asserting_validator, get_validator, ValidatorError};

use crate::input::{load_config, load_document};

/// Arguments for the validate subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Schema document (JSON or YAML).
    #[arg(long)]
    pub schema: PathBuf,

    /// Document to validate (JSON or YAML).
    #[arg(long)]
    pub data: PathBuf,

    /// Validator configuration file (`matcher`, `keywords`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable an extension keyword. May be repeated.
    #[arg(long = "keyword", value_name = "NAME")]
    pub keywords: Vec<String>,

    /// Drop undeclared properties of closed objects instead of reporting them.
    #[arg(long)]
    pub remove_additional: bool,

    /// Print only the data on success and fail on invalid input.
    #[arg(long)]
    pub assert: bool,

    /// Failure message used with `--assert`.
    #[arg(long, requires = "assert")]
    pub message: Option<String>,
}

/// What the subcommand prints, and whether the document passed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidateReport {
    /// JSON printed to stdout.
    pub output: Value,
    /// `true` when the document is valid.
    pub valid: bool,
}

/// Build the validator options from the configuration file and flags.
/// Flags override the file.
///
/// # Errors
///
/// Fails if the configuration file cannot be loaded.
pub fn options_from_args(args: &ValidateArgs) -> anyhow::Result<ValidatorOptions> {
    let mut options = match &args.config {
        Some(path) => ValidatorOptions::from(load_config(path)?),
        None => ValidatorOptions::new(),
    };
    for keyword in &args.keywords {
        options = options.with_keyword(keyword.clone());
    }
    if args.remove_additional {
        let flags = MatcherOptions {
            remove_additional: Some(true),
            ..MatcherOptions::default()
        };
        options.matcher = options.matcher.overlay(&flags);
    }
    Ok(options)
}

/// Execute the validate subcommand.
///
/// # Errors
///
/// Fails on unreadable inputs, schemas that do not compile, and transform
/// failures. Invalid data is not an error; it yields `valid: false`.
pub fn run_validate(args: &ValidateArgs) -> anyhow::Result<ValidateReport> {
    let schema = Schema::from_value(load_document(&args.schema)?)
        .with_context(|| format!("{} is not a schema object", args.schema.display()))?;
    let data = load_document(&args.data)?;
    let options = options_from_args(args)?;

    if args.assert {
        let validator = get_asserting_validator(&schema, args.message.as_deref(), Some(options))
            .context("cannot compile schema")?;
        return match validator.validate(data) {
            Ok(output) => Ok(ValidateReport { output, valid: true }),
            Err(ValidatorError::ValidationFailed { message, errors }) => {
                tracing::info!(errors = errors.len(), "document rejected");
                Ok(ValidateReport {
                    output: json!({ "message": message, "errors": errors }),
                    valid: false,
                })
            }
            Err(err) => Err(err.into()),
        };
    }

    let validator = get_validator(&schema, Some(options)).context("cannot compile schema")?;
    let outcome = validator.validate(data)?;
    tracing::info!(valid = outcome.valid, "document validated");
    Ok(ValidateReport {
        valid: outcome.valid,
        output: serde_json::to_value(&outcome)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn args(dir: &Path, data: &str) -> ValidateArgs {
        ValidateArgs {
            schema: write(
                dir,
                "schema.yaml",
                "type: object\nproperties:\n  a:\n    type: number\nrequired: [a]\nadditionalProperties: false\n",
            ),
            data: write(dir, "data.json", data),
            ..ValidateArgs::default()
        }
    }

    #[test]
    fn test_valid_document_prints_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_validate(&args(dir.path(), r#"{"a": 1}"#)).unwrap();
        assert!(report.valid);
        assert_eq!(report.output, json!({"valid": true, "errors": null, "data": {"a": 1}}));
    }

    #[test]
    fn test_invalid_document_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_validate(&args(dir.path(), r#"{"b": 1}"#)).unwrap();
        assert!(!report.valid);
        assert_eq!(report.output["valid"], json!(false));
        assert!(report.output["errors"].as_array().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn test_remove_additional_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(dir.path(), r#"{"a": 1, "b": 2}"#);
        a.remove_additional = true;
        let report = run_validate(&a).unwrap();
        assert!(report.valid);
        assert_eq!(report.output["data"], json!({"a": 1}));
    }

    #[test]
    fn test_assert_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(dir.path(), r#"{"a": 1}"#);
        a.assert = true;
        assert_eq!(run_validate(&a).unwrap().output, json!({"a": 1}));

        let mut a = args(dir.path(), "{}");
        a.assert = true;
        a.message = Some("rejected".to_string());
        let report = run_validate(&a).unwrap();
        assert!(!report.valid);
        assert_eq!(report.output["message"], json!("rejected"));
    }

    #[test]
    fn test_config_and_keyword_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "config.json", r#"{"keywords": ["anyRequired"]}"#);
        let a = ValidateArgs {
            config: Some(config),
            keywords: vec!["prohibited".to_string()],
            remove_additional: true,
            ..args(dir.path(), "{}")
        };
        let options = options_from_args(&a).unwrap();
        assert_eq!(options.keywords, vec!["anyRequired".to_string(), "prohibited".to_string()]);
        assert_eq!(options.matcher.remove_additional, Some(true));
    }

    #[test]
    fn test_unknown_keyword_fails() {
        let dir = tempfile::tempdir().unwrap();
        let a = ValidateArgs {
            keywords: vec!["regexp".to_string()],
            ..args(dir.path(), "{}")
        };
        let err = run_validate(&a).unwrap_err();
        assert!(format!("{err:#}").contains("regexp"));
    }

    #[test]
    fn test_non_object_schema_fails() {
        let dir = tempfile::tempdir().unwrap();
        let a = ValidateArgs {
            schema: write(dir.path(), "schema.json", "[1, 2]"),
            data: write(dir.path(), "data.json", "1"),
            ..ValidateArgs::default()
        };
        assert!(run_validate(&a).is_err());
    }
}
