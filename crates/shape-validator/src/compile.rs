//! # Validator Compiler
//!
//! [`get_validator`] turns a [`Schema`] into a reusable [`Validator`]:
//!
//! 1. merge the [`ValidatorConfig`] found in the schema's metadata with the
//!    explicit options (explicit wins),
//! 2. build the class registry and check every `instanceOf` and
//!    `transform` identifier in the document,
//! 3. register the custom keywords and compile the structural matcher,
//! 4. compile the transform plan.
//!
//! A [`Validator`] is immutable and `Send + Sync`; each call threads its
//! own value through the pipeline, so concurrent calls are independent.

use std::sync::Arc;

use jsonschema::{Retrieve, Uri};
use serde_json::Value;
use shape_core::{get_metadata, Draft, MatcherOptions, Schema, ValidatorConfig, ValidatorOptions};

use crate::error::{CompileError, ValidatorError};
use crate::keywords::{names_of, register, resolve_extensions, Extension};
use crate::outcome::{ValidationIssue, ValidationOutcome};
use crate::plan::Plan;
use crate::registry::ClassRegistry;
use crate::walk::{for_each_schema, unescape_token};
use crate::Matcher;

/// A compiled schema.
pub struct Validator {
    matcher: Matcher,
    plan: Plan,
    options: MatcherOptions,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("schema", self.plan.document())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Compile `schema` with `options` overlaid on the options attached to it.
///
/// # Errors
///
/// Returns [`CompileError`] for unknown transform, class or keyword
/// identifiers, malformed custom keyword values, and schemas the matcher
/// rejects.
pub fn get_validator(
    schema: &Schema,
    options: Option<ValidatorOptions>,
) -> Result<Validator, CompileError> {
    let options = ValidatorOptions::merged(get_metadata::<ValidatorConfig>(schema), options.as_ref());
    let registry = Arc::new(ClassRegistry::build(&options, schema));
    let extensions = resolve_extensions(&options.keywords)?;
    let document = schema.to_value();

    check_identifiers(schema, &document, &options, &registry)?;

    let matcher = build_matcher(&document, &options.matcher, &extensions, &registry)?;
    let plan = Plan::compile(
        schema,
        document,
        &options.transforms,
        options.matcher.verbose(),
        |branch| build_matcher(branch, &options.matcher, &extensions, &registry),
    )?;

    tracing::debug!(
        classes = registry.len(),
        keywords = extensions.len(),
        transforms = plan.transform_nodes(),
        "compiled validator"
    );

    Ok(Validator {
        matcher,
        plan,
        options: options.matcher,
    })
}

impl Validator {
    /// Validate `value`, running transforms along the way.
    ///
    /// Validation failures are reported in the returned outcome. The
    /// structural checks see the value as given; `data` is the value after
    /// transforms.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::TransformFailed`] when a transform or
    /// constructor fails.
    pub fn validate(&self, value: Value) -> Result<ValidationOutcome, ValidatorError> {
        let mut value = value;
        if self.options.remove_additional() {
            self.plan.prune(&mut value);
        }

        let verbose = self.options.verbose();
        let mut issues: Vec<ValidationIssue> = self
            .matcher
            .iter_errors(&value)
            .map(|e| structural_issue(&e, self.plan.document(), verbose))
            .collect();

        let data = self.plan.apply(value, &mut issues)?;
        if !self.options.all_errors() {
            issues.truncate(1);
        }

        tracing::debug!(valid = issues.is_empty(), errors = issues.len(), "validated value");
        Ok(ValidationOutcome::new(issues, data))
    }

    /// Whether `value` passes, discarding the transformed data.
    ///
    /// # Errors
    ///
    /// As for [`validate`](Self::validate).
    pub fn is_valid(&self, value: Value) -> Result<bool, ValidatorError> {
        Ok(self.validate(value)?.valid)
    }

    /// The compiled schema document.
    pub fn schema(&self) -> &Value {
        self.plan.document()
    }

    /// The effective matcher options.
    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// Refuses every remote reference. Only local `#/...` references resolve.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("remote schema references are not supported: {}", uri.as_str()).into())
    }
}

fn draft(draft: Draft) -> jsonschema::Draft {
    match draft {
        Draft::Draft4 => jsonschema::Draft::Draft4,
        Draft::Draft6 => jsonschema::Draft::Draft6,
        Draft::Draft7 => jsonschema::Draft::Draft7,
        Draft::Draft201909 => jsonschema::Draft::Draft201909,
        Draft::Draft202012 => jsonschema::Draft::Draft202012,
    }
}

fn build_matcher(
    document: &Value,
    options: &MatcherOptions,
    extensions: &[Extension],
    registry: &Arc<ClassRegistry>,
) -> Result<Matcher, CompileError> {
    let mut opts = jsonschema::options();
    opts.with_draft(draft(options.draft()));
    opts.should_validate_formats(options.validate_formats.unwrap_or(false));
    opts.with_retriever(OfflineRetriever);
    register(&mut opts, extensions, registry);
    opts.build(document).map_err(|e| CompileError::Build {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Identifier checks
// ---------------------------------------------------------------------------

/// Every `instanceOf` class and `transform` function named anywhere in
/// the document must resolve, reachable or not.
fn check_identifiers(
    schema: &Schema,
    document: &Value,
    options: &ValidatorOptions,
    registry: &ClassRegistry,
) -> Result<(), CompileError> {
    for_each_schema(document, &mut |pointer, node| {
        if let Some(value) = node.get("instanceOf") {
            let names = names_of(value).ok_or_else(|| CompileError::InvalidKeyword {
                keyword: "instanceOf".to_string(),
                pointer: pointer.to_string(),
                reason: "expected a class name or a list of names".to_string(),
            })?;
            if let Some(name) = names.into_iter().find(|name| !registry.contains(name)) {
                return Err(CompileError::UnknownClass {
                    name,
                    pointer: pointer.to_string(),
                });
            }
        }

        if let Some(value) = node.get("transform") {
            let names = match value {
                Value::Array(_) => names_of(value),
                _ => None,
            }
            .ok_or_else(|| CompileError::InvalidKeyword {
                keyword: "transform".to_string(),
                pointer: pointer.to_string(),
                reason: "expected a list of transform names".to_string(),
            })?;
            let local = schema
                .metadata_at(pointer)
                .and_then(|meta| meta.get::<shape_core::Transforms>());
            for name in names {
                let known = options.transforms.contains_key(&name)
                    || local.is_some_and(|table| table.contains_key(&name));
                if !known {
                    return Err(CompileError::UnknownTransform {
                        name,
                        pointer: pointer.to_string(),
                    });
                }
            }
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Structural issues
// ---------------------------------------------------------------------------

fn structural_issue(
    error: &jsonschema::ValidationError<'_>,
    document: &Value,
    verbose: bool,
) -> ValidationIssue {
    let schema_path = error.schema_path.to_string();
    let (parent_path, keyword) = match schema_path.rsplit_once('/') {
        Some((parent, last)) => (parent, unescape_token(last)),
        None => ("", String::new()),
    };
    ValidationIssue {
        keyword,
        instance_path: error.instance_path.to_string(),
        schema_path: schema_path.clone(),
        message: error.to_string(),
        params: None,
        schema: verbose.then(|| document.pointer(&schema_path).cloned()).flatten(),
        parent_schema: verbose.then(|| document.pointer(parent_path).cloned()).flatten(),
        data: verbose.then(|| error.instance.clone().into_owned()),
    }
}
