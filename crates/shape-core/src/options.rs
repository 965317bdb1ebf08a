//! # Validator Configuration
//!
//! [`ValidatorOptions`] is the compile-time configuration of a validator.
//! It can be attached to a schema fragment through the metadata side
//! table (see [`Schema::with_validator_options`](crate::Schema::with_validator_options))
//! and/or passed explicitly when compiling; [`ValidatorOptions::merged`]
//! overlays the explicit options on top of the attached ones.
//!
//! The serializable part ([`ConfigFile`]: matcher options and extra
//! keywords) can be loaded from YAML or JSON files.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::class::Class;
use crate::transform::TransformTable;
use crate::util::dedupe;

/// JSON Schema dialects understood by the structural matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Draft {
    /// Draft 4.
    #[serde(rename = "draft4")]
    Draft4,
    /// Draft 6.
    #[serde(rename = "draft6")]
    Draft6,
    /// Draft 7, the dialect combinators emit.
    #[default]
    #[serde(rename = "draft7")]
    Draft7,
    /// Draft 2019-09.
    #[serde(rename = "draft2019-09")]
    Draft201909,
    /// Draft 2020-12.
    #[serde(rename = "draft2020-12")]
    Draft202012,
}

/// Tuning knobs of the structural matcher. Every field is optional so
/// that two option sets can be overlaid field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatcherOptions {
    /// Schema dialect; defaults to draft 7.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<Draft>,
    /// Enforce the `format` keyword.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_formats: Option<bool>,
    /// Report every failure (default) or stop after the first one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_errors: Option<bool>,
    /// Include `schema`, `parent_schema` and `data` in each reported issue (default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    /// Drop undeclared properties of closed objects instead of reporting them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_additional: Option<bool>,
}

impl MatcherOptions {
    /// Overlay `other` on top of `self`: fields set in `other` win.
    pub fn overlay(&self, other: &MatcherOptions) -> MatcherOptions {
        MatcherOptions {
            draft: other.draft.or(self.draft),
            validate_formats: other.validate_formats.or(self.validate_formats),
            all_errors: other.all_errors.or(self.all_errors),
            verbose: other.verbose.or(self.verbose),
            remove_additional: other.remove_additional.or(self.remove_additional),
        }
    }

    /// Effective dialect.
    pub fn draft(&self) -> Draft {
        self.draft.unwrap_or_default()
    }

    /// Effective `all_errors` flag.
    pub fn all_errors(&self) -> bool {
        self.all_errors.unwrap_or(true)
    }

    /// Effective `verbose` flag.
    pub fn verbose(&self) -> bool {
        self.verbose.unwrap_or(true)
    }

    /// Effective `remove_additional` flag.
    pub fn remove_additional(&self) -> bool {
        self.remove_additional.unwrap_or(false)
    }
}

/// The file-loadable part of [`ValidatorOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Matcher tuning.
    pub matcher: MatcherOptions,
    /// Extension keywords to enable.
    pub keywords: Vec<String>,
}

/// Compile-time configuration of a validator.
#[derive(Clone, Default)]
pub struct ValidatorOptions {
    /// Transform functions available to every `transform` keyword.
    pub transforms: TransformTable,
    /// Structural matcher tuning.
    pub matcher: MatcherOptions,
    /// Extension keywords to enable in addition to the always-on ones.
    pub keywords: Vec<String>,
    /// Classes available to `instanceOf` beyond the built-in registry.
    pub classes: Vec<Class>,
}

impl ValidatorOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform function.
    pub fn with_transform(mut self, name: impl Into<String>, f: crate::TransformFn) -> Self {
        self.transforms.insert(name.into(), f);
        self
    }

    /// Register a class.
    pub fn with_class(mut self, class: Class) -> Self {
        self.classes.push(class);
        self
    }

    /// Enable an extension keyword.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    /// Replace the matcher options.
    pub fn with_matcher(mut self, matcher: MatcherOptions) -> Self {
        self.matcher = matcher;
        self
    }

    /// Overlay `explicit` on top of `attached` (options found in schema
    /// metadata). Transform tables and matcher options merge per key with
    /// `explicit` winning; keyword and class lists are concatenated and
    /// de-duplicated (classes by name, first occurrence kept).
    pub fn merged(attached: Option<&ValidatorOptions>, explicit: Option<&ValidatorOptions>) -> Self {
        let empty = ValidatorOptions::default();
        let attached = attached.unwrap_or(&empty);
        let explicit = explicit.unwrap_or(&empty);

        let mut transforms = attached.transforms.clone();
        transforms.extend(explicit.transforms.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));

        let keywords = dedupe(attached.keywords.iter().chain(&explicit.keywords).cloned());

        let mut classes: Vec<Class> = Vec::new();
        for class in attached.classes.iter().chain(&explicit.classes) {
            if !classes.iter().any(|c| c.name() == class.name()) {
                classes.push(Arc::clone(class));
            }
        }

        ValidatorOptions {
            transforms,
            matcher: attached.matcher.overlay(&explicit.matcher),
            keywords,
            classes,
        }
    }
}

impl From<ConfigFile> for ValidatorOptions {
    fn from(config: ConfigFile) -> Self {
        ValidatorOptions {
            matcher: config.matcher,
            keywords: config.keywords,
            ..ValidatorOptions::default()
        }
    }
}

impl fmt::Debug for ValidatorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transforms: Vec<&String> = self.transforms.keys().collect();
        let classes: Vec<&str> = self.classes.iter().map(|c| c.name()).collect();
        f.debug_struct("ValidatorOptions")
            .field("transforms", &transforms)
            .field("matcher", &self.matcher)
            .field("keywords", &self.keywords)
            .field("classes", &classes)
            .finish()
    }
}
