//! # Custom Keywords
//!
//! Keywords registered with the structural matcher on top of the JSON
//! Schema vocabulary.
//!
//! ## Always on
//!
//! - `instanceOf`: the value is an instance of one of the named classes.
//! - `transform`: accepted as a list of transform identifiers. It never
//!   fails during matching; the transform pass runs the chain afterwards.
//! - `typeof`: the runtime kind of the value is one of the listed names.
//!
//! ## Opt-in catalogue
//!
//! Enabled through [`ValidatorOptions::keywords`](shape_core::ValidatorOptions):
//! `allRequired`, `anyRequired`, `oneRequired`, `prohibited`. Listing
//! `typeof` again is accepted. Property-presence keywords pass on
//! non-object values.

use std::sync::Arc;

use jsonschema::paths::{LazyLocation, Location};
use jsonschema::{Keyword, ValidationError, ValidationOptions};
use serde_json::{Map, Value};
use shape_core::ValueKind;

use crate::error::CompileError;
use crate::registry::ClassRegistry;

/// An opt-in extension keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    /// `typeof: "string" | [..]`
    Typeof,
    /// `allRequired: true`: every declared property is present.
    AllRequired,
    /// `anyRequired: [..]`: at least one listed property is present.
    AnyRequired,
    /// `oneRequired: [..]`: exactly one listed property is present.
    OneRequired,
    /// `prohibited: [..]`: none of the listed properties is present.
    Prohibited,
}

impl Extension {
    /// Every supported extension.
    pub const CATALOGUE: [Extension; 5] = [
        Self::Typeof,
        Self::AllRequired,
        Self::AnyRequired,
        Self::OneRequired,
        Self::Prohibited,
    ];

    /// The keyword name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Typeof => "typeof",
            Self::AllRequired => "allRequired",
            Self::AnyRequired => "anyRequired",
            Self::OneRequired => "oneRequired",
            Self::Prohibited => "prohibited",
        }
    }

    /// Look up an extension by keyword name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::CATALOGUE.into_iter().find(|ext| ext.name() == name)
    }
}

/// Resolve configured keyword names. `typeof` is always included.
///
/// # Errors
///
/// Returns [`CompileError::UnknownKeyword`] for names outside the catalogue.
pub fn resolve_extensions(names: &[String]) -> Result<Vec<Extension>, CompileError> {
    let mut out = vec![Extension::Typeof];
    for name in names {
        let ext = Extension::from_name(name)
            .ok_or_else(|| CompileError::UnknownKeyword { name: name.clone() })?;
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    Ok(out)
}

/// Register `instanceOf`, `transform` and `extensions` on `opts`.
pub(crate) fn register(
    opts: &mut ValidationOptions,
    extensions: &[Extension],
    registry: &Arc<ClassRegistry>,
) {
    let classes = Arc::clone(registry);
    opts.with_keyword("instanceOf", move |_parent, value, path| {
        instance_of_factory(&classes, value, path)
    });
    opts.with_keyword("transform", transform_factory);
    for ext in extensions {
        match ext {
            Extension::Typeof => opts.with_keyword("typeof", typeof_factory),
            Extension::AllRequired => opts.with_keyword("allRequired", all_required_factory),
            Extension::AnyRequired => opts.with_keyword("anyRequired", any_required_factory),
            Extension::OneRequired => opts.with_keyword("oneRequired", one_required_factory),
            Extension::Prohibited => opts.with_keyword("prohibited", prohibited_factory),
        };
    }
}

/// A string or a list of strings, as used by `instanceOf` and `typeof`.
pub(crate) fn names_of(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(name) => Some(vec![name.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

fn invalid<'a>(keyword: &str, value: &'a Value, path: Location, reason: &str) -> ValidationError<'a> {
    ValidationError::custom(
        Location::new(),
        path,
        value,
        format!("invalid \"{keyword}\" keyword value: {reason}"),
    )
}

fn failure<'i>(
    schema_path: &Location,
    location: &LazyLocation,
    instance: &'i Value,
    message: String,
) -> ValidationError<'i> {
    ValidationError::custom(schema_path.clone(), location.into(), instance, message)
}

// ---------------------------------------------------------------------------
// instanceOf
// ---------------------------------------------------------------------------

struct InstanceOf {
    names: Vec<String>,
    registry: Arc<ClassRegistry>,
    schema_path: Location,
}

impl Keyword for InstanceOf {
    fn validate<'i>(
        &self,
        instance: &'i Value,
        location: &LazyLocation,
    ) -> Result<(), ValidationError<'i>> {
        if self.is_valid(instance) {
            return Ok(());
        }
        Err(failure(
            &self.schema_path,
            location,
            instance,
            format!("should pass \"instanceOf\" keyword validation ({})", self.names.join(" | ")),
        ))
    }

    fn is_valid(&self, instance: &Value) -> bool {
        self.registry.is_instance_of_any(&self.names, instance)
    }
}

fn instance_of_factory<'a>(
    registry: &Arc<ClassRegistry>,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    let Some(names) = names_of(value) else {
        return Err(invalid("instanceOf", value, path, "expected a class name or a list of names"));
    };
    if let Some(unknown) = names.iter().find(|name| !registry.contains(name)) {
        let reason = format!("unknown class {unknown}");
        return Err(invalid("instanceOf", value, path, &reason));
    }
    Ok(Box::new(InstanceOf {
        names,
        registry: Arc::clone(registry),
        schema_path: path,
    }))
}

// ---------------------------------------------------------------------------
// transform
// ---------------------------------------------------------------------------

struct Transform;

impl Keyword for Transform {
    fn validate<'i>(
        &self,
        _instance: &'i Value,
        _location: &LazyLocation,
    ) -> Result<(), ValidationError<'i>> {
        Ok(())
    }

    fn is_valid(&self, _instance: &Value) -> bool {
        true
    }
}

fn transform_factory<'a>(
    _parent: &'a Map<String, Value>,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_string) => Ok(Box::new(Transform)),
        _ => Err(invalid("transform", value, path, "expected a list of transform names")),
    }
}

// ---------------------------------------------------------------------------
// typeof
// ---------------------------------------------------------------------------

struct Typeof {
    kinds: Vec<String>,
    schema_path: Location,
}

impl Keyword for Typeof {
    fn validate<'i>(
        &self,
        instance: &'i Value,
        location: &LazyLocation,
    ) -> Result<(), ValidationError<'i>> {
        if self.is_valid(instance) {
            return Ok(());
        }
        Err(failure(
            &self.schema_path,
            location,
            instance,
            format!("should pass \"typeof\" keyword validation ({})", self.kinds.join(" | ")),
        ))
    }

    fn is_valid(&self, instance: &Value) -> bool {
        let kind = ValueKind::of(instance).runtime_name();
        self.kinds.iter().any(|k| k == kind)
    }
}

fn typeof_factory<'a>(
    _parent: &'a Map<String, Value>,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    match names_of(value) {
        Some(kinds) => Ok(Box::new(Typeof {
            kinds,
            schema_path: path,
        })),
        None => Err(invalid("typeof", value, path, "expected a type name or a list of names")),
    }
}

// ---------------------------------------------------------------------------
// Property presence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Presence {
    All,
    Any,
    One,
    None,
}

impl Presence {
    fn keyword(self) -> &'static str {
        match self {
            Self::All => "allRequired",
            Self::Any => "anyRequired",
            Self::One => "oneRequired",
            Self::None => "prohibited",
        }
    }

    fn holds(self, present: usize, total: usize) -> bool {
        match self {
            Self::All => present == total,
            Self::Any => present >= 1,
            Self::One => present == 1,
            Self::None => present == 0,
        }
    }

    fn message(self, names: &[String]) -> String {
        let list = names.join(", ");
        match self {
            Self::All => format!("should have all properties: {list}"),
            Self::Any => format!("should have at least one of the properties: {list}"),
            Self::One => format!("should have exactly one of the properties: {list}"),
            Self::None => format!("should not have any of the properties: {list}"),
        }
    }
}

struct PropertyPresence {
    rule: Presence,
    names: Vec<String>,
    schema_path: Location,
}

impl Keyword for PropertyPresence {
    fn validate<'i>(
        &self,
        instance: &'i Value,
        location: &LazyLocation,
    ) -> Result<(), ValidationError<'i>> {
        if self.is_valid(instance) {
            return Ok(());
        }
        Err(failure(&self.schema_path, location, instance, self.rule.message(&self.names)))
    }

    fn is_valid(&self, instance: &Value) -> bool {
        let Value::Object(map) = instance else {
            return true;
        };
        let present = self.names.iter().filter(|name| map.contains_key(*name)).count();
        self.rule.holds(present, self.names.len())
    }
}

fn presence<'a>(
    rule: Presence,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    match value {
        Value::Array(items) if !items.is_empty() => {
            let names = names_of(value)
                .ok_or_else(|| invalid(rule.keyword(), value, path.clone(), "expected property names"))?;
            Ok(Box::new(PropertyPresence {
                rule,
                names,
                schema_path: path,
            }))
        }
        _ => Err(invalid(rule.keyword(), value, path, "expected a non-empty list of property names")),
    }
}

fn all_required_factory<'a>(
    parent: &'a Map<String, Value>,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    let Some(enabled) = value.as_bool() else {
        return Err(invalid("allRequired", value, path, "expected a boolean"));
    };
    let names = match parent.get("properties") {
        Some(Value::Object(props)) if enabled => props.keys().cloned().collect(),
        _ => Vec::new(),
    };
    Ok(Box::new(PropertyPresence {
        rule: Presence::All,
        names,
        schema_path: path,
    }))
}

fn any_required_factory<'a>(
    _parent: &'a Map<String, Value>,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    presence(Presence::Any, value, path)
}

fn one_required_factory<'a>(
    _parent: &'a Map<String, Value>,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    presence(Presence::One, value, path)
}

fn prohibited_factory<'a>(
    _parent: &'a Map<String, Value>,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    presence(Presence::None, value, path)
}
