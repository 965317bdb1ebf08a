//! # Class Registry
//!
//! Resolves `instanceOf` identifiers to runtime classes. Lookup order:
//!
//! 1. the built-in classes ([`shape_core::default_classes`]),
//! 2. classes passed in [`ValidatorOptions::classes`], later entries
//!    replacing earlier ones,
//! 3. classes carried in the schema's [`Constructors`] metadata, used only
//!    for names nothing above defines.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use shape_core::{default_classes, Class, ClassTable, Constructors, Schema, ValidatorOptions};

/// Classes available to a compiled validator.
#[derive(Clone, Default)]
pub struct ClassRegistry {
    classes: ClassTable,
}

impl ClassRegistry {
    /// Build the registry for `schema` compiled with `options`.
    pub fn build(options: &ValidatorOptions, schema: &Schema) -> Self {
        let mut classes = default_classes().clone();
        for class in &options.classes {
            classes.insert(class.name().to_string(), Arc::clone(class));
        }

        let mut local = BTreeSet::new();
        for (pointer, meta) in schema.metadata_entries() {
            let Some(table) = meta.get::<Constructors>() else {
                continue;
            };
            for (name, class) in table {
                match classes.get(name) {
                    None => {
                        classes.insert(name.clone(), Arc::clone(class));
                        local.insert(name.clone());
                    }
                    Some(existing) if local.contains(name) && !same_class(existing, class) => {
                        tracing::warn!(
                            class = %name,
                            pointer = %pointer,
                            "two schema-local classes share a name; keeping the first"
                        );
                    }
                    Some(_) => {}
                }
            }
        }

        Self { classes }
    }

    /// The class registered as `name`.
    pub fn get(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    /// Whether `name` resolves.
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Whether `value` is an instance of any of the named classes.
    /// Unknown names never match.
    pub fn is_instance_of_any(&self, names: &[String], value: &Value) -> bool {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .any(|class| class.is_instance(value))
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn same_class(a: &Class, b: &Class) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
