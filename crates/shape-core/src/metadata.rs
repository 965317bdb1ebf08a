//! # Metadata Side-Channel
//!
//! Out-of-band data attached to a schema fragment: tag descriptors,
//! constructor and transform tables, validator options. None of it is
//! part of the JSON document, so it never shows up in serialization or
//! in structural equality.
//!
//! ## Keys
//!
//! Every slot is addressed by a zero-sized marker type implementing
//! [`MetadataKey`], which fixes the value type stored in that slot:
//!
//! | marker | value |
//! |--------|-------|
//! | [`TaggedUnion`] | [`TaggedUnionTag`] |
//! | [`Optional`] | `bool` |
//! | [`Constructors`] | [`ClassTable`] |
//! | [`Transforms`] | [`TransformTable`] |
//! | [`ValidatorConfig`] | [`ValidatorOptions`] |
//!
//! ## Scoping
//!
//! A [`Schema`] keeps one [`Metadata`] record per node, keyed by the
//! JSON Pointer of the node relative to the fragment root. The free
//! functions in this module only touch the root record; nested records are
//! carried along when a fragment is embedded into another one.

use std::fmt;

use serde_json::Value;

use crate::class::ClassTable;
use crate::fragment::Schema;
use crate::options::ValidatorOptions;
use crate::transform::TransformTable;

/// Descriptor of a discriminated union.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedUnionTag {
    /// Name of the discriminator property.
    pub tag_property_name: String,
    /// Schema of the discriminator property, without its `const`.
    pub tag_property_description: Value,
}

/// Metadata attached to a single schema node.
#[derive(Clone, Default)]
pub struct Metadata {
    tagged_union: Option<TaggedUnionTag>,
    optional: Option<bool>,
    constructors: Option<ClassTable>,
    transforms: Option<TransformTable>,
    validator_config: Option<ValidatorOptions>,
}

impl Metadata {
    /// Look up a slot.
    pub fn get<K: MetadataKey>(&self) -> Option<&K::Value> {
        K::slot(self)
    }

    /// Store a value in a slot, replacing what was there.
    pub fn set<K: MetadataKey>(&mut self, value: K::Value) {
        *K::slot_mut(self) = Some(value);
    }

    /// Returns `true` if no slot is populated.
    pub fn is_empty(&self) -> bool {
        self.tagged_union.is_none()
            && self.optional.is_none()
            && self.constructors.is_none()
            && self.transforms.is_none()
            && self.validator_config.is_none()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Metadata");
        if let Some(tag) = &self.tagged_union {
            s.field(TaggedUnion::NAME, tag);
        }
        if let Some(optional) = self.optional {
            s.field(Optional::NAME, &optional);
        }
        if let Some(constructors) = &self.constructors {
            s.field(Constructors::NAME, &constructors.keys().collect::<Vec<_>>());
        }
        if let Some(transforms) = &self.transforms {
            s.field(Transforms::NAME, &transforms.keys().collect::<Vec<_>>());
        }
        if let Some(options) = &self.validator_config {
            s.field(ValidatorConfig::NAME, options);
        }
        s.finish()
    }
}

/// A typed metadata slot.
pub trait MetadataKey {
    /// Type of the stored value.
    type Value: Clone;

    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Read the slot.
    fn slot(meta: &Metadata) -> Option<&Self::Value>;

    /// Access the slot for writing.
    fn slot_mut(meta: &mut Metadata) -> &mut Option<Self::Value>;
}

macro_rules! metadata_key {
    ($(#[$doc:meta])* $marker:ident, $field:ident, $value:ty, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub enum $marker {}

        impl MetadataKey for $marker {
            type Value = $value;
            const NAME: &'static str = $name;

            fn slot(meta: &Metadata) -> Option<&Self::Value> {
                meta.$field.as_ref()
            }

            fn slot_mut(meta: &mut Metadata) -> &mut Option<Self::Value> {
                &mut meta.$field
            }
        }
    };
}

metadata_key!(
    /// Marks an `anyOf` as a discriminated union.
    TaggedUnion, tagged_union, TaggedUnionTag, "TAGGED_UNION"
);
metadata_key!(
    /// Marks a property fragment as not contributing to `required`.
    Optional, optional, bool, "OPTIONAL"
);
metadata_key!(
    /// Classes available to `instanceOf` keywords at this node.
    Constructors, constructors, ClassTable, "CONSTRUCTORS"
);
metadata_key!(
    /// Transform functions available to the `transform` keyword at this node.
    Transforms, transforms, TransformTable, "TRANSFORMS"
);
metadata_key!(
    /// Validator options attached to a whole schema document.
    ValidatorConfig, validator_config, ValidatorOptions, "VALIDATOR_OPTIONS"
);

/// Read a root metadata slot of `schema`.
pub fn get_metadata<K: MetadataKey>(schema: &Schema) -> Option<&K::Value> {
    schema.metadata().and_then(K::slot)
}

/// Store `value` in a root metadata slot of `schema` and return it.
/// `None` leaves the fragment untouched, so no empty record is created.
pub fn set_metadata<K: MetadataKey>(mut schema: Schema, value: Option<K::Value>) -> Schema {
    if let Some(value) = value {
        schema.metadata_mut("").set::<K>(value);
    }
    schema
}
