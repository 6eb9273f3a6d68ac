//! Per-type field tables and the object-safe [`Item`] trait.
//!
//! Rust has no runtime reflection, so every extractable type declares a
//! [`Schema`] once: its type key, its properties in declaration order, a
//! reader function per property, optional named accessors, and an optional
//! stringifier. The schema is resolved once per type and never changes
//! afterwards.
//!
//! # Example
//!
//! ```
//! use std::sync::OnceLock;
//! use objectable::{Described, FieldDescriptor, PropertyDef, Schema, Value};
//!
//! struct Tag {
//!     label: String,
//! }
//!
//! impl Described for Tag {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: OnceLock<Schema<Tag>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::builder("Tag")
//!                 .property(
//!                     PropertyDef::new("label", |tag: &Tag| Value::from(&tag.label))
//!                         .field(FieldDescriptor::new()),
//!                 )
//!                 .build()
//!                 .expect("Tag schema is valid")
//!         })
//!     }
//! }
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::fmt;

use convert_case::{Case, Casing};
use indexmap::IndexSet;

use crate::contexts::Contexts;
use crate::descriptor::{FieldDescriptor, Translation};
use crate::value::{FieldValue, Value};

/// Stable identifier of an extractable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(&'static str);

impl TypeKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reads one property (or runs one accessor) of a `T`.
pub type ReadFn<T> = for<'a> fn(&'a T) -> Value<'a>;

/// Error raised while building a [`Schema`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    EmptyContexts {
        type_key: TypeKey,
        property: String,
    },
    DuplicateProperty {
        type_key: TypeKey,
        property: String,
    },
    FlatPickWithoutFlat {
        type_key: TypeKey,
        property: String,
    },
    UnknownAccessor {
        type_key: TypeKey,
        property: String,
        accessor: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::EmptyContexts { type_key, property } => {
                write!(f, "{}.{}: field declares no contexts", type_key, property)
            }
            SchemaError::DuplicateProperty { type_key, property } => {
                write!(f, "{}.{}: property declared twice", type_key, property)
            }
            SchemaError::FlatPickWithoutFlat { type_key, property } => {
                write!(f, "{}.{}: flat_pick is set but the field is not flat", type_key, property)
            }
            SchemaError::UnknownAccessor { type_key, property, accessor } => {
                write!(
                    f,
                    "{}.{}: accessor '{}' is not registered on the schema",
                    type_key, property, accessor
                )
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Metadata of one declared property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    field: Option<FieldDescriptor>,
    translations: Vec<Translation>,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field descriptor, if the property is exposed at all.
    pub fn field(&self) -> Option<&FieldDescriptor> {
        self.field.as_ref()
    }

    /// Translation rules in declaration order.
    pub fn translations(&self) -> &[Translation] {
        &self.translations
    }
}

/// Declaration of one property of `T`, used with [`SchemaBuilder::property`].
pub struct PropertyDef<T> {
    property: Property,
    read: ReadFn<T>,
}

impl<T> PropertyDef<T> {
    pub fn new(name: impl Into<String>, read: ReadFn<T>) -> Self {
        Self {
            property: Property {
                name: name.into(),
                field: None,
                translations: Vec::new(),
            },
            read,
        }
    }

    /// Expose the property with the given descriptor.
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.property.field = Some(descriptor);
        self
    }

    /// Append a translation rule.
    pub fn translate(mut self, when: impl Into<FieldValue>, then: impl Into<FieldValue>) -> Self {
        self.property.translations.push(Translation::new(when, then));
        self
    }
}

/// The resolved field table of `T`.
pub struct Schema<T> {
    type_key: TypeKey,
    properties: Vec<Property>,
    readers: Vec<ReadFn<T>>,
    accessors: Vec<(String, ReadFn<T>)>,
    stringify: Option<fn(&T) -> String>,
}

impl<T> Schema<T> {
    pub fn builder(type_key: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder::new(type_key)
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn field_descriptor_of(&self, property: &str) -> Option<&FieldDescriptor> {
        self.property(property).and_then(Property::field)
    }

    pub fn translation_rules_of(&self, property: &str) -> &[Translation] {
        self.property(property)
            .map(Property::translations)
            .unwrap_or_default()
    }

    fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Output names visible under `contexts`, in declaration order.
    ///
    /// A name produced by several properties is listed once, at the position
    /// where it first appears, which is also where it sits in the extracted
    /// mapping.
    pub fn headers(&self, contexts: &Contexts) -> Vec<&str> {
        let names: IndexSet<&str> = self
            .properties
            .iter()
            .filter_map(Property::field)
            .filter(|field| field.is_visible_in(contexts))
            .map(FieldDescriptor::output_name)
            .collect();
        names.into_iter().collect()
    }

    /// Read the property at `index` directly.
    pub fn read<'a>(&self, item: &'a T, index: usize) -> Value<'a> {
        match self.readers.get(index) {
            Some(read) => read(item),
            None => Value::Null,
        }
    }

    /// Run the accessor registered under `name`.
    pub fn invoke<'a>(&self, item: &'a T, name: &str) -> Option<Value<'a>> {
        self.accessors
            .iter()
            .find(|(accessor, _)| accessor == name)
            .map(|(_, call)| call(item))
    }

    pub fn stringify(&self, item: &T) -> Option<String> {
        self.stringify.map(|stringify| stringify(item))
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_key", &self.type_key)
            .field("properties", &self.properties)
            .field(
                "accessors",
                &self.accessors.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("stringable", &self.stringify.is_some())
            .finish()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder<T> {
    type_key: TypeKey,
    properties: Vec<PropertyDef<T>>,
    accessors: Vec<(String, ReadFn<T>)>,
    stringify: Option<fn(&T) -> String>,
    rename_all: Option<Case>,
}

impl<T> SchemaBuilder<T> {
    pub fn new(type_key: &'static str) -> Self {
        Self {
            type_key: TypeKey::new(type_key),
            properties: Vec::new(),
            accessors: Vec::new(),
            stringify: None,
            rename_all: None,
        }
    }

    pub fn property(mut self, property: PropertyDef<T>) -> Self {
        self.properties.push(property);
        self
    }

    /// Register a named accessor that fields can read through.
    pub fn accessor(mut self, name: impl Into<String>, call: ReadFn<T>) -> Self {
        self.accessors.push((name.into(), call));
        self
    }

    /// String representation used when a stringable field holds a `T`.
    pub fn stringify(mut self, stringify: fn(&T) -> String) -> Self {
        self.stringify = Some(stringify);
        self
    }

    /// Derive unnamed fields' output names from their property names.
    pub fn rename_all(mut self, case: Case) -> Self {
        self.rename_all = Some(case);
        self
    }

    pub fn build(self) -> Result<Schema<T>, SchemaError> {
        let type_key = self.type_key;
        let mut seen = HashSet::new();
        let mut properties = Vec::with_capacity(self.properties.len());
        let mut readers = Vec::with_capacity(self.properties.len());

        for PropertyDef { mut property, read } in self.properties {
            if !seen.insert(property.name.clone()) {
                return Err(SchemaError::DuplicateProperty {
                    type_key,
                    property: property.name,
                });
            }

            if let Some(field) = property.field.take() {
                validate_field(type_key, &property.name, &field, &self.accessors)?;
                let field = if field.has_name() {
                    field
                } else {
                    let name = match self.rename_all {
                        Some(case) => property.name.to_case(case),
                        None => property.name.clone(),
                    };
                    field.name(name)
                };
                property.field = Some(field);
            }

            properties.push(property);
            readers.push(read);
        }

        Ok(Schema {
            type_key,
            properties,
            readers,
            accessors: self.accessors,
            stringify: self.stringify,
        })
    }
}

fn validate_field<T>(
    type_key: TypeKey,
    property: &str,
    field: &FieldDescriptor,
    accessors: &[(String, ReadFn<T>)],
) -> Result<(), SchemaError> {
    if field.context_tags().is_empty() {
        return Err(SchemaError::EmptyContexts {
            type_key,
            property: property.to_string(),
        });
    }

    if field.flat_pick_key().is_some() && !field.is_flat() {
        return Err(SchemaError::FlatPickWithoutFlat {
            type_key,
            property: property.to_string(),
        });
    }

    if let Some(accessor) = field.accessor_name() {
        if !accessors.iter().any(|(name, _)| name == accessor) {
            return Err(SchemaError::UnknownAccessor {
                type_key,
                property: property.to_string(),
                accessor: accessor.to_string(),
            });
        }
    }

    Ok(())
}

/// An object the extraction engine can walk.
///
/// This is the object-safe face of a [`Schema`]: the engine only ever holds
/// `&dyn Item`, so nested objects and collection elements of any type can be
/// processed recursively. Types implementing [`Described`] get it for free.
pub trait Item {
    fn type_key(&self) -> TypeKey;

    /// Used by transformers to get back to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Declared properties, in declaration order.
    fn properties(&self) -> &[Property];

    /// Read the property at `index` directly. Out of range reads yield null.
    fn read(&self, index: usize) -> Value<'_>;

    /// Run a named accessor, `None` if the item has no such accessor.
    fn invoke(&self, accessor: &str) -> Option<Value<'_>>;

    /// String form used by stringable fields.
    fn stringify(&self) -> Option<String> {
        None
    }
}

/// Types with a statically declared [`Schema`].
pub trait Described: Sized + 'static {
    fn schema() -> &'static Schema<Self>;
}

impl<T: Described> Item for T {
    fn type_key(&self) -> TypeKey {
        T::schema().type_key()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn properties(&self) -> &[Property] {
        T::schema().properties()
    }

    fn read(&self, index: usize) -> Value<'_> {
        T::schema().read(self, index)
    }

    fn invoke(&self, accessor: &str) -> Option<Value<'_>> {
        T::schema().invoke(self, accessor)
    }

    fn stringify(&self) -> Option<String> {
        T::schema().stringify(self)
    }
}
