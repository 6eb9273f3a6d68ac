//! Per-property field configuration.
//!
//! A [`FieldDescriptor`] decides whether a property shows up in the output
//! and how its raw value is turned into an output value. [`Translation`]
//! rules substitute specific raw values before any other processing.

use crate::contexts::{Contexts, DEFAULT_CONTEXT};
use crate::value::{FieldValue, Value};

/// Static configuration of one exposed property.
///
/// # Example
///
/// ```
/// use objectable::FieldDescriptor;
///
/// let field = FieldDescriptor::named("created")
///     .contexts(["default", "admin"])
///     .date_format("Y-m-d");
///
/// assert_eq!(field.output_name(), "created");
/// assert_eq!(field.date_format_str(), Some("Y-m-d"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: Option<String>,
    contexts: Vec<String>,
    accessor: Option<String>,
    date_format: Option<String>,
    stringable: bool,
    flat: bool,
    flat_pick: Option<String>,
}

impl FieldDescriptor {
    /// Descriptor whose output name is derived from the property name.
    pub fn new() -> Self {
        Self {
            name: None,
            contexts: vec![DEFAULT_CONTEXT.to_string()],
            accessor: None,
            date_format: None,
            stringable: false,
            flat: false,
            flat_pick: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new().name(name)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the context set. Duplicate tags are dropped.
    pub fn contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts.clear();
        for context in contexts {
            let context = context.into();
            if !self.contexts.contains(&context) {
                self.contexts.push(context);
            }
        }
        self
    }

    /// Read the value through a named accessor instead of the property reader.
    pub fn accessor(mut self, accessor: impl Into<String>) -> Self {
        self.accessor = Some(accessor.into());
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn stringable(mut self) -> Self {
        self.stringable = true;
        self
    }

    pub fn flat(mut self) -> Self {
        self.flat = true;
        self
    }

    /// Key promoted when a flattened object exposes more than one field.
    pub fn flat_pick(mut self, key: impl Into<String>) -> Self {
        self.flat_pick = Some(key.into());
        self
    }

    pub fn output_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn context_tags(&self) -> &[String] {
        &self.contexts
    }

    pub fn accessor_name(&self) -> Option<&str> {
        self.accessor.as_deref()
    }

    pub fn date_format_str(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    pub fn is_stringable(&self) -> bool {
        self.stringable
    }

    pub fn is_flat(&self) -> bool {
        self.flat
    }

    pub fn flat_pick_key(&self) -> Option<&str> {
        self.flat_pick.as_deref()
    }

    pub fn is_visible_in(&self, contexts: &Contexts) -> bool {
        contexts.intersects(&self.contexts)
    }

    pub(crate) fn has_name(&self) -> bool {
        self.name.is_some()
    }
}

impl Default for FieldDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Replaces a raw value that strictly equals `when` with `then`.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    when: FieldValue,
    then: FieldValue,
}

impl Translation {
    pub fn new(when: impl Into<FieldValue>, then: impl Into<FieldValue>) -> Self {
        Self {
            when: when.into(),
            then: then.into(),
        }
    }

    pub fn when(&self) -> &FieldValue {
        &self.when
    }

    pub fn then(&self) -> &FieldValue {
        &self.then
    }

    pub fn matches(&self, raw: &Value<'_>) -> bool {
        raw.strictly_equals(&self.when)
    }
}
