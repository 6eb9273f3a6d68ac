//! Raw and output value representations.
//!
//! A [`Value`] is what a property reader hands to the extraction engine: a
//! tagged view of one property that may borrow from the item it was read
//! from. A [`FieldValue`] is what ends up in an [`OutputMap`], owned and ready
//! for serialization.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::Item;

/// Ordered key-value output of a single extraction call.
pub type OutputMap = IndexMap<String, FieldValue>;

/// Represents the different kinds of values an output mapping can hold
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<FieldValue>),
    Map(OutputMap),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OutputMap> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(list) => Some(list),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            // Containers print as compact JSON
            FieldValue::List(_) | FieldValue::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<OutputMap> for FieldValue {
    fn from(value: OutputMap) -> Self {
        FieldValue::Map(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// A property value as read from an [`Item`].
///
/// Scalars are copied, strings may borrow, and nested items are handed out
/// as trait objects so the engine can recurse into them without knowing
/// their concrete type.
#[derive(Clone)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'a, str>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Object(&'a dyn Item),
    Collection(Vec<&'a dyn Item>),
}

impl<'a> Value<'a> {
    /// Wrap a nested item.
    pub fn object<T: Item>(item: &'a T) -> Self {
        Value::Object(item)
    }

    /// Wrap an optional nested item, mapping `None` to [`Value::Null`].
    pub fn optional_object<T: Item>(item: Option<&'a T>) -> Self {
        match item {
            Some(item) => Value::Object(item),
            None => Value::Null,
        }
    }

    /// Wrap an ordered collection of nested items.
    ///
    /// ```ignore
    /// PropertyDef::new("tags", |post: &Post| Value::collection(&post.tags))
    /// ```
    pub fn collection<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: Item + 'a,
    {
        Value::Collection(items.into_iter().map(|item| item as &dyn Item).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) | Value::DateTimeTz(_)
        )
    }

    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::DateTimeTz(_) => "datetime",
            Value::Object(_) => "object",
            Value::Collection(_) => "collection",
        }
    }

    /// Strict equality against a translation operand.
    ///
    /// Both sides must be the same scalar variant with equal payloads: `1`
    /// never equals `1.0` or `"1"`. Dates, objects and collections never
    /// match.
    pub fn strictly_equals(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Value::Null, FieldValue::Null) => true,
            (Value::Bool(a), FieldValue::Bool(b)) => a == b,
            (Value::Int(a), FieldValue::Int(b)) => a == b,
            (Value::Float(a), FieldValue::Float(b)) => a == b,
            (Value::String(a), FieldValue::String(b)) => a.as_ref() == b.as_str(),
            _ => false,
        }
    }

    /// String representation used by stringable fields.
    ///
    /// Returns `None` for collections, for objects whose schema registers no
    /// stringifier, and for dates, which only render through a date format.
    pub fn to_display_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.to_string()),
            Value::Object(item) => item.stringify(),
            Value::Date(_)
            | Value::Time(_)
            | Value::DateTime(_)
            | Value::DateTimeTz(_)
            | Value::Collection(_) => None,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(fl) => write!(f, "Float({})", fl),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Date(d) => write!(f, "Date({})", d),
            Value::Time(t) => write!(f, "Time({})", t),
            Value::DateTime(dt) => write!(f, "DateTime({})", dt),
            Value::DateTimeTz(dt) => write!(f, "DateTimeTz({})", dt),
            Value::Object(item) => write!(f, "Object({})", item.type_key()),
            Value::Collection(items) => write!(f, "Collection(len={})", items.len()),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(value: $ty) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value<'_> {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value<'_> {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::String(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Value::String(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::String(Cow::Owned(value))
    }
}

impl<'a> From<Cow<'a, str>> for Value<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Value::String(value)
    }
}

impl From<NaiveDate> for Value<'_> {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveTime> for Value<'_> {
    fn from(value: NaiveTime) -> Self {
        Value::Time(value)
    }
}

impl From<NaiveDateTime> for Value<'_> {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for Value<'_> {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Value::DateTimeTz(value)
    }
}

impl From<DateTime<Utc>> for Value<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTimeTz(value.into())
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
