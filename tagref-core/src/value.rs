//! Host Values
//!
//! References produce [`Value`]s. Primitives are plain data; objects are
//! shared, mutable property bags that carry their own dirtyable [`Tag`], so
//! an in-place `set` is observable by every reference that tracked the
//! object.
//!
//! # Truthiness
//!
//! Two policies live here and they are deliberately different:
//!
//! - [`Value::is_truthy`] is the native rule: only `null`, `false`, `0`,
//!   `NaN` and `""` are false. Class-name bindings use it.
//! - [`to_bool`] is the template policy used by conditionals: empty arrays
//!   are false, and objects may decide for themselves via an `isTruthy`
//!   property.

use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::tag::{Clock, Tag};

/// A value flowing through the reference graph.
#[derive(Clone, Default)]
pub enum Value {
    /// The neutral value: absent, undefined or null.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. All numbers are doubles.
    Number(f64),
    /// An immutable string.
    String(Arc<str>),
    /// An immutable array.
    Array(Arc<[Value]>),
    /// A shared mutable object.
    Object(Object),
}

impl Value {
    /// Whether this is the neutral value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether properties can be looked up on this value.
    pub fn is_addressable(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    /// Native truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    /// The object handle, if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(&**items),
            _ => None,
        }
    }

    /// Build a value from JSON. JSON objects become fresh [`Object`]s on
    /// `clock`.
    pub fn from_json(json: &serde_json::Value, clock: &Clock) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or_default(),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| Value::from_json(item, clock))
                    .collect(),
            ),
            serde_json::Value::Object(map) => Value::Object(Object::with_properties(
                clock,
                map.iter()
                    .map(|(key, value)| (key.clone(), Value::from_json(value, clock))),
            )),
        }
    }

    /// Snapshot this value as JSON. Non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// The template truthiness policy.
///
/// Falsy under native rules stays false. Arrays are true only when
/// non-empty. Objects are true unless they carry a boolean `isTruthy`
/// property, in which case that property decides; any other `isTruthy`
/// value is ignored.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(object) => object
            .get("isTruthy")
            .and_then(|flag| flag.as_bool())
            .unwrap_or(true),
        other => other.is_truthy(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.same(b),
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(&&**s).finish(),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(object) => Debug::fmt(object, f),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_null() {
                        Display::fmt(item, f)?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        // Covers -0.
        f.write_str("0")
    } else if n == n.trunc() && n.abs() < 1e21 {
        write!(f, "{n:.0}")
    } else {
        write!(f, "{n}")
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(object) => {
                let properties = object.inner.properties.read();
                let mut map = serializer.serialize_map(Some(properties.len()))?;
                for (key, value) in properties.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items.into())
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

/// A shared, mutable object with its own validity tag.
///
/// Clones are handles to the same object. Every effective [`Object::set`]
/// dirties the object's tag.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

struct ObjectInner {
    properties: RwLock<IndexMap<String, Value>>,
    tag: Tag,
}

impl Object {
    /// Create an empty object on `clock`.
    pub fn new(clock: &Clock) -> Self {
        Self::with_properties(clock, std::iter::empty::<(String, Value)>())
    }

    /// Create an object with initial properties. Does not advance the clock.
    pub fn with_properties<K, I>(clock: &Clock, properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            inner: Arc::new(ObjectInner {
                properties: RwLock::new(
                    properties
                        .into_iter()
                        .map(|(key, value)| (key.into(), value))
                        .collect(),
                ),
                tag: Tag::dirtyable(clock),
            }),
        }
    }

    /// The object's own tag.
    pub fn tag(&self) -> Tag {
        self.inner.tag.clone()
    }

    /// Read a property.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.properties.read().get(key).cloned()
    }

    /// Write a property, dirtying the object's tag if the value changed.
    ///
    /// Returns whether anything changed.
    pub fn set(&self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        {
            let mut properties = self.inner.properties.write();
            if properties.get(&key) == Some(&value) {
                return false;
            }
            properties.insert(key, value);
        }
        self.inner.tag.dirty();
        true
    }

    /// Remove a property, dirtying the object's tag if it existed.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.inner.properties.write().shift_remove(key);
        if removed.is_some() {
            self.inner.tag.dirty();
        }
        removed
    }

    /// Property names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.properties.read().keys().cloned().collect()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.inner.properties.read().len()
    }

    /// Whether the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.inner.properties.read().is_empty()
    }

    /// Identity comparison.
    pub fn same(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("keys", &self.keys())
            .field("tag", &self.inner.tag)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn native_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::from(Vec::new()).is_truthy());
    }

    #[test]
    fn template_truthiness() {
        let clock = Clock::new();

        assert!(!to_bool(&Value::from(Vec::new())));
        assert!(to_bool(&Value::from(vec![Value::Null])));
        assert!(to_bool(&Value::Object(Object::new(&clock))));
        assert!(!to_bool(&Value::from(0)));

        let proxy = Object::new(&clock);
        proxy.set("isTruthy", Value::from(false));
        assert!(!to_bool(&Value::Object(proxy.clone())));
        proxy.set("isTruthy", Value::from(true));
        assert!(to_bool(&Value::Object(proxy)));
    }

    #[test]
    fn non_boolean_is_truthy_is_ignored() {
        let clock = Clock::new();
        let object = Object::new(&clock);

        object.set("isTruthy", Value::Null);
        assert!(to_bool(&Value::Object(object.clone())));

        object.set("isTruthy", Value::from(0));
        assert!(to_bool(&Value::Object(object.clone())));

        object.set("isTruthy", Value::from(""));
        assert!(to_bool(&Value::Object(object)));
    }

    #[test]
    fn set_dirties_only_on_change() {
        let clock = Clock::new();
        let object = Object::new(&clock);
        let snapshot = object.tag().value();

        assert!(object.set("name", Value::from("a")));
        assert!(!object.tag().validate(snapshot));

        let snapshot = object.tag().value();
        assert!(!object.set("name", Value::from("a")));
        assert!(object.tag().validate(snapshot));
    }

    #[test]
    fn remove_dirties_when_present() {
        let clock = Clock::new();
        let object = Object::with_properties(&clock, [("a", Value::from(1))]);
        let snapshot = object.tag().value();

        assert_eq!(object.remove("missing"), None);
        assert!(object.tag().validate(snapshot));

        assert_eq!(object.remove("a"), Some(Value::from(1)));
        assert!(!object.tag().validate(snapshot));
        assert!(object.is_empty());
    }

    #[test]
    fn numbers_display_like_templates() {
        assert_eq!(Value::from(0).to_string(), "0");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(
            Value::from(vec![Value::from(1), Value::Null, Value::from("a")]).to_string(),
            "1,,a"
        );
    }

    #[test]
    fn json_conversion() {
        let clock = Clock::new();
        let source = json!({"name": "tomster", "tags": ["a", "b"], "age": 3.0, "meta": null});

        let value = Value::from_json(&source, &clock);
        let object = value.as_object().expect("object");
        assert_eq!(object.len(), 4);
        assert_eq!(object.get("name"), Some(Value::from("tomster")));
        assert_eq!(object.get("meta"), Some(Value::Null));
        assert_eq!(value.to_json(), source);
    }

    #[test]
    fn objects_compare_by_identity() {
        let clock = Clock::new();
        let a = Object::new(&clock);
        let b = Object::new(&clock);

        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }
}
