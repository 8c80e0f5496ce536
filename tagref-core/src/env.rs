//! Evaluation Environment
//!
//! References never reach for globals. Everything they need from the outside
//! world is bundled in an [`Env`]:
//!
//! - the [`Clock`] that every dirtyable tag advances,
//! - a [`PropertyAccess`] implementation that reads properties and hands out
//!   per-object tags,
//! - the truthiness policy used by conditionals.
//!
//! `Env` is a cheap handle; clone it into every reference that needs it.

use std::fmt::Debug;
use std::sync::Arc;

use crate::tag::{Clock, Tag};
use crate::value::{self, Object, Value};

/// The object/property access collaborator.
pub trait PropertyAccess: Send + Sync {
    /// Read a single property. Missing properties and non-addressable
    /// receivers yield [`Value::Null`].
    fn get(&self, object: &Value, key: &str) -> Value;

    /// The tag that is dirtied whenever `object` is mutated in place.
    fn tag_for(&self, object: &Value) -> Tag;

    /// Read a dotted property path.
    fn get_path(&self, object: &Value, path: &str) -> Value {
        let mut current = object.clone();
        for key in path.split('.') {
            if current.is_null() {
                break;
            }
            current = self.get(&current, key);
        }
        current
    }
}

/// [`PropertyAccess`] over the in-crate [`Value`] model.
///
/// Objects expose their properties and their own tag. Arrays and strings
/// expose `length`, arrays also expose numeric indices; both are immutable
/// and therefore constant-tagged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectModel;

impl PropertyAccess for ObjectModel {
    fn get(&self, object: &Value, key: &str) -> Value {
        match object {
            Value::Object(object) => object.get(key).unwrap_or_default(),
            Value::Array(items) => {
                if key == "length" {
                    Value::Number(items.len() as f64)
                } else {
                    key.parse::<usize>()
                        .ok()
                        .and_then(|index| items.get(index).cloned())
                        .unwrap_or_default()
                }
            }
            Value::String(s) if key == "length" => Value::Number(s.chars().count() as f64),
            _ => Value::Null,
        }
    }

    fn tag_for(&self, object: &Value) -> Tag {
        match object {
            Value::Object(object) => object.tag(),
            _ => Tag::constant(),
        }
    }
}

/// A truthiness policy.
pub type Truthiness = fn(&Value) -> bool;

/// The collaborators threaded through every reference.
#[derive(Clone)]
pub struct Env {
    clock: Clock,
    access: Arc<dyn PropertyAccess>,
    truthiness: Truthiness,
}

impl Env {
    /// An environment over `clock` using [`ObjectModel`] and the template
    /// truthiness policy.
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            access: Arc::new(ObjectModel),
            truthiness: value::to_bool,
        }
    }

    /// Replace the property access collaborator.
    pub fn with_access<A>(mut self, access: A) -> Self
    where
        A: PropertyAccess + 'static,
    {
        self.access = Arc::new(access);
        self
    }

    /// Replace the truthiness policy.
    pub fn with_truthiness(mut self, truthiness: Truthiness) -> Self {
        self.truthiness = truthiness;
        self
    }

    /// The global mutation clock.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// The property access collaborator.
    pub fn access(&self) -> &dyn PropertyAccess {
        &*self.access
    }

    /// A tag following the global clock.
    pub fn current_tag(&self) -> Tag {
        Tag::current(&self.clock)
    }

    /// Read one property.
    pub fn get(&self, object: &Value, key: &str) -> Value {
        self.access.get(object, key)
    }

    /// Read a dotted path.
    pub fn get_path(&self, object: &Value, path: &str) -> Value {
        self.access.get_path(object, path)
    }

    /// The per-object tag for `object`.
    pub fn tag_for(&self, object: &Value) -> Tag {
        self.access.tag_for(object)
    }

    /// Apply the truthiness policy.
    pub fn to_bool(&self, value: &Value) -> bool {
        (self.truthiness)(value)
    }

    /// A fresh empty object on this environment's clock.
    pub fn object(&self) -> Object {
        Object::new(&self.clock)
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new(Clock::new())
    }
}

impl Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env").field("clock", &self.clock).finish()
    }
}
