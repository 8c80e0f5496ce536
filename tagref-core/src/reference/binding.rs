//! Attribute and Class-Name Bindings
//!
//! Components declare bindings with a compact descriptor:
//!
//! - attribute bindings: `path` or `path:attributeName`;
//! - class-name bindings: `path`, or `path:whenTrue` / `path:whenTrue:whenFalse`.
//!
//! Each descriptor becomes a cached reference registered against the
//! runtime's [`AttributeOperations`]. Malformed descriptors are rejected here,
//! at construction, with a [`BindingError`].
//!
//! # Tags
//!
//! A single-segment path is covered by the component's own tag. A dotted path
//! reads through intermediate objects whose mutation the component's tag does
//! not see, so those bindings fall back to the global clock.

use std::fmt::Debug;
use std::sync::Arc;

use super::{Cached, PropertyReference, Ref, Reference};
use crate::env::Env;
use crate::error::{BindingError, EvalError};
use crate::string::dasherize;
use crate::tag::{Tag, Tagged};
use crate::value::Value;

/// The runtime's sink for bound attributes.
pub trait AttributeOperations {
    /// Register `reference` as the source of attribute `name`.
    fn add_attribute(&mut self, name: &str, reference: Ref);
}

fn binding_tag(env: &Env, component: &Value, property_path: &str) -> Tag {
    if property_path.contains('.') {
        env.current_tag()
    } else {
        env.tag_for(component)
    }
}

/// Binds a component property to a DOM attribute.
pub struct AttributeBindingReference {
    component: Value,
    property_path: String,
    attribute_name: String,
    tag: Tag,
    cache: Cached<Value>,
    env: Env,
}

impl AttributeBindingReference {
    /// Parse `microsyntax` and register the binding with `operations`.
    pub fn apply(
        env: &Env,
        component: &Value,
        microsyntax: &str,
        operations: &mut dyn AttributeOperations,
    ) -> Result<(), BindingError> {
        let reference = Self::parse(env, component, microsyntax)?;
        let name = reference.attribute_name.clone();
        operations.add_attribute(&name, Arc::new(reference));
        Ok(())
    }

    /// Parse `path` or `path:attributeName`.
    pub fn parse(env: &Env, component: &Value, microsyntax: &str) -> Result<Self, BindingError> {
        let (property_path, attribute_name) = match microsyntax.split_once(':') {
            None => (microsyntax, microsyntax),
            Some((property_path, attribute_name)) => (property_path, attribute_name),
        };

        if attribute_name == "class" {
            return Err(BindingError::ClassAsAttribute {
                microsyntax: microsyntax.to_string(),
            });
        }
        if property_path.is_empty() || attribute_name.is_empty() {
            return Err(BindingError::EmptyPath {
                microsyntax: microsyntax.to_string(),
            });
        }

        Ok(Self::new(env, component, property_path, attribute_name))
    }

    /// Bind `property_path` of `component` to `attribute_name`.
    pub fn new(env: &Env, component: &Value, property_path: &str, attribute_name: &str) -> Self {
        Self {
            tag: binding_tag(env, component, property_path),
            component: component.clone(),
            property_path: property_path.to_string(),
            attribute_name: attribute_name.to_string(),
            cache: Cached::new(),
            env: env.clone(),
        }
    }

    /// The bound attribute.
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// The component property path.
    pub fn property_path(&self) -> &str {
        &self.property_path
    }
}

impl Tagged for AttributeBindingReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for AttributeBindingReference {
    fn value(&self) -> Value {
        self.cache.get(&self.tag, || {
            Ok(self.env.get_path(&self.component, &self.property_path))
        })
    }

    fn get(self: Arc<Self>, key: &str) -> Ref {
        let env = self.env.clone();
        Arc::new(PropertyReference::new(self, key, &env))
    }

    fn invalidate(&self) {
        self.cache.invalidate();
    }
}

impl Debug for AttributeBindingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeBindingReference")
            .field("property_path", &self.property_path)
            .field("attribute_name", &self.attribute_name)
            .field("tag", &self.tag)
            .finish()
    }
}

/// Parse a class-name binding and register it as a `class` attribute.
pub fn apply_class_name_binding(
    env: &Env,
    component: &Value,
    microsyntax: &str,
    operations: &mut dyn AttributeOperations,
) -> Result<(), BindingError> {
    let mut parts = microsyntax.split(':');
    let property_path = parts.next().unwrap_or_default();
    if property_path.is_empty() {
        return Err(BindingError::EmptyPath {
            microsyntax: microsyntax.to_string(),
        });
    }

    let reference: Ref = match parts.next() {
        Some(truthy) => Arc::new(ColonClassNameBindingReference::new(
            env,
            component,
            property_path,
            truthy,
            parts.next().unwrap_or_default(),
        )),
        None => Arc::new(SimpleClassNameBindingReference::new(
            env,
            component,
            property_path,
        )),
    };

    operations.add_attribute("class", reference);
    Ok(())
}

/// `isActive` → `is-active` when the property is `true`, the value itself
/// when it is any other truthy value or `0`, nothing otherwise.
pub struct SimpleClassNameBindingReference {
    component: Value,
    property_path: String,
    tag: Tag,
    cache: Cached<Value>,
    env: Env,
}

impl SimpleClassNameBindingReference {
    /// Bind `property_path` of `component`.
    pub fn new(env: &Env, component: &Value, property_path: &str) -> Self {
        Self {
            tag: binding_tag(env, component, property_path),
            component: component.clone(),
            property_path: property_path.to_string(),
            cache: Cached::new(),
            env: env.clone(),
        }
    }

    fn compute(&self) -> Result<Value, EvalError> {
        let value = self.env.get_path(&self.component, &self.property_path);

        Ok(match value {
            Value::Bool(true) => Value::from(property_path_to_class_name(&self.property_path)),
            Value::Number(n) if n == 0.0 => Value::Number(n),
            other if other.is_truthy() => other,
            _ => Value::Null,
        })
    }
}

impl Tagged for SimpleClassNameBindingReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for SimpleClassNameBindingReference {
    fn value(&self) -> Value {
        self.cache.get(&self.tag, || self.compute())
    }

    fn get(self: Arc<Self>, key: &str) -> Ref {
        let env = self.env.clone();
        Arc::new(PropertyReference::new(self, key, &env))
    }

    fn invalidate(&self) {
        self.cache.invalidate();
    }
}

/// `path:whenTrue:whenFalse`: picks one of two fixed class names.
pub struct ColonClassNameBindingReference {
    component: Value,
    property_path: String,
    truthy: Option<String>,
    falsy: Option<String>,
    tag: Tag,
    cache: Cached<Value>,
    env: Env,
}

impl ColonClassNameBindingReference {
    /// Bind `property_path` of `component`. Empty class names emit nothing.
    pub fn new(
        env: &Env,
        component: &Value,
        property_path: &str,
        truthy: &str,
        falsy: &str,
    ) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            tag: binding_tag(env, component, property_path),
            component: component.clone(),
            property_path: property_path.to_string(),
            truthy: non_empty(truthy),
            falsy: non_empty(falsy),
            cache: Cached::new(),
            env: env.clone(),
        }
    }

    fn compute(&self) -> Result<Value, EvalError> {
        let value = self.env.get_path(&self.component, &self.property_path);
        let class_name = if value.is_truthy() {
            &self.truthy
        } else {
            &self.falsy
        };
        Ok(class_name.as_deref().map(Value::from).unwrap_or_default())
    }
}

impl Tagged for ColonClassNameBindingReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for ColonClassNameBindingReference {
    fn value(&self) -> Value {
        self.cache.get(&self.tag, || self.compute())
    }

    fn get(self: Arc<Self>, key: &str) -> Ref {
        let env = self.env.clone();
        Arc::new(PropertyReference::new(self, key, &env))
    }

    fn invalidate(&self) {
        self.cache.invalidate();
    }
}

fn property_path_to_class_name(property_path: &str) -> String {
    let last = property_path.rsplit('.').next().unwrap_or(property_path);
    dasherize(last)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
