//! References
//!
//! A reference is a lazily evaluated node that can report its current
//! [`Value`] and a [`Tag`] saying when that value may be stale. Derived
//! references hold their parents by shared handle and combine the parents'
//! tags into their own, so the graph is a DAG of pull-based computations.
//!
//! # Variants
//!
//! - [`ConstReference`], [`RootReference`]: fixed values.
//! - [`UpdatableReference`]: the mutable entry point, owns a dirtyable tag.
//! - [`PropertyReference`]: one step of a property path.
//! - Helper references ([`SimpleHelperReference`],
//!   [`ClassBasedHelperReference`], [`InternalHelperReference`],
//!   [`GetHelperReference`], [`HashHelperReference`]).
//! - [`ConditionalReference`], [`ConstConditionalReference`].
//! - Attribute and class-name bindings.
//! - [`UnboundReference`]: read once, never again.
//!
//! Every derived variant memoizes through the shared [`Cached`] block
//! instead of inheriting the behavior.

mod binding;
mod cached;
mod conditional;
mod helper;
mod property;
mod unbound;
mod updatable;

pub use binding::{
    apply_class_name_binding, AttributeBindingReference, AttributeOperations,
    ColonClassNameBindingReference, SimpleClassNameBindingReference,
};
pub use cached::{CacheState, Cached};
pub use conditional::{ConditionalReference, ConstConditionalReference};
pub use helper::{
    Args, ClassBasedHelperReference, GetHelperReference, HashHelperReference, HelperFn,
    InternalHelperFn, InternalHelperReference, NamedArgs, PositionalArgs, RecomputeSignal,
    SimpleHelperReference, StatefulHelper,
};
pub use property::PropertyReference;
pub use unbound::UnboundReference;
pub use updatable::UpdatableReference;

use std::sync::{Arc, OnceLock};

use crate::env::Env;
use crate::tag::{Tag, Tagged};
use crate::value::Value;

/// A node in the reference graph.
///
/// `value` may recompute; `get` derives a child reference for one property
/// key. Child references are not cached: every call builds a fresh node that
/// follows the same lookup policy.
pub trait Reference: Tagged + Send + Sync {
    /// The current value.
    fn value(&self) -> Value;

    /// Derive a reference to property `key` of this reference's value.
    fn get(self: Arc<Self>, key: &str) -> Ref;

    /// Force the next `value` call to recompute. A no-op for references
    /// that do not cache.
    fn invalidate(&self) {}
}

/// A shared handle to any reference.
pub type Ref = Arc<dyn Reference>;

/// A reference to a fixed value.
///
/// Its tag is constant. Properties of a constant are not tracked, so `get`
/// yields the null reference; use [`RootReference`] for objects.
#[derive(Debug, Clone)]
pub struct ConstReference {
    value: Value,
}

impl ConstReference {
    /// Wrap `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Tagged for ConstReference {
    fn tag(&self) -> Tag {
        Tag::constant()
    }
}

impl Reference for ConstReference {
    fn value(&self) -> Value {
        self.value.clone()
    }

    fn get(self: Arc<Self>, _key: &str) -> Ref {
        null_reference()
    }
}

/// The shared reference to [`Value::Null`].
pub fn null_reference() -> Ref {
    static NULL: OnceLock<Ref> = OnceLock::new();
    NULL.get_or_init(|| Arc::new(ConstReference::new(Value::Null)))
        .clone()
}

/// A fixed root value whose properties are tracked.
///
/// The root itself never changes, but `get` derives [`PropertyReference`]s
/// that follow in-place mutation of the objects they reach.
#[derive(Debug, Clone)]
pub struct RootReference {
    value: Value,
    env: Env,
}

impl RootReference {
    /// Wrap `value`.
    pub fn new(env: &Env, value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            env: env.clone(),
        }
    }
}

impl Tagged for RootReference {
    fn tag(&self) -> Tag {
        Tag::constant()
    }
}

impl Reference for RootReference {
    fn value(&self) -> Value {
        self.value.clone()
    }

    fn get(self: Arc<Self>, key: &str) -> Ref {
        let env = self.env.clone();
        Arc::new(PropertyReference::new(self, key, &env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_reference_is_constant() {
        let reference: Ref = Arc::new(ConstReference::new(5));
        assert_eq!(reference.value(), Value::from(5));
        assert!(reference.tag().is_constant());
    }

    #[test]
    fn const_reference_children_are_null() {
        let reference: Ref = Arc::new(ConstReference::new("text"));
        let child = reference.get("length");
        assert_eq!(child.value(), Value::Null);
        assert!(Arc::ptr_eq(&child, &null_reference()));
    }

    #[test]
    fn root_reference_derives_properties() {
        let env = Env::default();
        let object = env.object();
        object.set("name", Value::from("tomster"));

        let root: Ref = Arc::new(RootReference::new(&env, object));
        assert_eq!(root.get("name").value(), Value::from("tomster"));
    }
}
