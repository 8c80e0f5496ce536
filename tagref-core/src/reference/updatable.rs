//! Updatable References
//!
//! An updatable reference is the mutable entry point into the graph. It
//! holds a value and owns a dirtyable tag.
//!
//! # How Updates Work
//!
//! 1. `update` stores the new value and dirties the tag, which also advances
//!    the global clock.
//!
//! 2. Nothing is pushed anywhere. Every reference whose tag includes this
//!    one (directly or through combination) finds its recorded revision
//!    invalid on its next read and recomputes.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{PropertyReference, Ref, Reference};
use crate::env::Env;
use crate::tag::{Tag, Tagged};
use crate::value::Value;

/// A user-settable reference.
pub struct UpdatableReference {
    tag: Tag,
    value: RwLock<Value>,
    env: Env,
}

impl UpdatableReference {
    /// Create a reference holding `value`.
    pub fn new(env: &Env, value: impl Into<Value>) -> Self {
        Self {
            tag: Tag::dirtyable(env.clock()),
            value: RwLock::new(value.into()),
            env: env.clone(),
        }
    }

    /// Replace the value and invalidate every dependent.
    pub fn update(&self, value: impl Into<Value>) {
        *self.value.write() = value.into();
        self.tag.dirty();
    }

    /// Update the value using a function of the current one.
    pub fn update_with<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let new_value = {
            let guard = self.value.read();
            f(&guard)
        };
        self.update(new_value);
    }
}

impl Tagged for UpdatableReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for UpdatableReference {
    fn value(&self) -> Value {
        self.value.read().clone()
    }

    fn get(self: Arc<Self>, key: &str) -> Ref {
        let env = self.env.clone();
        Arc::new(PropertyReference::new(self, key, &env))
    }
}

impl Debug for UpdatableReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdatableReference")
            .field("value", &*self.value.read())
            .field("tag", &self.tag)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
