//! Conditional References
//!
//! Turn any reference into a boolean using the environment's truthiness
//! policy.
//!
//! # Tag Choice
//!
//! The policy can look inside the value (array length, an object's
//! `isTruthy` property), so the boolean may change when the *value* is
//! mutated in place, not only when the inner reference changes. Tracking that
//! precisely needs every addressable shape to report mutations through its
//! tag, which a custom [`PropertyAccess`](crate::PropertyAccess) cannot be
//! assumed to do.
//!
//! [`ConditionalReference::new`] is therefore volatile: it recomputes on
//! every read. [`ConditionalReference::tracked`] opts into combining the
//! inner tag with the tag of the object the inner value resolved to, which is
//! exact for [`ObjectModel`](crate::ObjectModel).

use std::fmt::Debug;
use std::sync::Arc;

use super::{Cached, PropertyReference, Ref, Reference};
use crate::env::Env;
use crate::tag::{combine, Tag, Tagged};
use crate::value::Value;

/// A live boolean view of another reference.
pub struct ConditionalReference {
    inner: Ref,
    /// Repointed at the inner value's object tag when tracked.
    object_tag: Option<Tag>,
    tag: Tag,
    cache: Cached<bool>,
    env: Env,
}

impl ConditionalReference {
    /// A conditional that recomputes on every read.
    pub fn new(env: &Env, inner: Ref) -> Self {
        Self {
            inner,
            object_tag: None,
            tag: Tag::volatile(),
            cache: Cached::new(),
            env: env.clone(),
        }
    }

    /// A conditional that also tracks in-place mutation of the inner value.
    pub fn tracked(env: &Env, inner: Ref) -> Self {
        let object_tag = Tag::updatable(env.clock(), env.current_tag());
        let tag = combine([inner.tag(), object_tag.clone()]);
        Self {
            inner,
            object_tag: Some(object_tag),
            tag,
            cache: Cached::new(),
            env: env.clone(),
        }
    }

    /// The current boolean.
    pub fn to_bool(&self) -> bool {
        self.cache.get(&self.tag, || {
            let predicate = self.inner.value();
            if let Some(object_tag) = &self.object_tag {
                object_tag.update(self.env.tag_for(&predicate));
            }
            Ok(self.env.to_bool(&predicate))
        })
    }
}

impl Tagged for ConditionalReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for ConditionalReference {
    fn value(&self) -> Value {
        Value::Bool(self.to_bool())
    }

    fn get(self: Arc<Self>, key: &str) -> Ref {
        let env = self.env.clone();
        Arc::new(PropertyReference::new(self, key, &env))
    }

    fn invalidate(&self) {
        self.cache.invalidate();
    }
}

impl Debug for ConditionalReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalReference")
            .field("tracked", &self.object_tag.is_some())
            .field("tag", &self.tag)
            .finish()
    }
}

/// A boolean resolved once at construction and never revisited.
#[derive(Debug, Clone, Copy)]
pub struct ConstConditionalReference {
    value: bool,
}

impl ConstConditionalReference {
    /// Evaluate `inner` now.
    pub fn new(env: &Env, inner: &Ref) -> Self {
        Self {
            value: env.to_bool(&inner.value()),
        }
    }
}

impl Tagged for ConstConditionalReference {
    fn tag(&self) -> Tag {
        Tag::constant()
    }
}

impl Reference for ConstConditionalReference {
    fn value(&self) -> Value {
        Value::Bool(self.value)
    }

    fn get(self: Arc<Self>, _key: &str) -> Ref {
        super::null_reference()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
