//! Property References
//!
//! A property reference is one segment of a path like `a.b.c`. It has to
//! notice two different kinds of change:
//!
//! - the parent reference now resolves to a different object (`a` was
//!   replaced), which the parent's own tag reports;
//! - the object the parent resolves to was mutated in place (`a.b` was set),
//!   which only that object's tag reports.
//!
//! The reference's tag is therefore the parent tag combined with an
//! updatable tag that is repointed, on every computation, at the tag of
//! whatever object the parent currently evaluates to.

use std::fmt::Debug;
use std::sync::Arc;

use super::{Cached, Ref, Reference};
use crate::env::Env;
use crate::error::EvalError;
use crate::tag::{combine, Tag, Tagged};
use crate::value::Value;

/// A reference to one property of a parent reference's value.
pub struct PropertyReference {
    parent: Ref,
    key: String,
    /// Tracks the tag of the object the parent last resolved to.
    parent_object_tag: Tag,
    tag: Tag,
    cache: Cached<Value>,
    env: Env,
}

impl PropertyReference {
    /// Derive property `key` of `parent`.
    pub fn new(parent: Ref, key: &str, env: &Env) -> Self {
        let parent_object_tag = Tag::updatable(env.clock(), env.current_tag());
        let tag = combine([parent.tag(), parent_object_tag.clone()]);

        Self {
            parent,
            key: key.to_string(),
            parent_object_tag,
            tag,
            cache: Cached::new(),
            env: env.clone(),
        }
    }

    /// The property key.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn compute(&self) -> Result<Value, EvalError> {
        let parent_value = self.parent.value();
        self.parent_object_tag
            .update(self.env.tag_for(&parent_value));

        if !parent_value.is_addressable() {
            return Err(EvalError::NotAddressable {
                key: self.key.clone(),
            });
        }
        Ok(self.env.get(&parent_value, &self.key))
    }
}

impl Tagged for PropertyReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for PropertyReference {
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

impl Debug for PropertyReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyReference")
            .field("key", &self.key)
            .field("tag", &self.tag)
            .field("cache", &self.cache)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ConstReference, RootReference, UpdatableReference};
    use crate::value::Object;

    fn person(env: &Env, name: &str) -> Object {
        let object = env.object();
        object.set("name", Value::from(name));
        object
    }

    #[test]
    fn reads_property_of_parent_value() {
        let env = Env::default();
        let root: Ref = Arc::new(RootReference::new(&env, person(&env, "tom")));
        let name = root.get("name");
        assert_eq!(name.value(), Value::from("tom"));
    }

    #[test]
    fn caches_until_something_changes() {
        let env = Env::default();
        let root = Arc::new(RootReference::new(&env, person(&env, "tom")));
        let name = Arc::new(PropertyReference::new(root, "name", &env));

        name.value();
        name.value();
        name.value();
        assert_eq!(name.cache.computations(), 1);
    }

    #[test]
    fn observes_in_place_mutation() {
        let env = Env::default();
        let object = person(&env, "tom");
        let root = Arc::new(RootReference::new(&env, object.clone()));
        let name = Arc::new(PropertyReference::new(root, "name", &env));

        assert_eq!(name.value(), Value::from("tom"));
        object.set("name", Value::from("zoey"));
        assert_eq!(name.value(), Value::from("zoey"));
        assert_eq!(name.cache.computations(), 2);
    }

    #[test]
    fn ignores_mutation_of_previous_object() {
        let env = Env::default();
        let old = person(&env, "tom");
        let root = Arc::new(UpdatableReference::new(&env, old.clone()));
        let name = Arc::new(PropertyReference::new(root.clone(), "name", &env));

        name.value();
        root.update(person(&env, "zoey"));
        assert_eq!(name.value(), Value::from("zoey"));
        let computations = name.cache.computations();

        old.set("name", Value::from("ignored"));
        assert_eq!(name.value(), Value::from("zoey"));
        assert_eq!(name.cache.computations(), computations);
    }

    #[test]
    fn nested_paths_track_every_level() {
        let env = Env::default();
        let address = env.object();
        address.set("city", Value::from("Portland"));
        let user = env.object();
        user.set("address", Value::Object(address.clone()));

        let root: Ref = Arc::new(RootReference::new(&env, user.clone()));
        let city = root.get("address").get("city");
        assert_eq!(city.value(), Value::from("Portland"));

        address.set("city", Value::from("Berlin"));
        assert_eq!(city.value(), Value::from("Berlin"));

        let moved = env.object();
        moved.set("city", Value::from("Tokyo"));
        user.set("address", Value::Object(moved));
        assert_eq!(city.value(), Value::from("Tokyo"));
    }

    #[test]
    fn primitive_parent_yields_null() {
        let env = Env::default();
        let parent: Ref = Arc::new(ConstReference::new(5));
        let child = PropertyReference::new(parent, "foo", &env);
        assert_eq!(child.value(), Value::Null);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let env = Env::default();
        let root = Arc::new(RootReference::new(&env, person(&env, "tom")));
        let name = PropertyReference::new(root, "name", &env);

        name.value();
        name.invalidate();
        name.value();
        assert_eq!(name.cache.computations(), 2);
    }
}
