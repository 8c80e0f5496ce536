//! Unbound References
//!
//! An unbound reference reads its source once, on first access, and keeps
//! that value forever. Its tag is constant, so nothing downstream of it ever
//! recomputes because of it.

use std::sync::{Arc, OnceLock};

use super::{Ref, Reference};
use crate::env::Env;
use crate::tag::{Tag, Tagged};
use crate::value::Value;

/// A one-shot snapshot of another reference.
pub struct UnboundReference {
    source: Ref,
    key: Option<String>,
    /// Empty until the first read. A cached `Null` is still a value.
    cache: OnceLock<Value>,
    env: Env,
}

impl UnboundReference {
    /// Snapshot `source`.
    pub fn new(env: &Env, source: Ref) -> Self {
        Self {
            source,
            key: None,
            cache: OnceLock::new(),
            env: env.clone(),
        }
    }

    /// Snapshot property `key` of `source`.
    pub fn with_key(env: &Env, source: Ref, key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            ..Self::new(env, source)
        }
    }

    /// Whether the snapshot has been taken.
    pub fn is_resolved(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl Tagged for UnboundReference {
    fn tag(&self) -> Tag {
        Tag::constant()
    }
}

impl Reference for UnboundReference {
    fn value(&self) -> Value {
        self.cache
            .get_or_init(|| {
                let source_value = self.source.value();
                match &self.key {
                    Some(key) => self.env.get(&source_value, key),
                    None => source_value,
                }
            })
            .clone()
    }

    fn get(self: Arc<Self>, key: &str) -> Ref {
        let env = self.env.clone();
        Arc::new(UnboundReference::with_key(&env, self, key))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::UpdatableReference;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn snapshot_taken_on_first_read() {
        let env = Env::default();
        let source = Arc::new(UpdatableReference::new(&env, 5));
        let unbound = UnboundReference::new(&env, source.clone());

        source.update(10);
        assert!(!unbound.is_resolved());
        assert_eq!(unbound.value(), Value::from(10));

        source.update(20);
        assert_eq!(unbound.value(), Value::from(10));
        assert!(unbound.tag().is_constant());
    }

    struct Counting {
        reads: AtomicI32,
    }

    impl Tagged for Counting {
        fn tag(&self) -> Tag {
            Tag::volatile()
        }
    }

    impl Reference for Counting {
        fn value(&self) -> Value {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Value::Null
        }

        fn get(self: Arc<Self>, _key: &str) -> Ref {
            crate::reference::null_reference()
        }
    }

    #[test]
    fn null_is_cached_too() {
        let env = Env::default();
        let source = Arc::new(Counting {
            reads: AtomicI32::new(0),
        });
        let unbound = UnboundReference::new(&env, source.clone());

        assert_eq!(unbound.value(), Value::Null);
        assert_eq!(unbound.value(), Value::Null);
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn children_are_unbound() {
        let env = Env::default();
        let object = env.object();
        object.set("name", Value::from("tom"));
        let source = Arc::new(UpdatableReference::new(&env, object.clone()));

        let unbound: Ref = Arc::new(UnboundReference::new(&env, source));
        let name = unbound.get("name");
        assert_eq!(name.value(), Value::from("tom"));

        object.set("name", Value::from("zoey"));
        assert_eq!(name.value(), Value::from("tom"));
        assert!(name.tag().is_constant());
    }
}
