//! Helper References
//!
//! Helper references run a computation over an argument list. They all share
//! the [`Cached`] skeleton and differ only in where their tag comes from and
//! what they hand to the computation:
//!
//! | Variant                       | Tag                               | Computation receives      |
//! |-------------------------------|-----------------------------------|---------------------------|
//! | [`SimpleHelperReference`]     | arguments                         | positional + named values |
//! | [`ClassBasedHelperReference`] | instance recompute tag ⊕ arguments | positional + named values |
//! | [`InternalHelperReference`]   | arguments                         | the raw [`Args`]          |
//! | [`GetHelperReference`]        | source ⊕ path ⊕ resolved child     | dynamic property lookup   |
//! | [`HashHelperReference`]       | named arguments                   | named values as an object |

use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::{Cached, PropertyReference, Ref, Reference};
use crate::env::Env;
use crate::error::EvalError;
use crate::tag::{combine, combine_tagged, Clock, Tag, Tagged};
use crate::value::{Object, Value};

/// A plain helper function.
pub type HelperFn =
    Arc<dyn Fn(&[Value], &IndexMap<String, Value>) -> Result<Value, EvalError> + Send + Sync>;

/// A helper that inspects the argument structure itself.
pub type InternalHelperFn = Arc<dyn Fn(&Args) -> Result<Value, EvalError> + Send + Sync>;

// ----------------------------------------------------------------------------
// Arguments
// ----------------------------------------------------------------------------

/// Positional argument references.
#[derive(Clone)]
pub struct PositionalArgs {
    references: Vec<Ref>,
    tag: Tag,
}

impl PositionalArgs {
    /// Wrap `references`.
    pub fn new(references: Vec<Ref>) -> Self {
        let tag = combine_tagged(references.iter());
        Self { references, tag }
    }

    /// The reference at `index`.
    pub fn at(&self, index: usize) -> Option<&Ref> {
        self.references.get(index)
    }

    /// Evaluate every argument.
    pub fn value(&self) -> Vec<Value> {
        self.references.iter().map(|r| r.value()).collect()
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl Tagged for PositionalArgs {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

/// Named argument references, in declaration order.
#[derive(Clone)]
pub struct NamedArgs {
    references: IndexMap<String, Ref>,
    tag: Tag,
}

impl NamedArgs {
    /// Wrap `references`.
    pub fn new(references: IndexMap<String, Ref>) -> Self {
        let tag = combine_tagged(references.values());
        Self { references, tag }
    }

    /// The reference for `name`.
    pub fn get(&self, name: &str) -> Option<&Ref> {
        self.references.get(name)
    }

    /// Argument names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.references.keys().map(String::as_str)
    }

    /// Evaluate every argument.
    pub fn value(&self) -> IndexMap<String, Value> {
        self.references
            .iter()
            .map(|(name, r)| (name.clone(), r.value()))
            .collect()
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl Tagged for NamedArgs {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

/// A complete argument list.
#[derive(Clone)]
pub struct Args {
    /// Positional arguments.
    pub positional: PositionalArgs,
    /// Named arguments.
    pub named: NamedArgs,
    tag: Tag,
}

impl Args {
    /// Build an argument list.
    pub fn new(positional: Vec<Ref>, named: IndexMap<String, Ref>) -> Self {
        let positional = PositionalArgs::new(positional);
        let named = NamedArgs::new(named);
        let tag = combine([positional.tag(), named.tag()]);
        Self {
            positional,
            named,
            tag,
        }
    }

    /// Only positional arguments.
    pub fn positional(positional: Vec<Ref>) -> Self {
        Self::new(positional, IndexMap::new())
    }

    /// Only named arguments.
    pub fn named(named: IndexMap<String, Ref>) -> Self {
        Self::new(Vec::new(), named)
    }
}

impl Tagged for Args {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("positional", &self.positional.len())
            .field("named", &self.named.names().collect::<Vec<_>>())
            .field("tag", &self.tag)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Stateful helpers
// ----------------------------------------------------------------------------

/// A helper instance that can ask to be recomputed on its own.
pub trait StatefulHelper: Send + Sync {
    /// Dirtied by the instance when its output would change even with the
    /// same arguments.
    fn recompute_tag(&self) -> Tag;

    /// Produce the helper's value.
    fn compute(
        &self,
        positional: &[Value],
        named: &IndexMap<String, Value>,
    ) -> Result<Value, EvalError>;
}

/// The recompute signal a [`StatefulHelper`] usually embeds.
#[derive(Debug, Clone)]
pub struct RecomputeSignal {
    tag: Tag,
}

impl RecomputeSignal {
    /// A signal on `clock`.
    pub fn new(clock: &Clock) -> Self {
        Self {
            tag: Tag::dirtyable(clock),
        }
    }

    /// The tag to expose from [`StatefulHelper::recompute_tag`].
    pub fn tag(&self) -> Tag {
        self.tag.clone()
    }

    /// Force every reference built on this helper to recompute.
    pub fn recompute(&self) {
        self.tag.dirty();
    }
}

// ----------------------------------------------------------------------------
// References
// ----------------------------------------------------------------------------

/// Invokes a plain function with the argument values.
pub struct SimpleHelperReference {
    helper: HelperFn,
    args: Args,
    tag: Tag,
    cache: Cached<Value>,
    env: Env,
}

impl SimpleHelperReference {
    /// Apply `helper` to `args`.
    pub fn new(env: &Env, helper: HelperFn, args: Args) -> Self {
        Self {
            tag: args.tag(),
            helper,
            args,
            cache: Cached::new(),
            env: env.clone(),
        }
    }

    fn compute(&self) -> Result<Value, EvalError> {
        (self.helper)(&self.args.positional.value(), &self.args.named.value())
    }
}

impl Tagged for SimpleHelperReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for SimpleHelperReference {
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

/// Invokes a [`StatefulHelper`] instance.
pub struct ClassBasedHelperReference {
    instance: Arc<dyn StatefulHelper>,
    args: Args,
    tag: Tag,
    cache: Cached<Value>,
    env: Env,
}

impl ClassBasedHelperReference {
    /// Apply `instance` to `args`.
    pub fn new(env: &Env, instance: Arc<dyn StatefulHelper>, args: Args) -> Self {
        Self {
            tag: combine([instance.recompute_tag(), args.tag()]),
            instance,
            args,
            cache: Cached::new(),
            env: env.clone(),
        }
    }

    fn compute(&self) -> Result<Value, EvalError> {
        self.instance
            .compute(&self.args.positional.value(), &self.args.named.value())
    }
}

impl Tagged for ClassBasedHelperReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for ClassBasedHelperReference {
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

/// Invokes a helper with the raw argument structure.
pub struct InternalHelperReference {
    helper: InternalHelperFn,
    args: Args,
    tag: Tag,
    cache: Cached<Value>,
    env: Env,
}

impl InternalHelperReference {
    /// Apply `helper` to `args`.
    pub fn new(env: &Env, helper: InternalHelperFn, args: Args) -> Self {
        Self {
            tag: args.tag(),
            helper,
            args,
            cache: Cached::new(),
            env: env.clone(),
        }
    }
}

impl Tagged for InternalHelperReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for InternalHelperReference {
    fn value(&self) -> Value {
        self.cache.get(&self.tag, || (self.helper)(&self.args))
    }

    fn get(self: Arc<Self>, key: &str) -> Ref {
        let env = self.env.clone();
        Arc::new(PropertyReference::new(self, key, &env))
    }

    fn invalidate(&self) {
        self.cache.invalidate();
    }
}

/// Looks up a property whose key is itself a reference.
///
/// The derived child reference is kept while the key stays the same, and an
/// updatable tag follows the child's tag so that mutations below the source
/// are observed too.
pub struct GetHelperReference {
    source: Ref,
    path: Ref,
    child: Mutex<Option<(String, Ref)>>,
    child_tag: Tag,
    tag: Tag,
    cache: Cached<Value>,
    env: Env,
}

impl GetHelperReference {
    /// Look up `path`'s value on `source`.
    pub fn new(env: &Env, source: Ref, path: Ref) -> Self {
        let child_tag = Tag::updatable(env.clock(), env.current_tag());
        let tag = combine([source.tag(), path.tag(), child_tag.clone()]);
        Self {
            source,
            path,
            child: Mutex::new(None),
            child_tag,
            tag,
            cache: Cached::new(),
            env: env.clone(),
        }
    }

    fn compute(&self) -> Result<Value, EvalError> {
        let key = match self.path.value() {
            Value::String(key) if !key.is_empty() => key.to_string(),
            Value::Number(n) if n.is_finite() => Value::Number(n).to_string(),
            other => {
                self.child_tag.update(Tag::constant());
                return Err(EvalError::InvalidKey(format!("{other:?}")));
            }
        };

        let child = {
            let mut slot = self.child.lock();
            match &*slot {
                Some((cached_key, child)) if *cached_key == key => child.clone(),
                _ => {
                    let child = self.source.clone().get(&key);
                    *slot = Some((key, child.clone()));
                    child
                }
            }
        };

        self.child_tag.update(child.tag());
        Ok(child.value())
    }
}

impl Tagged for GetHelperReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for GetHelperReference {
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

/// Collects the named arguments into a fresh object.
pub struct HashHelperReference {
    named: NamedArgs,
    tag: Tag,
    cache: Cached<Value>,
    env: Env,
}

impl HashHelperReference {
    /// Build an object from `args.named`.
    pub fn new(env: &Env, args: Args) -> Self {
        Self {
            tag: args.named.tag(),
            named: args.named,
            cache: Cached::new(),
            env: env.clone(),
        }
    }
}

impl Tagged for HashHelperReference {
    fn tag(&self) -> Tag {
        self.tag.clone()
    }
}

impl Reference for HashHelperReference {
    fn value(&self) -> Value {
        self.cache.get(&self.tag, || {
            Ok(Value::Object(Object::with_properties(
                self.env.clock(),
                self.named.value(),
            )))
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

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
