//! Tagref Core
//!
//! This crate provides revision-tracked references for incremental
//! rendering. It implements:
//!
//! - Validity tags driven by a monotonic revision clock
//! - Lazily evaluated, memoized references (properties, helpers,
//!   conditionals, attribute and class-name bindings)
//! - An object model whose in-place mutations dirty per-object tags
//!
//! A renderer reads a reference's value once, remembers the tag's revision,
//! and on the next pass only re-reads the references whose tags no longer
//! validate that revision.
//!
//! # Architecture
//!
//! - `tag`: the revision clock and the tag variants
//! - `reference`: the reference graph and the shared memoization block
//! - [`Env`]: the clock plus the property-access and truthiness policies,
//!   passed explicitly to every reference that needs them
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tagref_core::{Env, Ref, Reference, RootReference, Tagged, Value};
//!
//! let env = Env::default();
//! let person = env.object();
//! person.set("name", Value::from("tom"));
//!
//! let root: Ref = Arc::new(RootReference::new(&env, person.clone()));
//! let name = root.get("name");
//!
//! let tag = name.tag();
//! assert_eq!(name.value(), Value::from("tom"));
//! let seen = tag.value();
//! assert!(tag.validate(seen));
//!
//! person.set("name", Value::from("zoey"));
//! assert!(!tag.validate(seen));
//! assert_eq!(name.value(), Value::from("zoey"));
//! ```

pub mod reference;
pub mod tag;

mod env;
mod error;
mod string;
mod value;

pub use env::{Env, ObjectModel, PropertyAccess, Truthiness};
pub use error::{BindingError, EvalError};
pub use reference::{
    apply_class_name_binding, null_reference, Args, AttributeBindingReference,
    AttributeOperations, CacheState, Cached, ClassBasedHelperReference,
    ColonClassNameBindingReference, ConditionalReference, ConstConditionalReference,
    ConstReference, GetHelperReference, HashHelperReference, HelperFn, InternalHelperFn,
    InternalHelperReference, NamedArgs, PositionalArgs, PropertyReference, RecomputeSignal, Ref,
    Reference, RootReference, SimpleClassNameBindingReference, SimpleHelperReference,
    StatefulHelper, UnboundReference, UpdatableReference,
};
pub use string::{dasherize, decamelize};
pub use tag::{combine, combine_tagged, Clock, Revision, Tag, Tagged, CONSTANT_REVISION};
pub use value::{to_bool, Object, Value};
