//! Error types.
//!
//! There are two channels and they never mix:
//!
//! - [`BindingError`] is a configuration mistake found while building a
//!   reference. It is returned to the caller and must be handled.
//! - [`EvalError`] is a degradation found while recomputing a value. It is
//!   absorbed at the reference that hit it, which then yields the neutral
//!   value instead of failing the render pass.

use thiserror::Error;

/// Malformed binding syntax, detected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// `class` was used as the target of an attribute binding.
    #[error("you cannot use class as an attributeBinding, use classNameBindings instead (in `{microsyntax}`)")]
    ClassAsAttribute {
        /// The offending binding descriptor.
        microsyntax: String,
    },

    /// The binding names no property.
    #[error("binding `{microsyntax}` does not name a property")]
    EmptyPath {
        /// The offending binding descriptor.
        microsyntax: String,
    },
}

/// A recoverable failure while computing a reference's value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A property was looked up on a value that has no properties.
    #[error("cannot read property `{key}` of a non-object value")]
    NotAddressable {
        /// The property that was requested.
        key: String,
    },

    /// A dynamic key evaluated to something that is not a string or number.
    #[error("invalid property key: {0}")]
    InvalidKey(String),

    /// A helper rejected its arguments.
    #[error("helper failed: {0}")]
    Helper(String),
}
