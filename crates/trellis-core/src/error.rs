//! Error types for the trellis core.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the core.
///
/// Geometry contract violations never appear here: layout is total and
/// absorbs malformed constraints by clamping. These variants cover
/// programming errors in the integration layer and unrecoverable resource
/// failures.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    /// A structural tree invariant was violated, such as attaching a node
    /// that already has a parent or removing a node that is not a child.
    #[error("structure: {0}")]
    Structure(String),

    /// The hosting platform refused a backing-store operation. Fatal for the
    /// surface concerned; never retried internally.
    #[error("backend: {0}")]
    Backend(String),

    /// An event could not be dispatched, for example a bubbling event with
    /// no origin node.
    #[error("dispatch: {0}")]
    Dispatch(String),

    /// Invalid input from a calling layer, such as a malformed node name or
    /// a widget factory parameter of the wrong shape.
    #[error("invalid: {0}")]
    Invalid(String),
}
