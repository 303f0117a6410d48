//! Errors produced while building or running a runner.

use relay_context::error::{ConfigurationError, MissingRequirement};

use crate::callable::BoxError;

/// Errors that can occur while building or running a [`Runner`].
///
/// Failures raised by callables travel as [`RunnerError::Callable`] and keep
/// their original type, so callers can recover them with
/// [`downcast_ref`](Self::downcast_ref).
///
/// [`Runner`]: crate::runner::Runner
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A requirement could not be resolved from the context.
    #[error(transparent)]
    MissingRequirement(#[from] MissingRequirement),

    /// No point carries the requested label.
    #[error("label `{0}` not found")]
    LabelNotFound(String),

    /// The callable to replace is not present in the runner.
    #[error("callable `{0}` not found in runner")]
    ReplaceTargetNotFound(String),

    /// The callable to replace is held by several points.
    #[error("callable `{name}` is held by {count} points")]
    AmbiguousReplaceTarget {
        /// Name of the callable.
        name: String,
        /// Number of points holding it.
        count: usize,
    },

    /// A descriptor was malformed or did not match a callable's result.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A callable, or a scope exiting, raised an error.
    #[error("{0}")]
    Callable(#[source] BoxError),
}

impl RunnerError {
    /// Returns the callable error as a `E`, if that is what this is.
    #[must_use]
    pub fn downcast_ref<E: core::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Callable(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns the boxed callable error, or `self` if this is another kind.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when it is not [`RunnerError::Callable`].
    pub fn into_callable_error(self) -> Result<BoxError, Self> {
        match self {
            Self::Callable(err) => Ok(err),
            other => Err(other),
        }
    }
}
