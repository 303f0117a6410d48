//! Resolution and configuration errors.

/// A requirement could not be resolved from the current context.
///
/// Carries the rendered requirement (including any part path) and the keys
/// that were available at the time, sorted for stable diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not resolve {requirement}; available: [{}]", .available.join(", "))]
pub struct MissingRequirement {
    /// The requirement that failed, e.g. `'config'['db'].url`.
    pub requirement: String,
    /// Keys present in the context when resolution failed.
    pub available: Vec<String>,
}

/// A descriptor was malformed or did not match what a callable returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// The same keyword parameter name was bound more than once.
    #[error("parameter `{0}` is bound more than once")]
    DuplicateParameter(String),

    /// A multi-key return did not receive one value per key.
    #[error("expected {expected} returned values, got {actual}")]
    ArityMismatch {
        /// Number of keys declared.
        expected: usize,
        /// Number of values returned.
        actual: usize,
    },

    /// A sequence return received something other than `Vec<Value>`.
    #[error("expected a sequence of values, got {0}")]
    NotASequence(&'static str),

    /// A mapping return received something that is not a key/value mapping.
    #[error("expected a mapping of resources, got {0}")]
    NotAMapping(&'static str),

    /// A label exists in both runners being combined.
    #[error("label `{0}` is present in both runners")]
    DuplicateLabel(String),
}

/// A resolved argument was absent or of an unexpected type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    /// No positional argument at this position.
    #[error("missing positional argument {0}")]
    MissingPositional(usize),

    /// No keyword argument with this name.
    #[error("missing keyword argument `{0}`")]
    MissingKeyword(String),

    /// More positional arguments were resolved than the callable accepts.
    #[error("unexpected positional argument {0}")]
    UnexpectedPositional(usize),

    /// A keyword argument was resolved for a callable that takes none.
    #[error("unexpected keyword argument `{0}`")]
    UnexpectedKeyword(String),

    /// The argument holds a different type than requested.
    #[error("argument {argument} is a {actual}, expected {expected}")]
    TypeMismatch {
        /// Position or keyword name of the argument.
        argument: String,
        /// The requested type.
        expected: &'static str,
        /// The type actually held.
        actual: &'static str,
    },
}
