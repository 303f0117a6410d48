//! # Relay Internal Library
//!
//! Re-exports the core relay crates for convenience.

/// Layer 1: Keys, values, context and descriptors.
pub use relay_context;

/// Layer 2: Runners and the execution engine.
pub use relay_runner;

/// Layer 3: Ready-made collaborator callables.
pub use relay_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use relay_core_plugins::{ConfigLoader, TracingFormat, TracingSetup};
    pub use relay_runner::prelude::*;
}
