//! Runners and the execution engine for relay (Layer 2).
//!
//! `relay_runner` assembles callables into ordered, re-invocable pipelines
//! and runs them, resolving each callable's arguments from the resources
//! produced by the callables before it.
//!
//! # Core Concepts
//!
//! - [`Callable`] - Anything a runner can invoke; functions convert via [`IntoCallable`]
//! - [`Declarations`] - Descriptors declared for callables ahead of time
//! - [`Point`] - One callable wired into a runner, with its descriptors and labels
//! - [`Runner`] - The ordered pipeline, with labels as insertion addresses
//! - [`Invocation`] - One walk over a runner's points, including scope unwinding
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use relay_runner::prelude::*;
//!
//! struct Apple;
//! struct Orange;
//!
//! fn apple_tree() -> Apple { Apple }
//! fn magician(_apple: Arc<Apple>) -> Orange { Orange }
//!
//! let mut runner = Runner::new();
//! runner.add(apple_tree);
//! runner.add(magician);
//!
//! let ctx = runner.run()?;
//! assert!(ctx.resource::<Orange>().is_some());
//! # Ok::<(), RunnerError>(())
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`relay_context`): Keys, values, descriptors
//! - **Layer 2** (`relay_runner`): Points, runners, and the execution engine (this crate)
//! - **Layer 3** (`relay_core_plugins`): Ready-made collaborator callables

/// Callables and conversions into them.
pub mod callable;

/// Declared descriptors keyed by callable identity.
pub mod declare;

/// Runner errors.
pub mod error;

/// Invocation engine.
pub mod executor;

/// Points wired into a runner.
pub mod point;

/// Runner construction, addressing and composition.
pub mod runner;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::callable::{
        BoxError, Callable, CallableId, DynamicCallable, Entered, Fallible, FromArg,
        FunctionCallable, IntoCallable, Scope, ScopeCallable, ScopeProvider, dynamic, fallible,
    };
    pub use crate::declare::{Declaration, Declarations, Declarer, declare};
    pub use crate::error::RunnerError;
    pub use crate::executor::{ExecutionState, Invocation};
    pub use crate::point::{BoxedCallable, Point};
    pub use crate::runner::{Handle, Runner, Step, step};
    pub use relay_context::prelude::*;
}

// Re-export key types at crate root for convenience
pub use callable::{BoxError, Callable, IntoCallable};
pub use declare::Declarations;
pub use error::RunnerError;
pub use executor::Invocation;
pub use point::Point;
pub use runner::Runner;
