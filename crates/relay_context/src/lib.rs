//! The resource layer of relay (Layer 1).
//!
//! `relay_context` provides everything a pipeline needs to move values from
//! one callable to the next:
//!
//! - [`key`] - Resource keys (a type or a string name)
//! - [`value`] - Type-erased shared values and structural navigation
//! - [`context`] - The per-invocation resource store
//! - [`requirement`] - What a callable needs, and how it is resolved
//! - [`returns`] - How a callable's result is filed back into the store
//! - [`error`] - Resolution and configuration errors
//!
//! # Architecture
//!
//! - **Layer 1** (`relay_context`): Keys, values, descriptors (this crate)
//! - **Layer 2** (`relay_runner`): Points, runners, and the execution engine
//! - **Layer 3** (`relay_core_plugins`): Ready-made collaborator callables
//!
//! # Example
//!
//! ```
//! use relay_context::prelude::*;
//!
//! struct Apple;
//!
//! let mut ctx = Context::new();
//! Returns::ResultType.file(Value::new(Apple), &mut ctx).unwrap();
//! Returns::key("age").file(Value::new(42_u32), &mut ctx).unwrap();
//!
//! let args = Requires::new()
//!     .arg(Requirement::of::<Apple>())
//!     .kwarg("age", "age")
//!     .resolve(&ctx)
//!     .unwrap();
//!
//! assert!(args.get::<Apple>(0).is_ok());
//! assert_eq!(*args.keyword::<u32>("age").unwrap(), 42);
//! ```

/// Per-invocation resource storage.
pub mod context;

/// Resolution and configuration errors.
pub mod error;

/// Resource keys.
pub mod key;

/// Requirement descriptors and argument resolution.
pub mod requirement;

/// Return descriptors and result filing.
pub mod returns;

/// Type-erased values and structural navigation.
pub mod value;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::context::*;
    pub use crate::error::*;
    pub use crate::key::*;
    pub use crate::requirement::*;
    pub use crate::returns::*;
    pub use crate::value::*;
}
