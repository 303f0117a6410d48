//! Wire plain functions into ordered, re-invocable pipelines.
//!
//! Each callable's arguments are resolved from the results of the callables
//! that ran before it, by type, by name, or by a path into a structured
//! value.
//!
//! ```
//! use std::sync::Arc;
//! use relay::prelude::*;
//!
//! struct Apple;
//! struct Orange;
//! struct Juice;
//!
//! fn apple_tree() -> Apple { Apple }
//! fn magician(_apple: Arc<Apple>) -> Orange { Orange }
//! fn juicer(_apple: Arc<Apple>, _orange: Arc<Orange>) -> Juice { Juice }
//!
//! let mut runner = Runner::new();
//! runner.add(apple_tree);
//! runner.add(magician);
//! runner.add(juicer);
//!
//! let ctx = runner.run()?;
//! assert!(ctx.resource::<Juice>().is_some());
//! # Ok::<(), RunnerError>(())
//! ```

pub use relay_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use relay_internal::prelude::*;
}
