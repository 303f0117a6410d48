//! Points: one callable wired into a runner.

use core::fmt;
use std::collections::BTreeSet;
use std::sync::Arc;

use relay_context::requirement::Requires;
use relay_context::returns::Returns;

use crate::callable::{Callable, CallableId};

/// A shared, type-erased callable.
///
/// Copies of a runner share their callables; only the points are copied.
pub type BoxedCallable = Arc<dyn Callable>;

/// A callable plus its effective descriptors and the labels that name it.
///
/// Points are created by the runner; a label lives on at most one point of
/// a runner at a time.
#[derive(Clone)]
pub struct Point {
    pub(crate) callable: BoxedCallable,
    pub(crate) requires: Requires,
    pub(crate) returns: Returns,
    pub(crate) labels: BTreeSet<String>,
}

impl Point {
    pub(crate) fn new(callable: BoxedCallable, requires: Requires, returns: Returns) -> Self {
        Self {
            callable,
            requires,
            returns,
            labels: BTreeSet::new(),
        }
    }

    /// Returns the callable's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.callable.name()
    }

    /// Returns the callable's identity.
    #[must_use]
    pub fn id(&self) -> CallableId {
        self.callable.id()
    }

    /// Returns the callable.
    #[must_use]
    pub fn callable(&self) -> &BoxedCallable {
        &self.callable
    }

    /// Returns the effective requirements.
    #[must_use]
    pub fn requires(&self) -> &Requires {
        &self.requires
    }

    /// Returns the effective return descriptor.
    #[must_use]
    pub fn returns(&self) -> &Returns {
        &self.returns
    }

    /// Returns the labels on this point, sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Returns `true` if the callable is entered as a scope.
    #[must_use]
    pub fn is_scope(&self) -> bool {
        self.callable.as_scope().is_some()
    }
}

/// Renders `name requires(..) returns..() <-- label, ...`.
impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name(), self.requires, self.returns)?;
        if !self.labels.is_empty() {
            let labels: Vec<&str> = self.labels().collect();
            write!(f, " <-- {}", labels.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
