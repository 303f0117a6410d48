//! Declared descriptors attached to callables.
//!
//! Descriptors can be given in three places. When a callable is added to a
//! runner the engine picks, per descriptor:
//!
//! 1. what was set on the [`Handle`](crate::runner::Handle) after adding
//! 2. what was declared for the callable in the runner's [`Declarations`]
//! 3. what the callable infers or brings itself
//! 4. the defaults: no requirements, filed by result type
//!
//! Declarations are keyed by [`CallableId`], so every runner the callable is
//! added to sees the same declaration. Declaring a descriptor again
//! overwrites the previous one. A function is declared once for all its
//! uses; a value callable such as a [`dynamic`](crate::callable::dynamic)
//! one is declared per instance, and its clones share the declaration.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use relay_context::prelude::*;
//! use relay_runner::declare::Declarations;
//!
//! struct Apple;
//! fn magician(_apple: Arc<Apple>) -> u32 { 21 }
//!
//! let declarations = Declarations::new();
//! declarations.declare(magician).returns("age");
//!
//! let declared = declarations.get_for(magician).unwrap();
//! assert_eq!(declared.returns, Some(Returns::key("age")));
//! ```

use std::sync::{Arc, LazyLock};

use hashbrown::HashMap;
use parking_lot::RwLock;
use relay_context::error::ConfigurationError;
use relay_context::requirement::Requires;
use relay_context::returns::Returns;

use crate::callable::{Callable, CallableId, IntoCallable};

/// Descriptors declared for one callable.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    /// Declared requirements, if any.
    pub requires: Option<Requires>,
    /// Declared return descriptor, if any.
    pub returns: Option<Returns>,
}

/// Registry of declared descriptors, keyed by callable identity.
///
/// Uses interior mutability via [`RwLock`] so declarations can be made
/// through a shared reference while runners read them.
#[derive(Default)]
pub struct Declarations {
    entries: RwLock<HashMap<CallableId, Declaration>>,
}

static GLOBAL: LazyLock<Arc<Declarations>> = LazyLock::new(|| Arc::new(Declarations::new()));

impl Declarations {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the process-wide registry used by [`Runner::new`].
    ///
    /// [`Runner::new`]: crate::runner::Runner::new
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Starts declaring descriptors for `callable`.
    pub fn declare<M>(&self, callable: impl IntoCallable<M>) -> Declarer<'_> {
        Declarer {
            declarations: self,
            id: callable.into_callable().id(),
        }
    }

    /// Returns the declaration for an identity.
    #[must_use]
    pub fn get(&self, id: &CallableId) -> Option<Declaration> {
        self.entries.read().get(id).cloned()
    }

    /// Returns the declaration for a callable.
    #[must_use]
    pub fn get_for<M>(&self, callable: impl IntoCallable<M>) -> Option<Declaration> {
        self.get(&callable.into_callable().id())
    }

    /// Removes and returns the declaration for an identity.
    pub fn remove(&self, id: &CallableId) -> Option<Declaration> {
        self.entries.write().remove(id)
    }

    /// Returns the number of declared callables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Resolves the effective descriptors of `callable`.
    ///
    /// Declared descriptors win over what the callable brings itself.
    pub(crate) fn effective(&self, callable: &dyn Callable) -> (Requires, Returns) {
        let declared = self.get(&callable.id()).unwrap_or_default();
        let requires = declared
            .requires
            .or_else(|| callable.default_requires())
            .unwrap_or_default();
        let returns = declared
            .returns
            .or_else(|| callable.default_returns())
            .unwrap_or_default();
        (requires, returns)
    }

    fn update(&self, id: &CallableId, f: impl FnOnce(&mut Declaration)) {
        f(self.entries.write().entry(id.clone()).or_default());
    }
}

impl core::fmt::Debug for Declarations {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Declarations")
            .field("len", &self.len())
            .finish()
    }
}

/// Builder returned by [`Declarations::declare`].
pub struct Declarer<'a> {
    declarations: &'a Declarations,
    id: CallableId,
}

impl Declarer<'_> {
    /// Declares the requirements of the callable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateParameter`] if a keyword name
    /// appears twice. Nothing is recorded in that case.
    pub fn requires(self, requires: Requires) -> Result<Self, ConfigurationError> {
        requires.validate()?;
        self.declarations
            .update(&self.id, |declaration| declaration.requires = Some(requires));
        Ok(self)
    }

    /// Declares the return descriptor of the callable.
    pub fn returns(self, returns: impl Into<Returns>) -> Self {
        let returns = returns.into();
        self.declarations
            .update(&self.id, |declaration| declaration.returns = Some(returns));
        self
    }
}

/// Starts a declaration in the [global](Declarations::global) registry.
pub fn declare<M>(callable: impl IntoCallable<M>) -> Declarer<'static> {
    Declarer {
        declarations: GLOBAL.as_ref(),
        id: callable.into_callable().id(),
    }
}
