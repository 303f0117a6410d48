//! Callables that can be wired into a runner.
//!
//! [`Callable`] is the object-safe interface the engine drives. Most users
//! never implement it: [`IntoCallable`] converts ordinary functions,
//! closures and scope providers into one.
//!
//! # Typed functions
//!
//! Functions and closures of up to eight parameters convert directly. Each
//! parameter must implement [`FromArg`]:
//!
//! - `Arc<T>` - the resource filed under `T`
//! - `Option<Arc<T>>` - the resource filed under `T`, or `None`
//! - [`Value`] - any resolved value, untyped
//!
//! When nothing else is declared, the requirement list is inferred from
//! these parameter types. The return value is filed under its own type;
//! returning `()` files nothing.
//!
//! ```
//! use std::sync::Arc;
//! use relay_runner::callable::{Callable, IntoCallable};
//!
//! struct Apple;
//! struct Orange;
//!
//! fn magician(_apple: Arc<Apple>) -> Orange {
//!     Orange
//! }
//!
//! let callable = magician.into_callable();
//! assert_eq!(callable.name(), "magician");
//! assert_eq!(callable.default_requires().unwrap().to_string(), "requires(Apple)");
//! ```
//!
//! Functions returning `Result` are wrapped with [`fallible`], and closures
//! that need keyword arguments take the raw [`Args`] through [`dynamic`].
//!
//! # Scopes
//!
//! A [`ScopeProvider`] is entered rather than called. Entering produces a
//! value to file and a [`Scope`] that stays open until the runner finishes,
//! and which may suppress an error raised by anything that ran after it.

use core::any::TypeId;
use core::marker::PhantomData;
use std::sync::Arc;

use relay_context::error::ArgError;
use relay_context::requirement::{Args, Requirement, Requires, downcast_arg};
use relay_context::returns::Returns;
use relay_context::value::Value;
use variadics_please::all_tuples;

use crate::error::RunnerError;

/// The error type of wired callables.
///
/// Errors are boxed once when a callable fails and travel through the engine
/// untouched, so callers can downcast them back to the original type.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Identity of a callable.
///
/// Function items and closures each have a distinct type, so their identity
/// is the [`TypeId`] of what they were built from. Callables that are values
/// (configured structs, [`dynamic`] closures) can be instantiated many times
/// from one type; they carry an instance identity from
/// [`CallableId::unique`] instead, which clones share.
///
/// Instance identities are nanoids, held as `Arc<str>` for cheap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallableId(Identity);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Type(TypeId),
    Instance(Arc<str>),
}

impl CallableId {
    /// Creates the identity for callables built from `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Identity::Type(TypeId::of::<T>()))
    }

    /// Creates a fresh instance identity.
    #[must_use]
    pub fn unique() -> Self {
        Self(Identity::Instance(nanoid::nanoid!().into()))
    }

    /// Returns `true` if this identity belongs to one instance rather than a type.
    #[must_use]
    pub fn is_instance(&self) -> bool {
        matches!(self.0, Identity::Instance(_))
    }
}

/// Object-safe interface for anything a runner can invoke.
pub trait Callable: Send + Sync + 'static {
    /// Returns the name shown in debug output and logs.
    fn name(&self) -> &str;

    /// Returns the identity used by declarations and [`Runner::replace`].
    ///
    /// [`Runner::replace`]: crate::runner::Runner::replace
    fn id(&self) -> CallableId;

    /// Requirements used when none are declared or given at add-time.
    fn default_requires(&self) -> Option<Requires> {
        None
    }

    /// Return descriptor used when none is declared or given at add-time.
    fn default_returns(&self) -> Option<Returns> {
        None
    }

    /// Calls the callable with resolved arguments.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying function produced.
    fn call(&self, args: Args) -> Result<Value, BoxError>;

    /// Returns the scope capability, if this callable has one.
    fn as_scope(&self) -> Option<&dyn ScopeProvider> {
        None
    }
}

/// Conversion into a [`Callable`].
///
/// # Marker Types
///
/// The `Marker` type parameter allows multiple implementations for the same
/// function type (functions with different parameter counts).
pub trait IntoCallable<Marker>: Sized {
    /// The resulting callable type.
    type Callable: Callable;

    /// Converts this into a callable.
    fn into_callable(self) -> Self::Callable;
}

/// Marker for types that already implement [`Callable`].
pub struct CallableMarker;

impl<C: Callable> IntoCallable<CallableMarker> for C {
    type Callable = C;

    fn into_callable(self) -> Self::Callable {
        self
    }
}

/// A parameter type that typed functions can receive.
pub trait FromArg: Sized {
    /// The requirement inferred for this parameter, if one can be.
    fn requirement() -> Option<Requirement>;

    /// Extracts the parameter from a resolved value.
    ///
    /// # Errors
    ///
    /// Returns [`ArgError::TypeMismatch`] if the value has the wrong type.
    fn from_arg(value: Value, position: usize) -> Result<Self, ArgError>;
}

impl<T: Send + Sync + 'static> FromArg for Arc<T> {
    fn requirement() -> Option<Requirement> {
        Some(Requirement::of::<T>())
    }

    fn from_arg(value: Value, position: usize) -> Result<Self, ArgError> {
        downcast_arg::<T>(&value, || position.to_string())
    }
}

impl<T: Send + Sync + 'static> FromArg for Option<Arc<T>> {
    fn requirement() -> Option<Requirement> {
        Some(Requirement::of::<T>().or_nothing())
    }

    fn from_arg(value: Value, position: usize) -> Result<Self, ArgError> {
        if value.is_nothing() {
            return Ok(None);
        }
        downcast_arg::<T>(&value, || position.to_string()).map(Some)
    }
}

impl FromArg for Value {
    fn requirement() -> Option<Requirement> {
        None
    }

    fn from_arg(value: Value, _position: usize) -> Result<Self, ArgError> {
        Ok(value)
    }
}

/// Hands out positional arguments to a typed function in order.
struct ArgCursor {
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl ArgCursor {
    fn new(args: Args) -> Result<Self, ArgError> {
        let (positional, keyword) = args.into_parts();
        if let Some((name, _)) = keyword.first() {
            return Err(ArgError::UnexpectedKeyword(name.clone()));
        }
        Ok(Self {
            values: positional.into_iter(),
            position: 0,
        })
    }

    fn next<P: FromArg>(mut self) -> Result<(P, Self), ArgError> {
        let position = self.position;
        let value = self
            .values
            .next()
            .ok_or(ArgError::MissingPositional(position))?;
        self.position += 1;
        Ok((P::from_arg(value, position)?, self))
    }

    fn finish(mut self) -> Result<(), ArgError> {
        match self.values.next() {
            Some(_) => Err(ArgError::UnexpectedPositional(self.position)),
            None => Ok(()),
        }
    }
}

fn infer_requires(requirements: Vec<Option<Requirement>>) -> Option<Requires> {
    requirements
        .into_iter()
        .try_fold(Requires::new(), |requires, requirement| {
            Some(requires.arg(requirement?))
        })
}

/// Returns the last path segment of a function or type name.
///
/// Closures are named after the function that defines them.
fn function_name<F: ?Sized>() -> &'static str {
    let full = core::any::type_name::<F>();
    let path = full.split('<').next().unwrap_or(full);
    let path = path.strip_suffix("::{{closure}}").unwrap_or(path);
    path.rsplit("::").next().unwrap_or(path)
}

/// A callable wrapping a typed function.
///
/// Created via [`IntoCallable`] for functions and closures.
pub struct FunctionCallable<F, Marker> {
    func: F,
    name: &'static str,
    _marker: PhantomData<fn() -> Marker>,
}

impl<F, Marker> FunctionCallable<F, Marker> {
    fn new(func: F) -> Self {
        Self {
            func,
            name: function_name::<F>(),
            _marker: PhantomData,
        }
    }
}

/// Marker for infallible function callables.
pub struct FunctionMarker;

/// Marker for function callables returning `Result`.
pub struct FallibleMarker;

/// Wraps a function returning `Result<R, E>` so its error propagates.
///
/// The callable keeps the identity of the wrapped function.
///
/// ```
/// use std::sync::Arc;
/// use relay_runner::callable::{Callable, IntoCallable, fallible};
/// use relay_context::requirement::Args;
///
/// fn parse(text: Arc<String>) -> Result<u32, std::num::ParseIntError> {
///     text.parse()
/// }
///
/// let callable = fallible(parse).into_callable();
/// let args = Args::new(vec![relay_context::value::Value::new("x".to_string())], Vec::new());
/// assert!(callable.call(args).is_err());
/// ```
pub struct Fallible<F>(F);

/// Wraps a function returning `Result<R, E>`.
pub fn fallible<F>(func: F) -> Fallible<F> {
    Fallible(func)
}

macro_rules! impl_function_callable {
    ($(($param:ident, $arg:ident)),*) => {
        impl<F, R, $($param),*> IntoCallable<(FunctionMarker, $($param,)*)> for F
        where
            F: Fn($($param),*) -> R + Send + Sync + 'static,
            R: Send + Sync + 'static,
            $($param: FromArg + 'static,)*
        {
            type Callable = FunctionCallable<F, (FunctionMarker, $($param,)*)>;

            fn into_callable(self) -> Self::Callable {
                FunctionCallable::new(self)
            }
        }

        impl<F, R, $($param),*> Callable for FunctionCallable<F, (FunctionMarker, $($param,)*)>
        where
            F: Fn($($param),*) -> R + Send + Sync + 'static,
            R: Send + Sync + 'static,
            $($param: FromArg + 'static,)*
        {
            fn name(&self) -> &str {
                self.name
            }

            fn id(&self) -> CallableId {
                CallableId::of::<F>()
            }

            fn default_requires(&self) -> Option<Requires> {
                infer_requires(vec![$(<$param as FromArg>::requirement()),*])
            }

            fn call(&self, args: Args) -> Result<Value, BoxError> {
                let cursor = ArgCursor::new(args)?;
                $(let ($arg, cursor) = cursor.next::<$param>()?;)*
                cursor.finish()?;
                Ok(Value::new((self.func)($($arg),*)))
            }
        }

        impl<F, R, E, $($param),*> IntoCallable<(FallibleMarker, $($param,)*)> for Fallible<F>
        where
            F: Fn($($param),*) -> Result<R, E> + Send + Sync + 'static,
            R: Send + Sync + 'static,
            E: Into<BoxError> + 'static,
            $($param: FromArg + 'static,)*
        {
            type Callable = FunctionCallable<F, (FallibleMarker, $($param,)*)>;

            fn into_callable(self) -> Self::Callable {
                FunctionCallable::new(self.0)
            }
        }

        impl<F, R, E, $($param),*> Callable for FunctionCallable<F, (FallibleMarker, $($param,)*)>
        where
            F: Fn($($param),*) -> Result<R, E> + Send + Sync + 'static,
            R: Send + Sync + 'static,
            E: Into<BoxError> + 'static,
            $($param: FromArg + 'static,)*
        {
            fn name(&self) -> &str {
                self.name
            }

            fn id(&self) -> CallableId {
                CallableId::of::<F>()
            }

            fn default_requires(&self) -> Option<Requires> {
                infer_requires(vec![$(<$param as FromArg>::requirement()),*])
            }

            fn call(&self, args: Args) -> Result<Value, BoxError> {
                let cursor = ArgCursor::new(args)?;
                $(let ($arg, cursor) = cursor.next::<$param>()?;)*
                cursor.finish()?;
                (self.func)($($arg),*).map(Value::new).map_err(Into::into)
            }
        }
    };
}

// Generate impls for functions with 0 to 8 parameters
all_tuples!(impl_function_callable, 0, 8, P, p);

/// A callable receiving the raw resolved [`Args`].
///
/// This is how keyword arguments reach a callable, since Rust functions
/// cannot take parameters by name. Dynamic callables infer no requirements;
/// give them with [`with_requires`](Self::with_requires) or at add-time.
///
/// ```
/// use relay_runner::callable::{Callable, dynamic};
/// use relay_context::prelude::*;
///
/// let greet = dynamic("greet", |args: Args| {
///     let name = args.keyword::<String>("name")?;
///     Ok(format!("hello {name}"))
/// })
/// .with_requires(Requires::new().kwarg("name", "user"));
///
/// assert_eq!(greet.name(), "greet");
/// assert_eq!(greet.default_requires().unwrap().to_string(), "requires(name='user')");
/// ```
#[derive(Clone)]
pub struct DynamicCallable<F> {
    func: F,
    id: CallableId,
    name: String,
    requires: Option<Requires>,
    returns: Option<Returns>,
}

/// Creates a named callable over raw [`Args`].
pub fn dynamic<F, R>(name: impl Into<String>, func: F) -> DynamicCallable<F>
where
    F: Fn(Args) -> Result<R, BoxError> + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    DynamicCallable {
        func,
        id: CallableId::unique(),
        name: name.into(),
        requires: None,
        returns: None,
    }
}

impl<F> DynamicCallable<F> {
    /// Sets the requirements this callable brings with it.
    #[must_use]
    pub fn with_requires(mut self, requires: Requires) -> Self {
        self.requires = Some(requires);
        self
    }

    /// Sets the return descriptor this callable brings with it.
    #[must_use]
    pub fn with_returns(mut self, returns: impl Into<Returns>) -> Self {
        self.returns = Some(returns.into());
        self
    }
}

impl<F, R> Callable for DynamicCallable<F>
where
    F: Fn(Args) -> Result<R, BoxError> + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> CallableId {
        self.id.clone()
    }

    fn default_requires(&self) -> Option<Requires> {
        self.requires.clone()
    }

    fn default_returns(&self) -> Option<Returns> {
        self.returns.clone()
    }

    fn call(&self, args: Args) -> Result<Value, BoxError> {
        (self.func)(args).map(Value::new)
    }
}

/// A resource provider that is entered instead of called.
///
/// Entering receives the resolved arguments and returns the value to file
/// plus the open [`Scope`]. The runner exits open scopes in reverse order
/// once it finishes or fails.
pub trait ScopeProvider: Send + Sync + 'static {
    /// Enters the scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be acquired. The scope is
    /// then not considered open and will not be exited.
    fn enter(&self, args: Args) -> Result<Entered, BoxError>;

    /// Requirements used when none are declared or given at add-time.
    fn default_requires(&self) -> Option<Requires> {
        None
    }

    /// Return descriptor used when none is declared or given at add-time.
    fn default_returns(&self) -> Option<Returns> {
        None
    }

    /// Identity of this provider instance.
    ///
    /// Providers are identified by their type unless they return a
    /// [`CallableId::unique`] kept alongside their state here.
    fn instance_id(&self) -> Option<CallableId> {
        None
    }
}

/// An entered scope awaiting exit.
pub trait Scope {
    /// Exits the scope.
    ///
    /// `error` is the failure in flight, if any. Returning `Ok(true)`
    /// suppresses it; returning an error replaces it.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the resource itself failed.
    fn exit(self: Box<Self>, error: Option<&RunnerError>) -> Result<bool, BoxError>;
}

/// The result of entering a scope.
pub struct Entered {
    value: Value,
    scope: Box<dyn Scope>,
}

impl Entered {
    /// Pairs the value to file with the scope to exit later.
    pub fn new<T: Send + Sync + 'static>(value: T, scope: impl Scope + 'static) -> Self {
        Self {
            value: Value::new(value),
            scope: Box::new(scope),
        }
    }

    /// Splits into the value and the open scope.
    #[must_use]
    pub fn into_parts(self) -> (Value, Box<dyn Scope>) {
        (self.value, self.scope)
    }
}

/// Marker for scope providers.
pub struct ScopeMarker;

/// A callable wrapping a [`ScopeProvider`].
pub struct ScopeCallable<S> {
    provider: S,
    name: &'static str,
}

impl<S: ScopeProvider> IntoCallable<ScopeMarker> for S {
    type Callable = ScopeCallable<S>;

    fn into_callable(self) -> Self::Callable {
        ScopeCallable {
            provider: self,
            name: function_name::<S>(),
        }
    }
}

impl<S: ScopeProvider> Callable for ScopeCallable<S> {
    fn name(&self) -> &str {
        self.name
    }

    fn id(&self) -> CallableId {
        self.provider
            .instance_id()
            .unwrap_or_else(CallableId::of::<S>)
    }

    fn default_requires(&self) -> Option<Requires> {
        self.provider.default_requires()
    }

    fn default_returns(&self) -> Option<Returns> {
        self.provider.default_returns()
    }

    /// Enters and immediately exits the scope.
    fn call(&self, args: Args) -> Result<Value, BoxError> {
        let (value, scope) = self.provider.enter(args)?.into_parts();
        scope.exit(None)?;
        Ok(value)
    }

    fn as_scope(&self) -> Option<&dyn ScopeProvider> {
        Some(&self.provider)
    }
}
