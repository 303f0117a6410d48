//! Type-erased values and structural navigation.
//!
//! A [`Value`] is what flows between callables: a cheaply clonable handle to
//! a shared, type-erased object that remembers the type it was built from.
//! Cloning a `Value` never clones the object, so every consumer of a
//! resource sees the very same allocation its producer returned.
//!
//! Values built from [`Navigable`] types, and the built-in structured types
//! (`serde_json::Value`, `Vec<Value>`, string-keyed maps of `Value`), can be
//! walked with attribute and item steps. Part requirements use this to pull
//! a nested piece out of a resource.

use core::any::{Any, TypeId};
use core::fmt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::key::TypeKey;

/// A shared, type-erased value.
///
/// The unit type `()` is the "no value" sentinel: a callable that returns
/// `()` produced nothing, and nothing is filed for it.
///
/// # Example
///
/// ```
/// use relay_context::value::Value;
///
/// struct Apple { weight: u32 }
///
/// let value = Value::new(Apple { weight: 120 });
/// let same = value.clone();
///
/// assert!(value.ptr_eq(&same));
/// assert_eq!(value.downcast_ref::<Apple>().unwrap().weight, 120);
/// assert!(Value::nothing().is_nothing());
/// ```
#[derive(Clone)]
pub struct Value {
    data: Arc<dyn Any + Send + Sync>,
    navigable: Option<Arc<dyn Navigable>>,
    type_key: TypeKey,
}

impl Value {
    /// Wraps a value.
    ///
    /// Wrapping a `Value` returns it unchanged rather than nesting it.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        let boxed: Box<dyn Any + Send + Sync> = Box::new(value);
        match boxed.downcast::<Value>() {
            Ok(value) => *value,
            Err(boxed) => Self {
                data: Arc::from(boxed),
                navigable: None,
                type_key: TypeKey::of::<T>(),
            },
        }
    }

    /// Wraps an already shared value without copying it.
    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            data: value,
            navigable: None,
            type_key: TypeKey::of::<T>(),
        }
    }

    /// Wraps a value that supports attribute and item navigation.
    pub fn navigable<T: Navigable>(value: T) -> Self {
        let shared = Arc::new(value);
        Self {
            data: shared.clone(),
            navigable: Some(shared),
            type_key: TypeKey::of::<T>(),
        }
    }

    /// Returns the "no value" sentinel.
    #[must_use]
    pub fn nothing() -> Self {
        Self::new(())
    }

    /// Returns `true` if this is the "no value" sentinel.
    #[must_use]
    pub fn is_nothing(&self) -> bool {
        self.type_key.type_id() == TypeId::of::<()>()
    }

    /// Returns the key of the wrapped value's type.
    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Returns the fully qualified name of the wrapped value's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_key.type_name()
    }

    /// Returns `true` if the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.data.is::<T>()
    }

    /// Borrows the wrapped value as a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Returns a shared handle to the wrapped value as a `T`.
    #[must_use]
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.data).downcast::<T>().ok()
    }

    /// Returns `true` if both values share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Looks up an attribute of the wrapped value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<Value> {
        self.navigator()?.attr(name)
    }

    /// Looks up an item of the wrapped value.
    #[must_use]
    pub fn item(&self, item: &Item) -> Option<Value> {
        self.navigator()?.item(item)
    }

    /// Applies a single path step.
    #[must_use]
    pub fn step(&self, step: &PathStep) -> Option<Value> {
        match step {
            PathStep::Attr(name) => self.attr(name),
            PathStep::Item(item) => self.item(item),
        }
    }

    fn navigator(&self) -> Option<&dyn Navigable> {
        if let Some(navigable) = &self.navigable {
            return Some(navigable.as_ref());
        }
        if let Some(json) = self.data.downcast_ref::<serde_json::Value>() {
            return Some(json);
        }
        if let Some(list) = self.data.downcast_ref::<Vec<Value>>() {
            return Some(list);
        }
        if let Some(map) = self.data.downcast_ref::<HashMap<String, Value>>() {
            return Some(map);
        }
        if let Some(map) = self.data.downcast_ref::<BTreeMap<String, Value>>() {
            return Some(map);
        }
        None
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.type_key)
    }
}

/// Builds a `Vec<Value>` for sequence and multi-key returns.
///
/// ```
/// use relay_context::values;
///
/// struct Apple;
/// struct Orange;
///
/// let both = values![Apple, Orange];
/// assert_eq!(both.len(), 2);
/// ```
#[macro_export]
macro_rules! values {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::value::Value::new($value)),*]
    };
}

/// An item index: a string key or a numeric position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    /// A mapping key.
    Key(String),
    /// A sequence position.
    Index(usize),
}

impl From<&str> for Item {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for Item {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for Item {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "['{key}']"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// One step of a part path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Attribute access, rendered as `.name`.
    Attr(String),
    /// Item access, rendered as `['key']` or `[0]`.
    Item(Item),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attr(name) => write!(f, ".{name}"),
            Self::Item(item) => write!(f, "{item}"),
        }
    }
}

/// Structural access into a value.
///
/// Implement this for resource types whose fields or elements should be
/// reachable from part requirements, and wrap them with
/// [`Value::navigable`]. Both methods default to "absent".
///
/// # Example
///
/// ```
/// use relay_context::value::{Item, Navigable, Value};
///
/// struct Database { url: String }
///
/// impl Navigable for Database {
///     fn attr(&self, name: &str) -> Option<Value> {
///         match name {
///             "url" => Some(Value::new(self.url.clone())),
///             _ => None,
///         }
///     }
/// }
///
/// let db = Value::navigable(Database { url: "sqlite://".into() });
/// let url = db.attr("url").unwrap();
/// assert_eq!(url.downcast_ref::<String>().unwrap(), "sqlite://");
/// assert!(db.item(&Item::Index(0)).is_none());
/// ```
pub trait Navigable: Any + Send + Sync {
    /// Returns the named attribute, if present.
    fn attr(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Returns the indexed item, if present.
    fn item(&self, _item: &Item) -> Option<Value> {
        None
    }
}

impl Navigable for serde_json::Value {
    fn attr(&self, name: &str) -> Option<Value> {
        self.as_object()?.get(name).cloned().map(Value::new)
    }

    fn item(&self, item: &Item) -> Option<Value> {
        let found = match item {
            Item::Key(key) => self.get(key.as_str()),
            Item::Index(index) => self.get(*index),
        };
        found.cloned().map(Value::new)
    }
}

impl Navigable for Vec<Value> {
    fn item(&self, item: &Item) -> Option<Value> {
        match item {
            Item::Index(index) => self.get(*index).cloned(),
            Item::Key(_) => None,
        }
    }
}

impl Navigable for HashMap<String, Value> {
    fn item(&self, item: &Item) -> Option<Value> {
        match item {
            Item::Key(key) => self.get(key).cloned(),
            Item::Index(_) => None,
        }
    }
}

impl Navigable for BTreeMap<String, Value> {
    fn item(&self, item: &Item) -> Option<Value> {
        match item {
            Item::Key(key) => self.get(key).cloned(),
            Item::Index(_) => None,
        }
    }
}
