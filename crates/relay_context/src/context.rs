//! Per-invocation resource storage.
//!
//! A [`Context`] is created fresh for every invocation of a runner. Callables
//! never see it directly: the engine resolves their requirements from it and
//! files their results back into it.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::key::ResourceKey;
use crate::value::Value;

/// Resource store for a single invocation.
///
/// Filing a value under a key that is already present replaces it: the most
/// recently filed value for an exact key wins. Lookups never match
/// supertypes or similarly named keys.
///
/// # Example
///
/// ```
/// use relay_context::context::Context;
/// use relay_context::key::ResourceKey;
/// use relay_context::value::Value;
///
/// struct Apple;
///
/// let mut ctx = Context::new().with(Apple);
/// ctx.insert(ResourceKey::from("age"), Value::new(42_u32));
///
/// assert!(ctx.resource::<Apple>().is_some());
/// assert_eq!(*ctx.named::<u32>("age").unwrap(), 42);
/// assert_eq!(ctx.available(), vec!["'age'".to_string(), "Apple".to_string()]);
/// ```
#[derive(Default, Clone)]
pub struct Context {
    resources: HashMap<ResourceKey, Value>,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }

    /// Builder pattern: files a value under its type and returns self.
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert_value(Value::new(value));
        self
    }

    /// Builder pattern: files a value under a name and returns self.
    #[must_use]
    pub fn with_named<T: Send + Sync + 'static>(mut self, name: &str, value: T) -> Self {
        self.insert(ResourceKey::from(name), Value::new(value));
        self
    }

    /// Files a value under an explicit key, returning the value it replaced.
    pub fn insert(&mut self, key: ResourceKey, value: Value) -> Option<Value> {
        self.resources.insert(key, value)
    }

    /// Files a value under its own type, returning the value it replaced.
    ///
    /// The "no value" sentinel is never filed.
    pub fn insert_value(&mut self, value: Value) -> Option<Value> {
        if value.is_nothing() {
            return None;
        }
        self.insert(ResourceKey::Type(value.type_key()), value)
    }

    /// Returns the value filed under `key`.
    #[must_use]
    pub fn get(&self, key: &ResourceKey) -> Option<&Value> {
        self.resources.get(key)
    }

    /// Returns the value filed under `key` as a `T`.
    #[must_use]
    pub fn get_as<T: Send + Sync + 'static>(&self, key: &ResourceKey) -> Option<Arc<T>> {
        self.get(key)?.downcast::<T>()
    }

    /// Returns the value filed under the type `T`.
    #[must_use]
    pub fn resource<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.get_as::<T>(&ResourceKey::of::<T>())
    }

    /// Returns the value filed under `name` as a `T`.
    #[must_use]
    pub fn named<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.get_as::<T>(&ResourceKey::from(name))
    }

    /// Returns `true` if a value is filed under `key`.
    #[must_use]
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.resources.contains_key(key)
    }

    /// Removes and returns the value filed under `key`.
    pub fn remove(&mut self, key: &ResourceKey) -> Option<Value> {
        self.resources.remove(key)
    }

    /// Iterates over the keys currently filed, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.resources.keys()
    }

    /// Returns the rendered keys currently filed, sorted.
    ///
    /// Used to explain resolution failures.
    #[must_use]
    pub fn available(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.resources.keys().map(ToString::to_string).collect();
        keys.sort();
        keys
    }

    /// Returns the number of filed resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if nothing has been filed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("resources", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Apple {
        weight: u32,
    }

    #[derive(Debug, PartialEq)]
    struct Orange;

    #[test]
    fn insert_value_files_under_type() {
        let mut ctx = Context::new();
        ctx.insert_value(Value::new(Apple { weight: 1 }));

        assert!(ctx.contains(&ResourceKey::of::<Apple>()));
        assert_eq!(ctx.resource::<Apple>().unwrap().weight, 1);
    }

    #[test]
    fn later_values_shadow_earlier_ones() {
        let mut ctx = Context::new().with(Apple { weight: 1 });
        let old = ctx.insert_value(Value::new(Apple { weight: 2 }));

        assert_eq!(old.unwrap().downcast_ref::<Apple>().unwrap().weight, 1);
        assert_eq!(ctx.resource::<Apple>().unwrap().weight, 2);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn nothing_is_never_filed() {
        let mut ctx = Context::new();
        assert!(ctx.insert_value(Value::nothing()).is_none());
        assert!(ctx.is_empty());
    }

    #[test]
    fn names_and_types_are_separate() {
        let ctx = Context::new()
            .with(Apple { weight: 1 })
            .with_named("apple", Apple { weight: 2 });

        assert_eq!(ctx.resource::<Apple>().unwrap().weight, 1);
        assert_eq!(ctx.named::<Apple>("apple").unwrap().weight, 2);
    }

    #[test]
    fn typed_lookup_with_wrong_type_is_none() {
        let ctx = Context::new().with_named("apple", Orange);
        assert!(ctx.named::<Apple>("apple").is_none());
        assert!(ctx.named::<Orange>("apple").is_some());
    }

    #[test]
    fn available_is_sorted() {
        let ctx = Context::new()
            .with(Orange)
            .with_named("zeta", 1_u8)
            .with(Apple { weight: 1 })
            .with_named("age", 2_u8);

        assert_eq!(ctx.available(), vec!["'age'", "'zeta'", "Apple", "Orange"]);
    }

    #[test]
    fn remove_takes_value_out() {
        let mut ctx = Context::new().with(Orange);
        assert!(ctx.remove(&ResourceKey::of::<Orange>()).is_some());
        assert!(ctx.remove(&ResourceKey::of::<Orange>()).is_none());
        assert!(ctx.is_empty());
    }

    #[test]
    fn clones_are_independent_stores() {
        let original = Context::new().with(Orange);
        let mut copy = original.clone();
        copy.insert_value(Value::new(Apple { weight: 3 }));

        assert_eq!(original.len(), 1);
        assert_eq!(copy.len(), 2);
    }
}
