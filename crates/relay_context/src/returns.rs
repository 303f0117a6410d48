//! Return descriptors and result filing.
//!
//! After a callable returns, its [`Returns`] descriptor decides which keys
//! the result is filed under:
//!
//! | Descriptor | Filing |
//! |------------|--------|
//! | [`Returns::ResultType`] | under the value's own type (default) |
//! | [`Returns::Explicit`] | under the given keys, zipping a `Vec<Value>` if there are several |
//! | [`Returns::Sequence`] | each element of a `Vec<Value>` under its own type |
//! | [`Returns::Mapping`] | each value of a key/value mapping under its key |
//!
//! A returned "no value" sentinel (`()`) is never filed, whatever the
//! descriptor says.

use core::fmt;
use std::collections::HashMap;

use crate::context::Context;
use crate::error::ConfigurationError;
use crate::key::ResourceKey;
use crate::value::Value;

/// How a callable's result is filed into the context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Returns {
    /// File the result under its runtime type.
    #[default]
    ResultType,
    /// File the result under explicit keys.
    ///
    /// With one key the result is filed as is. With several, the result
    /// must be a `Vec<Value>` holding one value per key. With none, nothing
    /// is filed.
    Explicit(Vec<ResourceKey>),
    /// The result is a `Vec<Value>`; file each element under its own type.
    Sequence,
    /// The result is a `Vec<(ResourceKey, Value)>` or a
    /// `HashMap<ResourceKey, Value>`; file each value under its key.
    Mapping,
}

impl Returns {
    /// Files the result under a single explicit key.
    #[must_use]
    pub fn key(key: impl Into<ResourceKey>) -> Self {
        Self::Explicit(vec![key.into()])
    }

    /// Files the result under several explicit keys.
    #[must_use]
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ResourceKey>,
    {
        Self::Explicit(keys.into_iter().map(Into::into).collect())
    }

    /// Files the result under the type `T`, whatever its runtime type.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::key(ResourceKey::of::<T>())
    }

    /// Files `value` into `ctx` according to this descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the value's shape does not match
    /// the descriptor: a non-sequence for [`Sequence`](Self::Sequence) or a
    /// multi-key return, a length mismatch, or a non-mapping for
    /// [`Mapping`](Self::Mapping).
    pub fn file(&self, value: Value, ctx: &mut Context) -> Result<(), ConfigurationError> {
        if value.is_nothing() {
            return Ok(());
        }

        match self {
            Self::ResultType => {
                ctx.insert_value(value);
            }
            Self::Explicit(keys) => match keys.as_slice() {
                [] => {}
                [key] => {
                    ctx.insert(key.clone(), value);
                }
                keys => {
                    let items = sequence(&value)?;
                    if items.len() != keys.len() {
                        return Err(ConfigurationError::ArityMismatch {
                            expected: keys.len(),
                            actual: items.len(),
                        });
                    }
                    for (key, item) in keys.iter().zip(items.iter()) {
                        ctx.insert(key.clone(), item.clone());
                    }
                }
            },
            Self::Sequence => {
                for item in sequence(&value)? {
                    ctx.insert_value(item.clone());
                }
            }
            Self::Mapping => {
                if let Some(pairs) = value.downcast_ref::<Vec<(ResourceKey, Value)>>() {
                    for (key, item) in pairs {
                        ctx.insert(key.clone(), item.clone());
                    }
                } else if let Some(map) = value.downcast_ref::<HashMap<ResourceKey, Value>>() {
                    for (key, item) in map {
                        ctx.insert(key.clone(), item.clone());
                    }
                } else {
                    return Err(ConfigurationError::NotAMapping(value.type_name()));
                }
            }
        }
        Ok(())
    }
}

fn sequence(value: &Value) -> Result<&Vec<Value>, ConfigurationError> {
    value
        .downcast_ref::<Vec<Value>>()
        .ok_or(ConfigurationError::NotASequence(value.type_name()))
}

impl From<ResourceKey> for Returns {
    fn from(key: ResourceKey) -> Self {
        Self::key(key)
    }
}

impl From<&str> for Returns {
    fn from(name: &str) -> Self {
        Self::key(name)
    }
}

impl From<String> for Returns {
    fn from(name: String) -> Self {
        Self::key(name)
    }
}

impl fmt::Display for Returns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResultType => f.write_str("returns_result_type()"),
            Self::Explicit(keys) => {
                let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
                write!(f, "returns({})", keys.join(", "))
            }
            Self::Sequence => f.write_str("returns_sequence()"),
            Self::Mapping => f.write_str("returns_mapping()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;

    #[derive(Debug, PartialEq)]
    struct Apple;

    #[derive(Debug, PartialEq)]
    struct Orange;

    #[test]
    fn result_type_files_under_runtime_type() {
        let mut ctx = Context::new();
        Returns::ResultType.file(Value::new(Apple), &mut ctx).unwrap();
        assert!(ctx.resource::<Apple>().is_some());
    }

    #[test]
    fn nothing_is_not_filed_under_any_descriptor() {
        for returns in [
            Returns::ResultType,
            Returns::key("x"),
            Returns::keys(["x", "y"]),
            Returns::Sequence,
            Returns::Mapping,
        ] {
            let mut ctx = Context::new();
            returns.file(Value::nothing(), &mut ctx).unwrap();
            assert!(ctx.is_empty(), "{returns} filed the sentinel");
        }
    }

    #[test]
    fn single_explicit_key_files_value_as_is() {
        let mut ctx = Context::new();
        let list = Value::new(values![Apple, Orange]);
        Returns::key("fruit").file(list.clone(), &mut ctx).unwrap();

        assert!(ctx.get(&ResourceKey::from("fruit")).unwrap().ptr_eq(&list));
        assert!(ctx.resource::<Apple>().is_none());
    }

    #[test]
    fn explicit_type_key_overrides_runtime_type() {
        let mut ctx = Context::new();
        Returns::of::<Orange>().file(Value::new(Apple), &mut ctx).unwrap();

        let filed = ctx.get(&ResourceKey::of::<Orange>()).unwrap();
        assert!(filed.is::<Apple>());
    }

    #[test]
    fn multiple_explicit_keys_zip_positionally() {
        let mut ctx = Context::new();
        Returns::keys(["age", "meaning"])
            .file(Value::new(values![21_u32, 42_u32]), &mut ctx)
            .unwrap();

        assert_eq!(*ctx.named::<u32>("age").unwrap(), 21);
        assert_eq!(*ctx.named::<u32>("meaning").unwrap(), 42);
    }

    #[test]
    fn multiple_explicit_keys_reject_arity_mismatch() {
        let mut ctx = Context::new();
        let err = Returns::keys(["a", "b", "c"])
            .file(Value::new(values![1_u8, 2_u8]), &mut ctx)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ArityMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn multiple_explicit_keys_reject_non_sequence() {
        let mut ctx = Context::new();
        let err = Returns::keys(["a", "b"])
            .file(Value::new(Apple), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NotASequence(_)));
    }

    #[test]
    fn empty_explicit_files_nothing() {
        let mut ctx = Context::new();
        Returns::Explicit(Vec::new())
            .file(Value::new(Apple), &mut ctx)
            .unwrap();
        assert!(ctx.is_empty());
    }

    #[test]
    fn sequence_files_each_element_by_type() {
        let mut ctx = Context::new();
        Returns::Sequence
            .file(Value::new(values![Apple, Orange]), &mut ctx)
            .unwrap();

        assert!(ctx.resource::<Apple>().is_some());
        assert!(ctx.resource::<Orange>().is_some());
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn sequence_duplicates_overwrite_in_order() {
        let mut ctx = Context::new();
        Returns::Sequence
            .file(Value::new(values![1_u32, 2_u32]), &mut ctx)
            .unwrap();
        assert_eq!(*ctx.resource::<u32>().unwrap(), 2);
    }

    #[test]
    fn sequence_skips_nothing_elements() {
        let mut ctx = Context::new();
        Returns::Sequence
            .file(Value::new(values![(), Apple]), &mut ctx)
            .unwrap();
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn mapping_files_pairs_and_maps() {
        let mut ctx = Context::new();
        let pairs = vec![
            (ResourceKey::from("age"), Value::new(21_u32)),
            (ResourceKey::of::<Apple>(), Value::new(Apple)),
        ];
        Returns::Mapping.file(Value::new(pairs), &mut ctx).unwrap();
        assert_eq!(*ctx.named::<u32>("age").unwrap(), 21);
        assert!(ctx.resource::<Apple>().is_some());

        let mut map = HashMap::new();
        map.insert(ResourceKey::from("meaning"), Value::new(42_u32));
        Returns::Mapping.file(Value::new(map), &mut ctx).unwrap();
        assert_eq!(*ctx.named::<u32>("meaning").unwrap(), 42);
    }

    #[test]
    fn mapping_rejects_other_values() {
        let mut ctx = Context::new();
        let err = Returns::Mapping.file(Value::new(Apple), &mut ctx).unwrap_err();
        assert!(matches!(err, ConfigurationError::NotAMapping(_)));
    }

    #[test]
    fn returns_render() {
        assert_eq!(Returns::ResultType.to_string(), "returns_result_type()");
        assert_eq!(Returns::key("x").to_string(), "returns('x')");
        assert_eq!(
            Returns::Explicit(vec![ResourceKey::of::<Apple>(), "y".into()]).to_string(),
            "returns(Apple, 'y')"
        );
        assert_eq!(Returns::Sequence.to_string(), "returns_sequence()");
        assert_eq!(Returns::Mapping.to_string(), "returns_mapping()");
    }

    #[test]
    fn string_shorthand_is_single_explicit_key() {
        assert_eq!(Returns::from("config"), Returns::key("config"));
        assert_eq!(Returns::from(ResourceKey::of::<Apple>()), Returns::of::<Apple>());
    }
}
