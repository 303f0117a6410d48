//! Requirement descriptors and argument resolution.
//!
//! A [`Requires`] descriptor lists what a callable needs, positionally and by
//! keyword. Each entry is a [`Requirement`]:
//!
//! - a plain key, looked up directly;
//! - an optional requirement, which falls back to a default when absent;
//! - a part, which resolves a base requirement and then walks attribute or
//!   item steps into it.
//!
//! Resolving a descriptor against a [`Context`] yields [`Args`].
//!
//! # Example
//!
//! ```
//! use relay_context::prelude::*;
//! use serde_json::json;
//!
//! let ctx = Context::new().with_named("config", json!({ "db": { "url": "sqlite://" } }));
//!
//! let requires = Requires::new()
//!     .arg(Requirement::named("config").item("db").attr("url"))
//!     .kwarg("user", Requirement::named("user").optional(Value::new("stranger")));
//!
//! let args = requires.resolve(&ctx).unwrap();
//! assert_eq!(*args.get::<serde_json::Value>(0).unwrap(), json!("sqlite://"));
//! assert_eq!(*args.keyword::<&str>("user").unwrap(), "stranger");
//! assert_eq!(requires.to_string(), "requires('config'['db'].url, user=optional('user'))");
//! ```

use core::fmt;
use std::sync::Arc;

use hashbrown::HashSet;

use crate::context::Context;
use crate::error::{ArgError, ConfigurationError, MissingRequirement};
use crate::key::ResourceKey;
use crate::value::{Item, PathStep, Value};

/// A single thing a callable needs.
#[derive(Debug, Clone)]
pub enum Requirement {
    /// Look up a key directly.
    Simple(ResourceKey),
    /// Resolve the inner requirement, substituting `default` if it fails.
    Optional {
        /// The requirement to try.
        requirement: Box<Requirement>,
        /// The value supplied when the requirement cannot be resolved.
        default: Value,
    },
    /// Resolve `base`, then apply each path step in order.
    Part {
        /// The requirement producing the object to walk into.
        base: Box<Requirement>,
        /// Attribute and item steps applied to the base.
        path: Vec<PathStep>,
    },
}

impl Requirement {
    /// Requires the resource filed under the type `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Simple(ResourceKey::of::<T>())
    }

    /// Requires the resource filed under `name`.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Simple(ResourceKey::named(name))
    }

    /// Requires the resource filed under `key`.
    #[must_use]
    pub fn key(key: impl Into<ResourceKey>) -> Self {
        Self::Simple(key.into())
    }

    /// Builds a part requirement from an explicit base and path.
    #[must_use]
    pub fn part(base: Requirement, path: Vec<PathStep>) -> Self {
        Self::Part {
            base: Box::new(base),
            path,
        }
    }

    /// Makes this requirement optional, falling back to `default`.
    #[must_use]
    pub fn optional(self, default: Value) -> Self {
        Self::Optional {
            requirement: Box::new(self),
            default,
        }
    }

    /// Makes this requirement optional, falling back to the "no value"
    /// sentinel.
    #[must_use]
    pub fn or_nothing(self) -> Self {
        self.optional(Value::nothing())
    }

    /// Appends an attribute step.
    #[must_use]
    pub fn attr(self, name: impl Into<String>) -> Self {
        self.then(PathStep::Attr(name.into()))
    }

    /// Appends an item step.
    #[must_use]
    pub fn item(self, item: impl Into<Item>) -> Self {
        self.then(PathStep::Item(item.into()))
    }

    fn then(self, step: PathStep) -> Self {
        match self {
            Self::Part { base, mut path } => {
                path.push(step);
                Self::Part { base, path }
            }
            other => Self::Part {
                base: Box::new(other),
                path: vec![step],
            },
        }
    }

    /// Resolves this requirement against `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`MissingRequirement`] if a key is absent or a path step
    /// cannot be applied. Optional requirements never fail.
    pub fn resolve(&self, ctx: &Context) -> Result<Value, MissingRequirement> {
        match self {
            Self::Simple(key) => ctx.get(key).cloned().ok_or_else(|| self.missing(ctx)),
            Self::Optional {
                requirement,
                default,
            } => Ok(requirement
                .resolve(ctx)
                .unwrap_or_else(|_| default.clone())),
            Self::Part { base, path } => {
                let mut value = base.resolve(ctx)?;
                for step in path {
                    value = value.step(step).ok_or_else(|| self.missing(ctx))?;
                }
                Ok(value)
            }
        }
    }

    fn missing(&self, ctx: &Context) -> MissingRequirement {
        MissingRequirement {
            requirement: self.to_string(),
            available: ctx.available(),
        }
    }
}

impl From<ResourceKey> for Requirement {
    fn from(key: ResourceKey) -> Self {
        Self::Simple(key)
    }
}

impl From<&str> for Requirement {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for Requirement {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(key) => write!(f, "{key}"),
            Self::Optional { requirement, .. } => write!(f, "optional({requirement})"),
            Self::Part { base, path } => {
                write!(f, "{base}")?;
                for step in path {
                    write!(f, "{step}")?;
                }
                Ok(())
            }
        }
    }
}

/// The full requirement descriptor of a callable.
///
/// Positional entries are consumed in order; keyword entries are bound by
/// parameter name and must be unique (see [`validate`](Self::validate)).
#[derive(Debug, Clone, Default)]
pub struct Requires {
    positional: Vec<Requirement>,
    keyword: Vec<(String, Requirement)>,
}

impl Requires {
    /// Creates an empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional requirement.
    #[must_use]
    pub fn arg(mut self, requirement: impl Into<Requirement>) -> Self {
        self.positional.push(requirement.into());
        self
    }

    /// Appends a keyword requirement bound to `name`.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, requirement: impl Into<Requirement>) -> Self {
        self.keyword.push((name.into(), requirement.into()));
        self
    }

    /// Returns the positional requirements.
    #[must_use]
    pub fn positional(&self) -> &[Requirement] {
        &self.positional
    }

    /// Returns the keyword requirements in declaration order.
    #[must_use]
    pub fn keyword(&self) -> &[(String, Requirement)] {
        &self.keyword
    }

    /// Returns `true` if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Checks that no parameter name is bound twice.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateParameter`] naming the first
    /// repeated parameter.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for (name, _) in &self.keyword {
            if !seen.insert(name.as_str()) {
                return Err(ConfigurationError::DuplicateParameter(name.clone()));
            }
        }
        Ok(())
    }

    /// Resolves every entry against `ctx`.
    ///
    /// # Errors
    ///
    /// Returns the first [`MissingRequirement`] encountered.
    pub fn resolve(&self, ctx: &Context) -> Result<Args, MissingRequirement> {
        let positional = self
            .positional
            .iter()
            .map(|requirement| requirement.resolve(ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let keyword = self
            .keyword
            .iter()
            .map(|(name, requirement)| Ok((name.clone(), requirement.resolve(ctx)?)))
            .collect::<Result<Vec<_>, MissingRequirement>>()?;
        Ok(Args {
            positional,
            keyword,
        })
    }
}

impl fmt::Display for Requires {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("requires(")?;
        let positional = self.positional.iter().map(ToString::to_string);
        let keyword = self
            .keyword
            .iter()
            .map(|(name, requirement)| format!("{name}={requirement}"));
        let entries: Vec<String> = positional.chain(keyword).collect();
        f.write_str(&entries.join(", "))?;
        f.write_str(")")
    }
}

/// Arguments resolved for one call.
#[derive(Debug, Clone, Default)]
pub struct Args {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl Args {
    /// Creates an argument set from already resolved values.
    #[must_use]
    pub fn new(positional: Vec<Value>, keyword: Vec<(String, Value)>) -> Self {
        Self {
            positional,
            keyword,
        }
    }

    /// Returns the positional arguments.
    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Returns the keyword arguments in declaration order.
    #[must_use]
    pub fn keyword_values(&self) -> &[(String, Value)] {
        &self.keyword
    }

    /// Returns the positional argument at `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Returns the keyword argument bound to `name`.
    #[must_use]
    pub fn keyword_value(&self, name: &str) -> Option<&Value> {
        self.keyword
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Returns the positional argument at `index` as a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgError`] if there is no such argument or it holds another
    /// type.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, ArgError> {
        let value = self
            .value(index)
            .ok_or(ArgError::MissingPositional(index))?;
        downcast_arg(value, || index.to_string())
    }

    /// Returns the keyword argument bound to `name` as a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgError`] if there is no such argument or it holds another
    /// type.
    pub fn keyword<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ArgError> {
        let value = self
            .keyword_value(name)
            .ok_or_else(|| ArgError::MissingKeyword(name.to_owned()))?;
        downcast_arg(value, || format!("`{name}`"))
    }

    /// Splits the arguments into positional and keyword parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Value>, Vec<(String, Value)>) {
        (self.positional, self.keyword)
    }

    /// Returns the number of positional and keyword arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// Downcasts an argument, describing it with `argument` on mismatch.
///
/// # Errors
///
/// Returns [`ArgError::TypeMismatch`] if `value` does not hold a `T`.
pub fn downcast_arg<T: Send + Sync + 'static>(
    value: &Value,
    argument: impl FnOnce() -> String,
) -> Result<Arc<T>, ArgError> {
    value.downcast::<T>().ok_or_else(|| ArgError::TypeMismatch {
        argument: argument(),
        expected: core::any::type_name::<T>(),
        actual: value.type_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Apple;

    #[derive(Debug, PartialEq)]
    struct Orange;

    #[test]
    fn simple_requirement_resolves_exact_key() {
        let ctx = Context::new().with(Apple);
        let value = Requirement::of::<Apple>().resolve(&ctx).unwrap();
        assert!(value.is::<Apple>());
    }

    #[test]
    fn simple_requirement_reports_available_keys() {
        let ctx = Context::new().with(Orange).with_named("age", 3_u8);
        let err = Requirement::of::<Apple>().resolve(&ctx).unwrap_err();

        assert_eq!(err.requirement, "Apple");
        assert_eq!(err.available, vec!["'age'", "Orange"]);
        assert_eq!(
            err.to_string(),
            "could not resolve Apple; available: ['age', Orange]"
        );
    }

    #[test]
    fn resolution_returns_the_filed_object() {
        let apple = Value::new(Apple);
        let mut ctx = Context::new();
        ctx.insert_value(apple.clone());

        let resolved = Requirement::of::<Apple>().resolve(&ctx).unwrap();
        assert!(resolved.ptr_eq(&apple));
    }

    #[test]
    fn optional_requirement_substitutes_default() {
        let ctx = Context::new();
        let requirement = Requirement::of::<String>().optional(Value::new("stranger".to_string()));

        let value = requirement.resolve(&ctx).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "stranger");
    }

    #[test]
    fn optional_requirement_prefers_present_value() {
        let ctx = Context::new().with("alice".to_string());
        let requirement = Requirement::of::<String>().optional(Value::new("stranger".to_string()));

        let value = requirement.resolve(&ctx).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "alice");
    }

    #[test]
    fn part_requirement_walks_path() {
        let ctx = Context::new().with_named("config", json!({ "db": { "ports": [1, 2] } }));
        let requirement = Requirement::named("config").item("db").attr("ports").item(1_usize);

        let value = requirement.resolve(&ctx).unwrap();
        assert_eq!(value.downcast_ref::<serde_json::Value>(), Some(&json!(2)));
    }

    #[test]
    fn part_failure_names_the_full_path() {
        let ctx = Context::new().with_named("config", json!({ "db": {} }));
        let requirement = Requirement::named("config").item("db").attr("url");

        let err = requirement.resolve(&ctx).unwrap_err();
        assert_eq!(err.requirement, "'config'['db'].url");
        assert_eq!(err.available, vec!["'config'"]);
    }

    #[test]
    fn part_of_missing_base_reports_base() {
        let ctx = Context::new();
        let err = Requirement::named("config").item("db").resolve(&ctx).unwrap_err();
        assert_eq!(err.requirement, "'config'");
    }

    #[test]
    fn nested_parts_compose() {
        let ctx = Context::new().with_named("config", json!({ "a": { "b": { "c": 7 } } }));
        let inner = Requirement::named("config").attr("a");
        let outer = Requirement::part(inner, vec![PathStep::Attr("b".into())]).item("c");

        let value = outer.resolve(&ctx).unwrap();
        assert_eq!(value.downcast_ref::<serde_json::Value>(), Some(&json!(7)));
        assert_eq!(outer.to_string(), "'config'.a.b['c']");
    }

    #[test]
    fn optional_part_falls_back() {
        let ctx = Context::new().with_named("config", json!({}));
        let requirement = Requirement::named("config")
            .item("timeout")
            .optional(Value::new(30_u32));

        let value = requirement.resolve(&ctx).unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&30));
    }

    #[test]
    fn requires_resolves_positional_and_keyword() {
        let ctx = Context::new()
            .with(Apple)
            .with_named("age", 42_u32)
            .with_named("meaning", 42_u64);
        let requires = Requires::new()
            .arg(Requirement::of::<Apple>())
            .kwarg("age", "age")
            .kwarg("it", "meaning");

        let args = requires.resolve(&ctx).unwrap();
        assert_eq!(args.positional().len(), 1);
        assert_eq!(*args.keyword::<u32>("age").unwrap(), 42);
        assert_eq!(*args.keyword::<u64>("it").unwrap(), 42);
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn requires_fails_on_first_missing_entry() {
        let ctx = Context::new().with(Apple);
        let requires = Requires::new()
            .arg(Requirement::of::<Apple>())
            .arg(Requirement::of::<Orange>());

        let err = requires.resolve(&ctx).unwrap_err();
        assert_eq!(err.requirement, "Orange");
    }

    #[test]
    fn duplicate_keyword_is_rejected() {
        let requires = Requires::new().kwarg("x", "a").kwarg("y", "b").kwarg("x", "c");
        assert_eq!(
            requires.validate(),
            Err(ConfigurationError::DuplicateParameter("x".into()))
        );
        assert!(Requires::new().kwarg("x", "a").validate().is_ok());
    }

    #[test]
    fn requires_renders() {
        assert_eq!(Requires::new().to_string(), "requires()");

        let requires = Requires::new()
            .arg(Requirement::of::<Apple>())
            .arg(Requirement::of::<Orange>().or_nothing())
            .kwarg("name", "user");
        assert_eq!(
            requires.to_string(),
            "requires(Apple, optional(Orange), name='user')"
        );
    }

    #[test]
    fn args_report_type_mismatch() {
        let args = Args::new(vec![Value::new(Apple)], Vec::new());
        let err = args.get::<Orange>(0).unwrap_err();
        assert!(matches!(err, ArgError::TypeMismatch { .. }));
        assert_eq!(args.get::<Apple>(1).unwrap_err(), ArgError::MissingPositional(1));
        assert_eq!(
            args.keyword::<Apple>("x").unwrap_err(),
            ArgError::MissingKeyword("x".into())
        );
    }
}
