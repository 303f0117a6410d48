//! Resource keys.
//!
//! Every resource in a [`Context`](crate::context::Context) is filed under a
//! [`ResourceKey`]: either the type of the value, or an explicit string name.
//! Type keys compare by [`TypeId`]; name keys compare by string value.

use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Identity of a Rust type, carrying its name for diagnostics.
///
/// Equality and hashing only consider the [`TypeId`]; the name is along for
/// error messages and debug rendering.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Creates a `TypeKey` for the given type.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name with module paths stripped.
    #[must_use]
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// The key a resource is filed and looked up under.
///
/// # Example
///
/// ```
/// use relay_context::key::ResourceKey;
///
/// struct Apple;
///
/// let by_type = ResourceKey::of::<Apple>();
/// let by_name = ResourceKey::from("age");
///
/// assert_ne!(by_type, by_name);
/// assert_eq!(by_name, ResourceKey::named("age"));
/// assert_eq!(by_name.to_string(), "'age'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// Keyed by the type of the value.
    Type(TypeKey),
    /// Keyed by an explicit name.
    Name(String),
}

impl ResourceKey {
    /// Creates a type key for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    /// Creates a name key.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Returns `true` if this key names the type `T`.
    #[must_use]
    pub fn is_type<T: ?Sized + 'static>(&self) -> bool {
        matches!(self, Self::Type(key) if key.type_id() == TypeId::of::<T>())
    }
}

impl From<TypeKey> for ResourceKey {
    fn from(key: TypeKey) -> Self {
        Self::Type(key)
    }
}

impl From<&str> for ResourceKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ResourceKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(key) => write!(f, "{key}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// Strips module paths from every path segment of a type name.
///
/// `alloc::vec::Vec<my_crate::Apple>` becomes `Vec<Apple>`.
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut start = 0;
    for (i, c) in full.char_indices() {
        if matches!(c, '<' | '>' | ',' | '(' | ')' | '[' | ']' | ' ' | '&' | ';') {
            out.push_str(last_segment(&full[start..i]));
            out.push(c);
            start = i + c.len_utf8();
        }
    }
    out.push_str(last_segment(&full[start..]));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
