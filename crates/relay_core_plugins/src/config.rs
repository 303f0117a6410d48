//! Configuration loading as a pipeline step.
//!
//! [`ConfigLoader`] reads a JSON document and files it under the
//! [`CONFIG_KEY`] name, so later steps can require parts of it:
//!
//! ```
//! use relay_context::prelude::*;
//! use relay_core_plugins::ConfigLoader;
//! use relay_runner::prelude::*;
//!
//! let connect = dynamic("connect", |args: Args| {
//!     let url = args.keyword::<serde_json::Value>("url")?;
//!     Ok(format!("connected to {}", url.as_str().unwrap_or_default()))
//! });
//!
//! let mut runner = Runner::new();
//! runner.add(ConfigLoader::from_value(serde_json::json!({
//!     "db": { "url": "postgres://localhost/app" }
//! })));
//! runner
//!     .add(connect)
//!     .requires(Requires::new().kwarg("url", Requirement::named("config").item("db").item("url")))?
//!     .returns("connection");
//!
//! let ctx = runner.run()?;
//! assert_eq!(
//!     *ctx.named::<String>("connection").unwrap(),
//!     "connected to postgres://localhost/app"
//! );
//! # Ok::<(), RunnerError>(())
//! ```

use std::path::{Path, PathBuf};

use relay_context::requirement::{Args, Requirement, Requires};
use relay_context::returns::Returns;
use relay_context::value::Value;
use relay_runner::callable::{BoxError, Callable, CallableId};
use serde::de::DeserializeOwned;

/// Name under which the loaded document is filed.
pub const CONFIG_KEY: &str = "config";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// The file that was parsed.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A section did not have the expected shape.
    #[error("invalid config section: {0}")]
    Section(#[from] serde_json::Error),

    /// The path resource was neither a `PathBuf` nor a `String`.
    #[error("config path resource is a {0}, expected a path or string")]
    PathType(&'static str),

    /// The loader reads its path from the context and has no fixed source.
    #[error("config path `{0}` is only known when the loader runs")]
    NoFixedSource(String),
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Inline(serde_json::Value),
    Resource(Requirement),
}

/// Loads a JSON configuration document.
///
/// The document can come from a fixed file, from memory, or from a file
/// whose path an earlier step filed into the context (for instance parsed
/// command-line options).
///
/// Each loader is its own callable: declarations and
/// [`Runner::replace`](relay_runner::runner::Runner::replace) address this
/// loader and its clones, never another loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    id: CallableId,
    source: Source,
}

impl ConfigLoader {
    /// Loads from the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: CallableId::unique(),
            source: Source::File(path.into()),
        }
    }

    /// Files an in-memory document.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Self {
        Self {
            id: CallableId::unique(),
            source: Source::Inline(value),
        }
    }

    /// Loads from the path resolved by `requirement` at call time.
    ///
    /// The resolved value must be a [`PathBuf`] or a [`String`].
    #[must_use]
    pub fn from_path_resource(requirement: impl Into<Requirement>) -> Self {
        Self {
            id: CallableId::unique(),
            source: Source::Resource(requirement.into()),
        }
    }

    /// Reads the document from its fixed source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, and
    /// [`ConfigError::NoFixedSource`] for loaders built with
    /// [`from_path_resource`](Self::from_path_resource).
    pub fn load(&self) -> Result<serde_json::Value, ConfigError> {
        match &self.source {
            Source::File(path) => read(path),
            Source::Inline(value) => Ok(value.clone()),
            Source::Resource(requirement) => {
                Err(ConfigError::NoFixedSource(requirement.to_string()))
            }
        }
    }
}

fn read(path: &Path) -> Result<serde_json::Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(value)
}

fn path_from(value: &Value) -> Result<PathBuf, ConfigError> {
    if let Some(path) = value.downcast_ref::<PathBuf>() {
        return Ok(path.clone());
    }
    if let Some(path) = value.downcast_ref::<String>() {
        return Ok(PathBuf::from(path));
    }
    Err(ConfigError::PathType(value.type_name()))
}

/// Deserializes one section of a loaded document.
///
/// A missing section deserializes from `null`, so `Option` and
/// `#[serde(default)]` types treat it as absent.
///
/// # Errors
///
/// Returns [`ConfigError::Section`] if the section has the wrong shape.
///
/// ```
/// use relay_core_plugins::config::section;
///
/// #[derive(serde::Deserialize)]
/// struct Db { url: String }
///
/// let config = serde_json::json!({ "db": { "url": "sqlite://" } });
/// let db: Db = section(&config, "db").unwrap();
/// assert_eq!(db.url, "sqlite://");
/// ```
pub fn section<T: DeserializeOwned>(config: &serde_json::Value, name: &str) -> Result<T, ConfigError> {
    let value = config.get(name).cloned().unwrap_or_default();
    Ok(serde_json::from_value(value)?)
}

impl Callable for ConfigLoader {
    fn name(&self) -> &str {
        "config_loader"
    }

    fn id(&self) -> CallableId {
        self.id.clone()
    }

    fn default_requires(&self) -> Option<Requires> {
        let requires = Requires::new();
        match &self.source {
            Source::Resource(requirement) => Some(requires.arg(requirement.clone())),
            Source::File(_) | Source::Inline(_) => Some(requires),
        }
    }

    fn default_returns(&self) -> Option<Returns> {
        Some(Returns::key(CONFIG_KEY))
    }

    fn call(&self, args: Args) -> Result<Value, BoxError> {
        let document = match &self.source {
            Source::Resource(_) => {
                let path = args
                    .value(0)
                    .map(path_from)
                    .transpose()?
                    .ok_or(relay_context::error::ArgError::MissingPositional(0))?;
                read(&path)?
            }
            Source::File(_) | Source::Inline(_) => self.load()?,
        };
        Ok(Value::new(document))
    }
}
