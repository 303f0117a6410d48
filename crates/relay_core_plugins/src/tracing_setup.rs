//! Logging setup as a pipeline step.
//!
//! [`TracingSetup`] installs a `tracing` subscriber when the runner reaches
//! it. It is an ordinary side-effecting callable: it files nothing into the
//! context, so it can sit anywhere before the steps whose logs matter.
//!
//! # Example
//!
//! ```
//! use relay_core_plugins::{ConfigLoader, TracingFormat, TracingSetup};
//! use relay_runner::runner::Runner;
//! use tracing::Level;
//!
//! let mut runner = Runner::new();
//! runner.add(ConfigLoader::from_value(serde_json::json!({
//!     "logging": { "level": "debug", "format": "compact" }
//! })));
//! runner.add(
//!     TracingSetup::new()
//!         .with_level(Level::INFO)
//!         .with_format(TracingFormat::Pretty)
//!         .from_config(),
//! );
//!
//! let ctx = runner.run().unwrap();
//! assert_eq!(ctx.len(), 1);
//! ```
//!
//! # Configuration section
//!
//! With [`from_config`](TracingSetup::from_config), settings found under
//! `logging` in the `"config"` resource override the builder settings:
//!
//! ```json
//! { "logging": { "level": "debug", "format": "json", "filter": "relay=trace", "span_events": true } }
//! ```
//!
//! Every field is optional, and so is the section itself.

use core::str::FromStr;

use relay_context::requirement::{Args, Requirement, Requires};
use relay_context::value::Value;
use relay_runner::callable::{BoxError, Callable, CallableId};
use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

/// The `logging` section of a configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Maximum level, e.g. `"debug"`.
    pub level: Option<String>,
    /// Output format.
    pub format: Option<TracingFormat>,
    /// Target filter, e.g. `"relay=debug,hyper=warn"`.
    pub filter: Option<String>,
    /// Whether to log span enter/exit events.
    pub span_events: Option<bool>,
}

/// The `logging` section could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    /// The section is not shaped like a [`LoggingSection`].
    #[error("invalid logging section: {0}")]
    InvalidSection(#[from] serde_json::Error),

    /// The level is not one of `trace`, `debug`, `info`, `warn`, `error`.
    #[error("invalid log level `{0}`")]
    InvalidLevel(String),
}

/// Installs a `tracing` subscriber.
///
/// Uses the [`tracing`] and [`tracing_subscriber`] crates under the hood.
/// Installing twice in one process is harmless: the first subscriber stays.
///
/// # Configuration Options
///
/// ```
/// use relay_core_plugins::{TracingFormat, TracingSetup};
/// use tracing::Level;
///
/// // Development: Pretty colored output with debug level
/// let dev = TracingSetup::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // Production: JSON output for log aggregation
/// let prod = TracingSetup::default()
///     .with_level(Level::INFO)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("relay_runner=info,my_app=debug");
/// ```
#[derive(Debug, Clone)]
pub struct TracingSetup {
    /// Identity shared by this setup and its clones.
    id: CallableId,
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "relay=debug,hyper=warn").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
    /// Whether to read the `logging` section of the `"config"` resource.
    read_config: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            id: CallableId::unique(),
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
            read_config: false,
        }
    }
}

impl TracingSetup {
    /// Creates a `TracingSetup` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Reads overrides from the `logging` section of the `"config"` resource.
    #[must_use]
    pub fn from_config(mut self) -> Self {
        self.read_config = true;
        self
    }

    /// Returns the configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Returns a copy with `section` applied on top.
    ///
    /// # Errors
    ///
    /// Returns [`TracingSetupError::InvalidLevel`] if the level is unknown.
    pub fn apply(&self, section: &LoggingSection) -> Result<Self, TracingSetupError> {
        let mut setup = self.clone();
        if let Some(level) = &section.level {
            setup.level =
                Level::from_str(level).map_err(|_| TracingSetupError::InvalidLevel(level.clone()))?;
        }
        if let Some(format) = section.format {
            setup.format = format;
        }
        if let Some(filter) = &section.filter {
            setup.env_filter = Some(filter.clone());
        }
        if let Some(span_events) = section.span_events {
            setup.span_events = span_events;
        }
        Ok(setup)
    }

    /// Installs the subscriber.
    ///
    /// Returns `false` if a global subscriber was already installed.
    pub fn init(&self) -> bool {
        let env_filter = match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        };

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        tracing::info!(
            level = %self.level,
            format = ?self.format,
            installed,
            "tracing initialized"
        );
        installed
    }

    fn section(args: &Args) -> Result<Option<LoggingSection>, TracingSetupError> {
        let Some(value) = args.keyword_value("logging") else {
            return Ok(None);
        };
        let Some(json) = value.downcast_ref::<serde_json::Value>() else {
            return Ok(None);
        };
        Ok(Some(LoggingSection::deserialize(json)?))
    }
}

impl Callable for TracingSetup {
    fn name(&self) -> &str {
        "tracing_setup"
    }

    fn id(&self) -> CallableId {
        self.id.clone()
    }

    fn default_requires(&self) -> Option<Requires> {
        let requires = Requires::new();
        if !self.read_config {
            return Some(requires);
        }
        Some(requires.kwarg(
            "logging",
            Requirement::named(crate::config::CONFIG_KEY)
                .item("logging")
                .or_nothing(),
        ))
    }

    fn call(&self, args: Args) -> Result<Value, BoxError> {
        let setup = match Self::section(&args)? {
            Some(section) => self.apply(&section)?,
            None => self.clone(),
        };
        setup.init();
        Ok(Value::nothing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_format_default_is_pretty() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn tracing_setup_defaults() {
        let setup = TracingSetup::default();
        assert_eq!(setup.level, Level::INFO);
        assert_eq!(setup.format, TracingFormat::Pretty);
        assert!(!setup.span_events);
    }

    #[test]
    fn tracing_setup_builders() {
        let setup = TracingSetup::new()
            .with_level(Level::DEBUG)
            .with_format(TracingFormat::Json)
            .with_env_filter("relay=debug")
            .with_span_events(true);
        assert_eq!(setup.level, Level::DEBUG);
        assert_eq!(setup.format, TracingFormat::Json);
        assert_eq!(setup.env_filter, Some("relay=debug".to_string()));
        assert!(setup.span_events);
    }

    #[test]
    fn section_overrides_builder_settings() {
        let section: LoggingSection = serde_json::from_value(serde_json::json!({
            "level": "warn",
            "format": "compact",
        }))
        .unwrap();

        let setup = TracingSetup::new().with_span_events(true).apply(&section).unwrap();
        assert_eq!(setup.level(), Level::WARN);
        assert_eq!(setup.format(), TracingFormat::Compact);
        assert!(setup.span_events);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let section = LoggingSection {
            level: Some("loud".into()),
            ..LoggingSection::default()
        };
        let err = TracingSetup::new().apply(&section).unwrap_err();
        assert!(matches!(err, TracingSetupError::InvalidLevel(level) if level == "loud"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<LoggingSection, _> =
            serde_json::from_value(serde_json::json!({ "colour": true }));
        assert!(result.is_err());
    }

    #[test]
    fn requirements_depend_on_config_reading() {
        assert!(TracingSetup::new().default_requires().unwrap().is_empty());
        assert_eq!(
            TracingSetup::new()
                .from_config()
                .default_requires()
                .unwrap()
                .to_string(),
            "requires(logging=optional('config'['logging']))"
        );
    }

    #[test]
    fn calling_files_nothing() {
        let value = TracingSetup::new().call(Args::default()).unwrap();
        assert!(value.is_nothing());
    }
}
