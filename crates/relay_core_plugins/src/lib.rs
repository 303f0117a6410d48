//! Ready-made collaborator callables for relay runners (Layer 3).
//!
//! Most pipelines start the same way: load configuration, then set up
//! logging. This crate provides both as ordinary callables:
//!
//! - [`ConfigLoader`] - Reads a JSON document and files it under `"config"`
//! - [`TracingSetup`] - Installs a `tracing` subscriber, filing nothing
//!
//! # Example
//!
//! ```
//! use relay_core_plugins::{ConfigLoader, TracingSetup};
//! use relay_runner::runner::Runner;
//! use tracing::Level;
//!
//! let mut runner = Runner::new();
//! runner.add(ConfigLoader::from_value(serde_json::json!({ "logging": { "level": "warn" } })));
//! runner.add(TracingSetup::default().with_level(Level::DEBUG).from_config());
//!
//! let ctx = runner.run().unwrap();
//! assert!(ctx.named::<serde_json::Value>("config").is_some());
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`relay_context`): Keys, values, descriptors
//! - **Layer 2** (`relay_runner`): Points, runners, and the execution engine
//! - **Layer 3** (`relay_core_plugins`): Ready-made collaborator callables (this crate)

/// Configuration loading.
pub mod config;

mod tracing_setup;

pub use config::{CONFIG_KEY, ConfigError, ConfigLoader};
pub use tracing_setup::{LoggingSection, TracingFormat, TracingSetup, TracingSetupError};
