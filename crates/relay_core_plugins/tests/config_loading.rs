//! Integration tests for loading configuration inside a runner.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use relay_core_plugins::{ConfigError, ConfigLoader, TracingSetup};
use relay_runner::prelude::*;

fn isolated_runner() -> Runner {
    Runner::with_declarations(Arc::new(Declarations::new()))
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn database_url() -> DynamicCallable<impl Fn(Args) -> Result<String, BoxError> + Send + Sync + 'static>
{
    dynamic("database_url", |args: Args| {
        let url = args.keyword::<serde_json::Value>("url")?;
        Ok(url.as_str().unwrap_or_default().to_owned())
    })
    .with_requires(
        Requires::new().kwarg("url", Requirement::named("config").item("db").item("url")),
    )
    .with_returns("url")
}

#[test]
fn file_config_feeds_later_steps() {
    let file = write_config(r#"{ "db": { "url": "sqlite://app.db" } }"#);

    let mut runner = isolated_runner();
    runner.add(ConfigLoader::new(file.path()));
    runner.add(database_url());

    let ctx = runner.run().unwrap();
    assert_eq!(*ctx.named::<String>("url").unwrap(), "sqlite://app.db");
}

#[test]
fn path_can_come_from_an_earlier_step() {
    let file = write_config(r#"{ "db": { "url": "postgres://db" } }"#);
    let path = file.path().to_path_buf();

    let mut runner = isolated_runner();
    runner.add(move || path.clone()).returns("config_path");
    runner.add(ConfigLoader::from_path_resource("config_path"));
    runner.add(database_url());

    let ctx = runner.run().unwrap();
    assert_eq!(*ctx.named::<String>("url").unwrap(), "postgres://db");
    assert!(ctx.named::<PathBuf>("config_path").is_some());
}

#[test]
fn missing_file_propagates_config_error() {
    let mut runner = isolated_runner();
    runner.add(ConfigLoader::new("/no/such/relay.json"));
    runner.add(database_url());

    let err = runner.run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Io { .. })
    ));
}

#[test]
fn malformed_file_propagates_parse_error() {
    let file = write_config("{ not json");

    let mut runner = isolated_runner();
    runner.add(ConfigLoader::new(file.path()));

    let err = runner.run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Parse { .. })
    ));
}

#[test]
fn missing_section_reports_the_full_path() {
    let mut runner = isolated_runner();
    runner.add(ConfigLoader::from_value(serde_json::json!({ "cache": {} })));
    runner.add(database_url());

    let err = runner.run().unwrap_err();
    let RunnerError::MissingRequirement(missing) = err else {
        panic!("expected a missing requirement");
    };
    assert_eq!(missing.requirement, "'config'['db']['url']");
    assert_eq!(missing.available, ["'config'"]);
}

#[test]
fn tracing_setup_contributes_no_resource() {
    let mut runner = isolated_runner();
    runner.add(ConfigLoader::from_value(serde_json::json!({
        "logging": { "level": "debug", "format": "compact" }
    })));
    runner.add(TracingSetup::new().from_config());

    let ctx = runner.run().unwrap();
    assert_eq!(ctx.available(), ["'config'"]);
}

#[test]
fn bad_logging_section_fails_the_run() {
    let mut runner = isolated_runner();
    runner.add(ConfigLoader::from_value(serde_json::json!({
        "logging": { "level": "deafening" }
    })));
    runner.add(TracingSetup::new().from_config());

    let err = runner.run().unwrap_err();
    assert_eq!(err.to_string(), "invalid log level `deafening`");
}

#[test]
fn tracing_setup_without_config_needs_nothing() {
    let mut runner = isolated_runner();
    runner.add(TracingSetup::new());

    assert_eq!(
        format!("{runner:?}"),
        "<Runner>\n    tracing_setup requires() returns_result_type()\n</Runner>"
    );
    assert!(runner.run().unwrap().is_empty());
}

#[test]
fn replace_swaps_the_loader_given_not_its_first_sibling() {
    let first = ConfigLoader::from_value(serde_json::json!({ "which": "a" }));
    let second = ConfigLoader::from_value(serde_json::json!({ "which": "b" }));
    let third = ConfigLoader::from_value(serde_json::json!({ "which": "c" }));

    let mut runner = isolated_runner();
    runner.add(first);
    runner.add(second.clone()).returns("second");
    runner.replace(second, third).unwrap();

    let ctx = runner.run().unwrap();
    let which = |name| ctx.named::<serde_json::Value>(name).unwrap()["which"].clone();
    assert_eq!(which("config"), "a");
    assert_eq!(which("second"), "c");
}

#[test]
fn declarations_apply_to_one_loader_only() {
    let declarations = Arc::new(Declarations::new());
    let declared = ConfigLoader::from_value(serde_json::json!(1));
    declarations.declare(declared.clone()).returns("only_this_one");

    let mut runner = Runner::with_declarations(Arc::clone(&declarations));
    runner.add(declared);
    runner.add(ConfigLoader::from_value(serde_json::json!(2)));

    assert_eq!(
        format!("{runner:?}"),
        "<Runner>\n    config_loader requires() returns('only_this_one')\n    config_loader requires() returns('config')\n</Runner>"
    );
}
