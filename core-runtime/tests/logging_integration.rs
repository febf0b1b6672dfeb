//! Integration tests for the logging configuration.
//!
//! The global subscriber can only be installed once per process, so these
//! tests exercise the config builder and a single end-to-end init.

use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

#[test]
fn config_builder_chains() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_directives("core_narration=debug,core_session=trace");

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.directives, "core_narration=debug,core_session=trace");
}

#[test]
fn format_defaults_track_build_profile() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn init_succeeds_once_then_reports_duplicates() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_directives("info");
    assert!(init_logging(config.clone()).is_ok());
    tracing::info!("logging initialized from integration test");

    // A second install must fail cleanly instead of panicking.
    assert!(init_logging(config).is_err());
}
