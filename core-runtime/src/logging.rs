//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack used by every crate in the
//! workspace. Supports:
//! - JSON and pretty-print output formats
//! - Module-level filtering via `RUST_LOG`-style directives
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_directives("core_narration=debug,core_session=debug");
//!
//! init_logging(config).expect("Failed to initialize logging");
//!
//! tracing::info!("Playback core started");
//! ```

use crate::error::{Error, Result};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Filter directives applied when `RUST_LOG` is unset
    pub directives: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            directives: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the fallback filter directives (e.g. `"core_session=debug"`).
    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = directives.into();
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured directives, so operators
/// can raise verbosity without a rebuild.
///
/// # Errors
///
/// Returns an error if the filter directives fail to parse or a global
/// subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.directives))
        .map_err(|e| Error::Logging(format!("invalid filter directives: {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);

    let init_result = match config.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    };

    init_result.map_err(|e| Error::Logging(format!("subscriber already set: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_are_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.directives, "info");
    }

    #[test]
    fn builder_overrides_format_and_directives() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_directives("core_narration=trace");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.directives, "core_narration=trace");
    }
}
