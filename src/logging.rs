//! Structured logging setup.
//!
//! Everything in the crate logs through `tracing`; this module installs the
//! subscriber. Configuration comes from the environment:
//!
//! | Variable                     | Default | Meaning                          |
//! |------------------------------|---------|----------------------------------|
//! | `APPHUB_LOG_LEVEL`           | `info`  | base level (`RUST_LOG` wins)     |
//! | `APPHUB_LOG_FORMAT`          | `json`  | `json` or `pretty`               |
//! | `APPHUB_LOG_ASYNC`           | `true`  | write through a background thread |
//! | `APPHUB_LOG_TARGET_FILTER`   | unset   | extra comma-separated directives |
//! | `APPHUB_LOG_INCLUDE_LOCATION`| `false` | add file and line to each event  |

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    pub async_logging: bool,
    /// Extra `EnvFilter` directives, comma-separated.
    pub target_filter: Option<String>,
    pub include_location: bool,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_level: get("APPHUB_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: LogFormat::parse(&get("APPHUB_LOG_FORMAT").unwrap_or_default()),
            async_logging: get("APPHUB_LOG_ASYNC")
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            target_filter: get("APPHUB_LOG_TARGET_FILTER").filter(|s| !s.trim().is_empty()),
            include_location: get("APPHUB_LOG_INCLUDE_LOCATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        // Client disconnects are logged by the server at debug/info.
        if let Ok(directive) = "may_minihttp::http_server=warn".parse() {
            filter = filter.add_directive(directive);
        }

        if let Some(target_filter) = &self.target_filter {
            for directive in target_filter.split(',').map(str::trim) {
                if directive.is_empty() {
                    continue;
                }
                match directive.parse() {
                    Ok(d) => filter = filter.add_directive(d),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {directive}"),
                }
            }
        }
        filter
    }
}

/// Install the global subscriber.
///
/// With async logging the returned guard must be held for the lifetime of
/// the process; dropping it flushes and stops the writer thread.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    let (writer, guard) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout),
            None,
        )
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    registry
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> LogConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        LogConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(cfg.async_logging);
        assert!(cfg.target_filter.is_none());
        assert!(!cfg.include_location);
    }

    #[test]
    fn test_overrides() {
        let cfg = config_from(&[
            ("APPHUB_LOG_LEVEL", "debug"),
            ("APPHUB_LOG_FORMAT", "Pretty"),
            ("APPHUB_LOG_ASYNC", "false"),
            ("APPHUB_LOG_TARGET_FILTER", "apphub::store=trace"),
            ("APPHUB_LOG_INCLUDE_LOCATION", "true"),
        ]);
        assert_eq!(cfg.level(), Level::DEBUG);
        assert_eq!(cfg.format, LogFormat::Pretty);
        assert!(!cfg.async_logging);
        assert_eq!(cfg.target_filter.as_deref(), Some("apphub::store=trace"));
        assert!(cfg.include_location);
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let cfg = config_from(&[("APPHUB_LOG_LEVEL", "loud"), ("APPHUB_LOG_ASYNC", "maybe")]);
        assert_eq!(cfg.level(), Level::INFO);
        assert!(cfg.async_logging);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    }
}
