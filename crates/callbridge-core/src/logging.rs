//! Logging setup for hosts embedding the bridge
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the host. [`LoggingConfig`] is the `[logging]` table of the bridge
//! configuration:
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//! directives = ["callbridge_core::alert=trace"]
//! ```
//!
//! `RUST_LOG` still applies on top of the configured level.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{BridgeError, BridgeResult};

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Compact,
    Json,
}

/// Subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` names nothing more specific
    pub level: String,
    pub format: LogFormat,
    /// Include source file and line
    pub file_info: bool,
    /// Log span open and close
    pub spans: bool,
    /// Extra filter directives, e.g. `callbridge_core::registry=trace`
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file_info: false,
            spans: false,
            directives: Vec::new(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> BridgeResult<()> {
        parse_log_level(&self.level)?;
        for directive in &self.directives {
            parse_directive(directive)?;
        }
        Ok(())
    }
}

/// Build the filter `setup_logging` installs
pub fn build_filter(config: &LoggingConfig) -> BridgeResult<EnvFilter> {
    let level = parse_log_level(&config.level)?;
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    for directive in &config.directives {
        filter = filter.add_directive(parse_directive(directive)?);
    }
    Ok(filter)
}

/// Install a global subscriber built from `config`
///
/// Fails instead of panicking if a subscriber is already installed.
pub fn setup_logging(config: &LoggingConfig) -> BridgeResult<()> {
    let filter = build_filter(config)?;

    let span_events = if config.spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Text => subscriber.try_init(),
        LogFormat::Compact => subscriber.compact().try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };

    result.map_err(|e| BridgeError::invalid_configuration("logging", e.to_string()))?;
    tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> BridgeResult<Level> {
    Level::from_str(level.trim())
        .map_err(|_| BridgeError::invalid_configuration("logging.level", format!("Invalid log level: {}", level)))
}

fn parse_directive(directive: &str) -> BridgeResult<Directive> {
    directive
        .parse()
        .map_err(|e| BridgeError::invalid_configuration("logging.directives", format!("{}: {}", directive, e)))
}
