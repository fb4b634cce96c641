//! Log output for the calmirror binaries.
//!
//! Logs always go to stderr so agenda and JSON output on stdout stay clean.
//! `RUST_LOG` overrides the level chosen here.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt as layer, prelude::*};

/// Crates whose events pass the default filter.
const TARGETS: [&str; 4] = [
    "calmirror",
    "calmirror_core",
    "calmirror_providers",
    "calmirror_sync",
];

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("tracing is already initialized: {0}")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("invalid RUST_LOG directive: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}

/// Shape of each log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format `{}` (expected compact or json)", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Add target, file and line to each event.
    pub verbose: bool,
}

impl TracingConfig {
    /// Warnings only, no timestamps.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            verbose: false,
        }
    }

    /// What `--debug` turns on.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            verbose: true,
            ..Self::cli()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn directive(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Installs the global subscriber.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directive()))?;

    let output = match config.format {
        LogFormat::Compact => {
            let output = layer::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(config.verbose)
                .with_file(config.verbose)
                .with_line_number(config.verbose);
            if config.verbose {
                output.boxed()
            } else {
                output.without_time().boxed()
            }
        }
        LogFormat::Json => layer::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(config.verbose)
            .with_line_number(config.verbose)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(output);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_preset_raises_level_and_detail() {
        let quiet = TracingConfig::cli();
        let debug = TracingConfig::cli_debug().with_format(LogFormat::Json);
        assert_eq!(quiet.level, Level::WARN);
        assert!(!quiet.verbose);
        assert_eq!(debug.level, Level::DEBUG);
        assert!(debug.verbose);
        assert_eq!(debug.format, LogFormat::Json);
    }

    #[test]
    fn directive_names_every_crate() {
        let directive = TracingConfig::cli().directive();
        assert_eq!(
            directive,
            "calmirror=warn,calmirror_core=warn,calmirror_providers=warn,calmirror_sync=warn"
        );
        assert!(EnvFilter::try_new(directive).is_ok());
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
