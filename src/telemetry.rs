//! Logging setup
//!
//! Logs go to stderr (or a file) so they never interleave with shell
//! output on stdout. `RUST_LOG` wins over the configured level.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter {filter:?}: {error}")]
    Filter { filter: String, error: String },

    #[error("Unknown log format {0:?} (expected pretty or json)")]
    Format(String),

    #[error("Failed to open log file {path:?}: {error}")]
    LogFile { path: PathBuf, error: String },

    #[error("Logging already initialized")]
    AlreadyInitialized,
}

/// Output encoding for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(TelemetryError::Format(s.to_string())),
        }
    }
}

fn filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| TelemetryError::Filter {
        filter: level.to_string(),
        error: e.to_string(),
    })
}

fn writer(file: Option<&str>) -> Result<BoxMakeWriter, TelemetryError> {
    let Some(path) = file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TelemetryError::LogFile {
            path: PathBuf::from(path),
            error: e.to_string(),
        })?;
    Ok(BoxMakeWriter::new(Arc::new(file)))
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let format: LogFormat = config.format.parse()?;
    let writer = writer(config.file.as_deref())?;

    let layer = match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter(&config.level)?)
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(TelemetryError::Format(_))
        ));
    }

    #[test]
    fn test_unwritable_log_file() {
        let err = writer(Some("/nonexistent/dir/social.log")).unwrap_err();
        assert!(matches!(err, TelemetryError::LogFile { .. }));
    }

    #[test]
    fn test_log_file_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("social.log");
        writer(path.to_str()).unwrap();
        assert!(path.exists());
    }
}
