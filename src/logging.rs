//! Logging setup for one invocation.
//!
//! Events go to stderr and, unless disabled, are appended to a log file.  The
//! subscriber is installed as the *scoped* default and removed again when the
//! returned [`LogGuard`] is dropped at the end of `main`.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt};

use crate::error::{Error, Result};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "pgkeeper.log";

/// The five-level severity scale accepted by `--log-level`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[value(alias = "warn")]
    #[serde(alias = "warn")]
    Warning,
    Error,
    /// Reported at error level; `tracing` has nothing above it.
    Critical,
}

impl LogLevel {
    pub const fn filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

/// Resolved logging configuration for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    /// `None` disables the file sink.
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// An empty path means "no log file".
    pub fn new(level: LogLevel, file: Option<PathBuf>) -> Self {
        let file = file.filter(|p| !p.as_os_str().is_empty());
        Self { level, file }
    }
}

/// Keeps the subscriber installed; drop it to uninstall.
#[must_use = "logging stops when the guard is dropped"]
pub struct LogGuard {
    _default: DefaultGuard,
}

/// Install the stderr (and optional file) subscriber for this thread.
pub fn init(settings: &LogSettings) -> Result<LogGuard> {
    let file_layer = match settings.file.as_deref() {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(settings.level.filter())
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer);

    Ok(LogGuard {
        _default: tracing::subscriber::set_default(subscriber),
    })
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(format!("opening log file {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_maps_to_error() {
        assert_eq!(LogLevel::Critical.filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Warning.filter(), LevelFilter::WARN);
    }

    #[test]
    fn level_names_are_case_insensitive_with_warn_alias() {
        assert_eq!(LogLevel::from_str("WARNING", true).unwrap(), LogLevel::Warning);
        assert_eq!(LogLevel::from_str("warn", true).unwrap(), LogLevel::Warning);
        assert_eq!(LogLevel::from_str("Critical", true).unwrap(), LogLevel::Critical);
        assert!(LogLevel::from_str("verbose", true).is_err());
    }

    #[test]
    fn empty_file_path_disables_file_logging() {
        let s = LogSettings::new(LogLevel::Info, Some(PathBuf::new()));
        assert!(s.file.is_none());
    }

    #[test]
    fn init_appends_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgkeeper.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        {
            let _guard = init(&LogSettings::new(LogLevel::Info, Some(path.clone()))).unwrap();
            tracing::info!("hello from the test");
            tracing::debug!("filtered out at info");
        }

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("earlier run\n"));
        assert!(text.contains("hello from the test"));
        assert!(!text.contains("filtered out"));
    }

    #[test]
    fn init_fails_for_unwritable_log_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("pgkeeper.log");
        let result = init(&LogSettings::new(LogLevel::Info, Some(path)));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
