//! Configuration types and loading logic.
//!
//! Everything in the config file is optional and every value can also be
//! given on the command line, which always wins.  Two files are merged:
//!
//! 1. `<config_dir>/pgkeeper/config.toml` — per-user defaults
//! 2. `pgkeeper.toml` (or `--config PATH`) — per-project overrides
//!
//! Local values win on a per-field basis.  Either file may be absent.
//! Passwords are deliberately not part of the file format.
//!
//! # File format
//!
//! ```toml
//! [connection]
//! host     = "db.internal"
//! port     = 5432
//! username = "backup"
//!
//! [backup]
//! dir    = "./backups"
//! format = "c"             # c | d | t | p
//!
//! [log]
//! level = "info"           # debug | info | warning | error | critical
//! file  = "./pgkeeper.log" # "" disables the log file
//!
//! [tools]
//! pg_dump    = "/usr/lib/postgresql/16/bin/pg_dump"
//! pg_restore = "pg_restore"
//! psql       = "psql"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    command::ToolPaths,
    logging::{DEFAULT_LOG_FILE, LogLevel},
    request::{DEFAULT_PORT, DumpFormat},
};

/// Default backup directory, relative to the working directory.
pub const DEFAULT_BACKUP_DIR: &str = "./backups";

// ─── Resolved config ──────────────────────────────────────────────────────────

/// Fully resolved configuration: every field that has a sensible default is
/// filled in.  `host` and `username` stay optional because there is no safe
/// default for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub backup: BackupConfig,
    pub log: LogConfig,
    pub tools: ToolPaths,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupConfig {
    pub dir: PathBuf,
    pub format: DumpFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogConfig {
    pub level: LogLevel,
    /// `None` when file logging is disabled.
    pub file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        PartialConfig::default().resolve()
    }
}

// ─── Partial config (one file) ────────────────────────────────────────────────

/// The contents of a single config file.  Every field is optional so files
/// can be layered with [`PartialConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    pub connection: PartialConnection,
    pub backup: PartialBackup,
    pub log: PartialLog,
    pub tools: PartialTools,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConnection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialBackup {
    pub dir: Option<PathBuf>,
    pub format: Option<DumpFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialLog {
    pub level: Option<LogLevel>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialTools {
    pub pg_dump: Option<String>,
    pub pg_restore: Option<String>,
    pub psql: Option<String>,
}

impl PartialConfig {
    /// Layer `other` on top of `self`; fields set in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            connection: PartialConnection {
                host: other.connection.host.or(self.connection.host),
                port: other.connection.port.or(self.connection.port),
                username: other.connection.username.or(self.connection.username),
            },
            backup: PartialBackup {
                dir: other.backup.dir.or(self.backup.dir),
                format: other.backup.format.or(self.backup.format),
            },
            log: PartialLog {
                level: other.log.level.or(self.log.level),
                file: other.log.file.or(self.log.file),
            },
            tools: PartialTools {
                pg_dump: other.tools.pg_dump.or(self.tools.pg_dump),
                pg_restore: other.tools.pg_restore.or(self.tools.pg_restore),
                psql: other.tools.psql.or(self.tools.psql),
            },
        }
    }

    /// Fill in built-in defaults for everything still unset.
    pub fn resolve(self) -> Config {
        let tools = ToolPaths::default();
        Config {
            connection: ConnectionConfig {
                host: self.connection.host,
                port: self.connection.port.unwrap_or(DEFAULT_PORT),
                username: self.connection.username,
            },
            backup: BackupConfig {
                dir: self
                    .backup
                    .dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR)),
                format: self.backup.format.unwrap_or_default(),
            },
            log: LogConfig {
                level: self.log.level.unwrap_or_default(),
                file: match self.log.file {
                    Some(p) if p.as_os_str().is_empty() => None,
                    Some(p) => Some(p),
                    None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
                },
            },
            tools: ToolPaths {
                pg_dump: self.tools.pg_dump.unwrap_or(tools.pg_dump),
                pg_restore: self.tools.pg_restore.unwrap_or(tools.pg_restore),
                psql: self.tools.psql.unwrap_or(tools.psql),
            },
        }
    }
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Parse one config file.
///
/// Returns `Ok(None)` when `path` does not exist, and an error if it exists
/// but cannot be read or is not valid TOML for this schema.
pub fn parse_partial(path: &Path) -> Result<Option<PartialConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed = toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(parsed))
}

/// Location of the per-user config file, if the platform has a config dir.
pub fn global_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|d| d.join("pgkeeper").join("config.toml"))
}

/// Load and merge the global and local config files.
///
/// A broken global file is an error just like a broken local one; a missing
/// file of either kind is not.
pub fn load_merged(global: Option<&Path>, local: &Path) -> Result<Config> {
    let global = match global {
        Some(p) => parse_partial(p)?.unwrap_or_default(),
        None => PartialConfig::default(),
    };
    let local = parse_partial(local)?.unwrap_or_default();
    Ok(global.merge(local).resolve())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
