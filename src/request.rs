//! Per-invocation request values.
//!
//! A [`BackupRequest`] or [`RestoreRequest`] is assembled once from the CLI
//! arguments (with configuration-file fallbacks), handed to the command
//! builder and dropped when the child process exits.  Nothing here is
//! persisted.

use std::{fmt, path::PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// PostgreSQL's default port.
pub const DEFAULT_PORT: u16 = 5432;

// ─── Connection ───────────────────────────────────────────────────────────────

/// Where the server lives and who to connect as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub dbname: String,
}

impl Connection {
    /// Build a connection, rejecting blank fields.
    ///
    /// `host` and `username` are optional at this point because they may come
    /// from either the CLI or the config file; a missing value here means
    /// neither source provided one.
    pub fn new(
        host: Option<String>,
        port: u16,
        username: Option<String>,
        dbname: String,
    ) -> Result<Self> {
        let host = required(host, "--host", "[connection].host")?;
        let username = required(username, "--username", "[connection].username")?;
        if dbname.trim().is_empty() {
            return Err(Error::InputValidation("--dbname must not be empty".into()));
        }
        Ok(Self {
            host,
            port,
            username,
            dbname,
        })
    }
}

fn required(value: Option<String>, flag: &str, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::InputValidation(format!(
            "missing {flag} (pass it on the command line or set {key} in the config file)"
        ))),
    }
}

// ─── Dump format ──────────────────────────────────────────────────────────────

/// `pg_dump` output format.
///
/// The single-letter codes are the ones `pg_dump --format` accepts; the long
/// names are accepted as aliases on the CLI and in the config file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize,
)]
pub enum DumpFormat {
    /// Compressed custom archive, restored with `pg_restore`.
    #[default]
    #[value(name = "c", alias = "custom")]
    #[serde(rename = "c", alias = "custom")]
    Custom,
    /// One file per table inside a directory, restored with `pg_restore`.
    #[value(name = "d", alias = "directory")]
    #[serde(rename = "d", alias = "directory")]
    Directory,
    /// tar archive, restored with `pg_restore`.
    #[value(name = "t", alias = "tar")]
    #[serde(rename = "t", alias = "tar")]
    Tar,
    /// Plain SQL script, restored with `psql`.
    #[value(name = "p", alias = "plain")]
    #[serde(rename = "p", alias = "plain")]
    Plain,
}

impl DumpFormat {
    /// The letter passed to `pg_dump --format=`.
    pub const fn code(self) -> char {
        match self {
            Self::Custom => 'c',
            Self::Directory => 'd',
            Self::Tar => 't',
            Self::Plain => 'p',
        }
    }

    /// File extension of the artifact, including the dot.  Directory dumps
    /// have none.
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            Self::Custom => Some(".dump"),
            Self::Directory => None,
            Self::Tar => Some(".tar"),
            Self::Plain => Some(".sql"),
        }
    }

    /// Whether `-b` (include large objects) is passed.  Directory dumps leave
    /// it out; a whole-database dump includes large objects anyway.
    pub const fn includes_large_objects(self) -> bool {
        !matches!(self, Self::Directory)
    }
}

impl fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Custom => "custom",
            Self::Directory => "directory",
            Self::Tar => "tar",
            Self::Plain => "plain",
        };
        f.write_str(name)
    }
}

// ─── Password ─────────────────────────────────────────────────────────────────

/// How the database password is obtained.
#[derive(Clone, PartialEq, Eq)]
pub enum PasswordSource {
    /// Given on the command line.
    Given(String),
    /// Ask on the terminal with echo off.
    Prompt,
    /// Don't ask and don't set `PGPASSWORD`; libpq falls back to `.pgpass`
    /// or trust authentication.
    Skip,
}

impl PasswordSource {
    pub fn from_flags(password: Option<String>, no_password: bool) -> Self {
        match (password, no_password) {
            (Some(pw), _) => Self::Given(pw),
            (None, true) => Self::Skip,
            (None, false) => Self::Prompt,
        }
    }
}

impl fmt::Debug for PasswordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Given(_) => f.write_str("Given(<redacted>)"),
            Self::Prompt => f.write_str("Prompt"),
            Self::Skip => f.write_str("Skip"),
        }
    }
}

// ─── Requests ─────────────────────────────────────────────────────────────────

/// Everything needed to run one `pg_dump`.
#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub connection: Connection,
    pub backup_dir: PathBuf,
    pub format: DumpFormat,
    pub password: PasswordSource,
}

/// Everything needed to run one `pg_restore` or `psql`.
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    pub connection: Connection,
    pub backup_file: PathBuf,
    pub password: PasswordSource,
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DumpFormat; 4] = [
        DumpFormat::Custom,
        DumpFormat::Directory,
        DumpFormat::Tar,
        DumpFormat::Plain,
    ];

    #[test]
    fn connection_requires_host() {
        let err = Connection::new(None, DEFAULT_PORT, Some("u".into()), "db".into()).unwrap_err();
        assert!(matches!(err, Error::InputValidation(ref m) if m.contains("--host")));
    }

    #[test]
    fn connection_rejects_blank_username() {
        let err =
            Connection::new(Some("h".into()), DEFAULT_PORT, Some("  ".into()), "db".into())
                .unwrap_err();
        assert!(matches!(err, Error::InputValidation(ref m) if m.contains("--username")));
    }

    #[test]
    fn connection_rejects_empty_dbname() {
        let err = Connection::new(Some("h".into()), DEFAULT_PORT, Some("u".into()), String::new())
            .unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
    }

    #[test]
    fn connection_accepts_complete_input() {
        let c = Connection::new(Some("db.lan".into()), 6543, Some("alice".into()), "shop".into())
            .unwrap();
        assert_eq!(c.host, "db.lan");
        assert_eq!(c.port, 6543);
    }

    #[test]
    fn format_codes_are_distinct_letters() {
        let codes: Vec<char> = ALL.iter().map(|f| f.code()).collect();
        assert_eq!(codes, vec!['c', 'd', 't', 'p']);
    }

    #[test]
    fn only_directory_format_has_no_extension() {
        for format in ALL {
            assert_eq!(
                format.extension().is_none(),
                format == DumpFormat::Directory,
                "{format}"
            );
        }
    }

    #[test]
    fn format_parses_codes_and_long_names() {
        assert_eq!(DumpFormat::from_str("t", false).unwrap(), DumpFormat::Tar);
        assert_eq!(DumpFormat::from_str("plain", false).unwrap(), DumpFormat::Plain);
        assert!(DumpFormat::from_str("x", false).is_err());
    }

    #[test]
    fn password_flags_pick_source() {
        assert_eq!(
            PasswordSource::from_flags(Some("pw".into()), false),
            PasswordSource::Given("pw".into())
        );
        assert_eq!(PasswordSource::from_flags(None, true), PasswordSource::Skip);
        assert_eq!(PasswordSource::from_flags(None, false), PasswordSource::Prompt);
    }

    #[test]
    fn given_password_is_redacted_in_debug() {
        let dbg = format!("{:?}", PasswordSource::Given("hunter2".into()));
        assert!(!dbg.contains("hunter2"));
    }
}
