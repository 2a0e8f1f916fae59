//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the command handlers.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::{logging::LogLevel, request::DumpFormat};

/// Top-level CLI arguments, shared across every subcommand.
#[derive(Parser, Debug)]
#[command(
    name    = "pgkeeper",
    about   = "Back up and restore PostgreSQL databases with pg_dump, pg_restore and psql",
    version,
    // Show a compact two-column help layout.
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Path to the configuration file.
    ///
    /// Defaults to `pgkeeper.toml` in the current working directory.  A
    /// missing file is fine; every setting also has a flag.
    #[arg(short, long, global = true, default_value = "pgkeeper.toml")]
    pub config: PathBuf,

    /// Log level for the console and the log file.
    #[arg(long, global = true, value_enum, ignore_case = true)]
    pub log_level: Option<LogLevel>,

    /// Append log output to this file.  Pass an empty string to disable.
    ///
    /// Defaults to `./pgkeeper.log`.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print the resolved configuration and exit without running anything.
    #[arg(long, global = true)]
    pub print_config: bool,

    #[command(subcommand)]
    pub command: Option<Subcommand>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Dump a database with `pg_dump` into a timestamped file.
    ///
    /// The artifact is written to
    /// `<backup-dir>/backup_<dbname>_<YYYYMMDD_HHMMSS>.<ext>` (UTC), or to a
    /// directory of that name for `--format d`.
    Backup(BackupArgs),

    /// Restore a database from a backup file.
    ///
    /// Files ending in `.sql` are fed to `psql`; everything else (including
    /// directory-format dumps) goes to `pg_restore`.
    Restore(RestoreArgs),

    /// Scaffold a `pgkeeper.toml` in the current directory.
    ///
    /// Exits with an error if the file already exists to avoid accidental
    /// overwrites.
    Init,
}

/// Connection flags shared by `backup` and `restore`.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// PostgreSQL server host (e.g. `localhost`).
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL server port [default: 5432].
    #[arg(long)]
    pub port: Option<u16>,

    /// Database user name.
    #[arg(long)]
    pub username: Option<String>,

    /// Database to back up or restore into.
    #[arg(long)]
    pub dbname: String,

    /// Database password.  Prompted for (without echo) when omitted.
    ///
    /// The password reaches the utility through `PGPASSWORD`, never through
    /// its argument list.
    #[arg(long, conflicts_with = "no_password")]
    pub password: Option<String>,

    /// Never prompt and don't set `PGPASSWORD`; rely on `~/.pgpass` or
    /// trust authentication.
    #[arg(long)]
    pub no_password: bool,
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Directory to store backup files [default: ./backups].
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Dump format: c (custom), d (directory), t (tar), p (plain) [default: c].
    #[arg(long, value_enum)]
    pub format: Option<DumpFormat>,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Backup file, or the directory of a directory-format dump.
    #[arg(long)]
    pub backup_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("pgkeeper").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn backup_parses_all_flags() {
        let cli = parse(&[
            "backup",
            "--host",
            "localhost",
            "--port",
            "6543",
            "--username",
            "postgres",
            "--dbname",
            "shop",
            "--backup-dir",
            "/tmp/b",
            "--format",
            "t",
            "--password",
            "pw",
        ])
        .unwrap();
        let Some(Subcommand::Backup(args)) = cli.command else {
            panic!("expected backup");
        };
        assert_eq!(args.connection.port, Some(6543));
        assert_eq!(args.format, Some(DumpFormat::Tar));
        assert_eq!(args.backup_dir, Some(PathBuf::from("/tmp/b")));
        assert_eq!(args.connection.password.as_deref(), Some("pw"));
    }

    #[test]
    fn unsupported_format_is_rejected() {
        assert!(parse(&["backup", "--dbname", "shop", "--format", "x"]).is_err());
    }

    #[test]
    fn dbname_is_required() {
        assert!(parse(&["backup", "--host", "h"]).is_err());
        assert!(parse(&["restore", "--backup-file", "x.sql"]).is_err());
    }

    #[test]
    fn restore_requires_backup_file() {
        assert!(parse(&["restore", "--dbname", "shop"]).is_err());
    }

    #[test]
    fn password_conflicts_with_no_password() {
        assert!(
            parse(&["backup", "--dbname", "shop", "--password", "pw", "--no-password"]).is_err()
        );
    }

    #[test]
    fn global_log_options_work_after_subcommand() {
        let cli = parse(&[
            "restore",
            "--dbname",
            "shop",
            "--backup-file",
            "x.sql",
            "--log-level",
            "DEBUG",
            "--log-file",
            "/tmp/x.log",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/x.log")));
    }

    #[test]
    fn config_defaults_to_local_file() {
        let cli = parse(&["init"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("pgkeeper.toml"));
        assert!(matches!(cli.command, Some(Subcommand::Init)));
    }
}
