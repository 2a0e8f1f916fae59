//! `pgkeeper` — PostgreSQL backup and restore on top of the stock client tools.
//!
//! # Overview
//!
//! This binary is a thin orchestration layer around `pg_dump`, `pg_restore`
//! and `psql`.  It decides which utility to run and with which flags, hands
//! the password over through `PGPASSWORD`, runs the utility once with the
//! terminal attached, and logs the outcome.  The dump files themselves are
//! never opened.
//!
//! # Usage
//!
//! ```text
//! pgkeeper backup  --host localhost --username postgres --dbname shop
//! pgkeeper backup  --dbname shop --format d --backup-dir /var/backups/pg
//! pgkeeper restore --dbname shop --backup-file ./backups/backup_shop_20240501_120000.dump
//! pgkeeper init              # scaffold a pgkeeper.toml in the current directory
//! pgkeeper --print-config    # show the resolved config without running anything
//! ```
//!
//! # Module layout
//!
//! | Module                   | Responsibility                              |
//! |--------------------------|---------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap               |
//! | [`config`]               | Layered `pgkeeper.toml` loading             |
//! | [`request`]              | Backup / restore request values             |
//! | [`command`]              | Command builder (decides, never runs)       |
//! | [`process`]              | Process runner (runs, never decides)        |
//! | [`logging`]              | Scoped tracing subscriber                   |
//! | [`ui`]                   | Password prompt and outcome lines           |
//! | [`error`]                | Error taxonomy                              |
//! | [`commands`]             | `backup`, `restore` and `init` handlers     |

mod cli;
mod command;
mod commands;
mod config;
mod error;
mod logging;
mod process;
mod request;
mod ui;

use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::{Cli, Subcommand};
use command::PasswordPrompt;
use config::Config;
use logging::LogSettings;
use tracing::{error, info};
use ui::TerminalPrompt;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match &cli.command {
        // ── pgkeeper init ────────────────────────────────────────────────────
        Some(Subcommand::Init) => match commands::init::run(&cli.config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                ui::print_failure("Init failed", &*e);
                ExitCode::FAILURE
            },
        },

        // ── pgkeeper backup ──────────────────────────────────────────────────
        Some(Subcommand::Backup(args)) => execute(&cli, "Backup", |cfg, prompt| {
            let req = commands::backup::request(args, cfg)?;
            let path = commands::backup::run(&req, cfg, prompt)?;
            Ok(format!("Backup completed: {}", path.display()))
        }),

        // ── pgkeeper restore ─────────────────────────────────────────────────
        Some(Subcommand::Restore(args)) => execute(&cli, "Restore", |cfg, prompt| {
            let req = commands::restore::request(args, cfg)?;
            commands::restore::run(&req, cfg, prompt)?;
            Ok(format!("Restore completed: {}", req.backup_file.display()))
        }),

        // ── pgkeeper --print-config / bare invocation ────────────────────────
        None => {
            if cli.print_config {
                return with_config(&cli, print_config);
            }
            // Printing help cannot meaningfully fail; the exit code says enough.
            let _ = Cli::command().print_help();
            ExitCode::from(2)
        },
    }
}

/// Load the config, set up logging, run `op` once, and report the outcome.
fn execute(
    cli: &Cli,
    label: &str,
    op: impl FnOnce(&Config, &dyn PasswordPrompt) -> error::Result<String>,
) -> ExitCode {
    with_config(cli, |cfg| {
        if cli.print_config {
            return print_config(cfg);
        }

        let settings = LogSettings::new(
            cli.log_level.unwrap_or(cfg.log.level),
            cli.log_file.clone().or_else(|| cfg.log.file.clone()),
        );
        let _log = match logging::init(&settings) {
            Ok(guard) => guard,
            Err(e) => {
                ui::print_failure("Could not set up logging", &e);
                return ExitCode::FAILURE;
            },
        };
        info!(version = env!("CARGO_PKG_VERSION"), "starting pgkeeper");

        match op(cfg, &TerminalPrompt::new()) {
            Ok(message) => {
                ui::print_success(&message);
                ExitCode::SUCCESS
            },
            Err(e) => {
                error!(
                    kind = e.kind(),
                    command = e.command(),
                    error = %e.report(),
                    "{} failed",
                    label.to_lowercase()
                );
                ui::print_failure(&format!("{label} failed"), &e);
                ExitCode::FAILURE
            },
        }
    })
}

fn with_config(cli: &Cli, f: impl FnOnce(&Config) -> ExitCode) -> ExitCode {
    match load_config(cli) {
        Ok(cfg) => f(&cfg),
        Err(e) => {
            ui::print_failure("Invalid configuration", &*e);
            ExitCode::FAILURE
        },
    }
}

/// Merge `<config_dir>/pgkeeper/config.toml` with the local config file.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let global = config::global_config_path();
    config::load_merged(global.as_deref(), &cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))
}

fn print_config(cfg: &Config) -> ExitCode {
    match toml::to_string(cfg) {
        Ok(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            ui::print_failure("Could not render configuration", &e);
            ExitCode::FAILURE
        },
    }
}
