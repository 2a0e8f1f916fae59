//! `pgkeeper backup` — one `pg_dump` run.
//!
//! 1. Build the command (prompting for the password if needed).
//! 2. Ensure the backup directory exists.
//! 3. Run `pg_dump` with the terminal attached.
//! 4. On failure, remove whatever partial artifact was left behind.

use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use crate::{
    cli::BackupArgs,
    command::{CommandBuilder, PasswordPrompt},
    config::Config,
    error::{Error, Result},
    process,
    request::BackupRequest,
};

/// Assemble the request from flags, falling back to the config file.
pub fn request(args: &BackupArgs, cfg: &Config) -> Result<BackupRequest> {
    Ok(BackupRequest {
        connection: super::connection(&args.connection, cfg)?,
        backup_dir: args
            .backup_dir
            .clone()
            .unwrap_or_else(|| cfg.backup.dir.clone()),
        format: args.format.unwrap_or(cfg.backup.format),
        password: super::password(&args.connection),
    })
}

/// Run the backup and return the path of the artifact that was written.
pub fn run(req: &BackupRequest, cfg: &Config, prompt: &dyn PasswordPrompt) -> Result<PathBuf> {
    info!(
        host = %req.connection.host,
        port = req.connection.port,
        dbname = %req.connection.dbname,
        format = %req.format,
        "starting backup"
    );

    let plan = CommandBuilder::new(&cfg.tools, prompt).backup(req, Utc::now())?;

    process::ensure_dir(&req.backup_dir)?;

    if plan.target.exists() {
        return Err(Error::io(
            format!("refusing to overwrite {}", plan.target.display()),
            std::io::ErrorKind::AlreadyExists.into(),
        ));
    }

    if let Err(e) = process::run(&plan.command) {
        process::discard_partial(&plan.target);
        return Err(e);
    }

    info!(path = %plan.target.display(), "backup completed");
    Ok(plan.target)
}
