//! `pgkeeper restore` — one `pg_restore` or `psql` run.

use tracing::info;

use crate::{
    cli::RestoreArgs,
    command::{CommandBuilder, PasswordPrompt},
    config::Config,
    error::{Error, Result},
    process,
    request::RestoreRequest,
};

/// Assemble the request from flags, falling back to the config file.
pub fn request(args: &RestoreArgs, cfg: &Config) -> Result<RestoreRequest> {
    Ok(RestoreRequest {
        connection: super::connection(&args.connection, cfg)?,
        backup_file: args.backup_file.clone(),
        password: super::password(&args.connection),
    })
}

/// Restore `req.backup_file` into `req.connection.dbname`.
///
/// The file must exist; it is checked before anything is spawned.
pub fn run(req: &RestoreRequest, cfg: &Config, prompt: &dyn PasswordPrompt) -> Result<()> {
    if !req.backup_file.exists() {
        return Err(Error::io(
            format!("backup file {}", req.backup_file.display()),
            std::io::ErrorKind::NotFound.into(),
        ));
    }

    let cmd = CommandBuilder::new(&cfg.tools, prompt).restore(req)?;
    info!(
        host = %req.connection.host,
        port = req.connection.port,
        dbname = %req.connection.dbname,
        file = %req.backup_file.display(),
        tool = %cmd.tool,
        "starting restore"
    );

    process::run(&cmd)?;

    info!(dbname = %req.connection.dbname, "restore completed");
    Ok(())
}
