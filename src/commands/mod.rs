//! Subcommand handlers.
//!
//! Each file in this module corresponds to one user-facing command:
//!
//! | File          | Invocation          | Description                        |
//! |---------------|---------------------|------------------------------------|
//! | `backup.rs`   | `pgkeeper backup`   | `pg_dump` into a timestamped file  |
//! | `restore.rs`  | `pgkeeper restore`  | `pg_restore` or `psql` from a file |
//! | `init.rs`     | `pgkeeper init`     | Scaffold a `pgkeeper.toml`         |

pub mod backup;
pub mod init;
pub mod restore;

use crate::{
    cli::ConnectionArgs,
    config::Config,
    error::Result,
    request::{Connection, PasswordSource},
};

/// Merge the connection flags with the `[connection]` config section.
fn connection(args: &ConnectionArgs, cfg: &Config) -> Result<Connection> {
    Connection::new(
        args.host.clone().or_else(|| cfg.connection.host.clone()),
        args.port.unwrap_or(cfg.connection.port),
        args.username
            .clone()
            .or_else(|| cfg.connection.username.clone()),
        args.dbname.clone(),
    )
}

fn password(args: &ConnectionArgs) -> PasswordSource {
    PasswordSource::from_flags(args.password.clone(), args.no_password)
}
