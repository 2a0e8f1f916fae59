//! Process execution — runs one [`CommandSpec`] and reports how it ended.
//!
//! Unlike a captured run, the child inherits stdin, stdout and stderr so the
//! utility's own progress output (`--verbose`) and any libpq password prompt
//! reach the terminal directly.  There is no timeout and no retry; the call
//! blocks until the child exits.
//!
//! Failures are returned, not logged at error level: the caller records each
//! failed invocation exactly once, with the command line carried in the error.

use std::{
    fs,
    io::ErrorKind,
    path::Path,
    process::{Command, ExitStatus},
};

use tracing::{debug, info, warn};

use crate::{
    command::CommandSpec,
    error::{Error, Result},
};

/// Create `dir` (and its parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::io(format!("creating backup directory {}", dir.display()), e))?;
    info!(dir = %dir.display(), "backup directory ensured");
    Ok(())
}

/// Spawn `spec`, wait for it, and translate the exit status.
pub fn run(spec: &CommandSpec) -> Result<()> {
    debug!(command = %spec, "running command");

    let status = Command::new(&spec.program)
        .args(&spec.args)
        .envs(&spec.env)
        .status()
        .map_err(|e| spawn_error(spec, e))?;

    check_status(spec, status)
}

fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> Error {
    debug!(tool = %spec.tool, error = %source, "spawn failed");
    if source.kind() == ErrorKind::NotFound {
        Error::ToolNotFound {
            tool: spec.tool,
            program: spec.program.clone(),
            command: spec.to_string(),
            source,
        }
    } else {
        Error::io(format!("starting {}", spec.program), source)
    }
}

fn check_status(spec: &CommandSpec, status: ExitStatus) -> Result<()> {
    if status.success() {
        debug!(tool = %spec.tool, "command exited successfully");
        return Ok(());
    }
    let code = status.code();
    debug!(tool = %spec.tool, ?code, "command exited unsuccessfully");
    Err(Error::ExecutionFailure {
        tool: spec.tool,
        code,
        command: spec.to_string(),
    })
}

/// Remove whatever a failed run left at `target`.
///
/// Removal problems are logged and otherwise ignored: the original failure is
/// what the caller reports.
pub fn discard_partial(target: &Path) {
    let result = match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(target),
        Ok(_) => fs::remove_file(target),
        Err(e) if e.kind() == ErrorKind::NotFound => return,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => info!(path = %target.display(), "removed partial backup"),
        Err(e) => warn!(path = %target.display(), error = %e, "could not remove partial backup"),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
