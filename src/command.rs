//! Command construction for `pg_dump`, `pg_restore` and `psql`.
//!
//! This module *decides* what to run; it never runs anything.  Process
//! execution lives in [`crate::process`], so every function here can be unit
//! tested without a PostgreSQL client installed.
//!
//! # Secrets
//!
//! The database password only ever travels in [`CommandSpec::env`] under
//! [`PASSWORD_ENV`], never in the argument vector, so it does not show up in
//! `ps` output.  Both `Display` and `Debug` for [`CommandSpec`] redact
//! environment values, which makes it safe to log a spec verbatim.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::Result,
    request::{BackupRequest, Connection, DumpFormat, PasswordSource, RestoreRequest},
};

/// Environment variable libpq reads the password from.
pub const PASSWORD_ENV: &str = "PGPASSWORD";

// ─── Tools ────────────────────────────────────────────────────────────────────

/// The external utilities this crate knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    PgDump,
    PgRestore,
    Psql,
}

impl Tool {
    /// Conventional executable name, looked up on `PATH`.
    pub const fn binary(self) -> &'static str {
        match self {
            Self::PgDump => "pg_dump",
            Self::PgRestore => "pg_restore",
            Self::Psql => "psql",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Program to execute for each [`Tool`].
///
/// Defaults to the bare names so the search path decides; the `[tools]`
/// config section can pin a specific PostgreSQL version's binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolPaths {
    pub pg_dump: String,
    pub pg_restore: String,
    pub psql: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            pg_dump: Tool::PgDump.binary().into(),
            pg_restore: Tool::PgRestore.binary().into(),
            psql: Tool::Psql.binary().into(),
        }
    }
}

impl ToolPaths {
    pub fn program(&self, tool: Tool) -> &str {
        match tool {
            Tool::PgDump => &self.pg_dump,
            Tool::PgRestore => &self.pg_restore,
            Tool::Psql => &self.psql,
        }
    }
}

// ─── Password prompt capability ───────────────────────────────────────────────

/// Reads a password from the user without echoing it.
///
/// The CLI passes [`crate::ui::TerminalPrompt`]; tests pass stubs.
pub trait PasswordPrompt {
    fn read_password(&self, prompt: &str) -> Result<String>;
}

// ─── Command spec ─────────────────────────────────────────────────────────────

/// A fully decided invocation: program, ordered arguments and extra
/// environment.  The child also inherits the parent's environment.
///
/// Arguments are `OsString`s so paths reach the child byte for byte, even
/// when they are not valid UTF-8.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub tool: Tool,
    pub program: String,
    pub args: Vec<OsString>,
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    fn new(tool: Tool, tools: &ToolPaths) -> Self {
        Self {
            tool,
            program: tools.program(tool).to_owned(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }
}

/// `program arg1 arg2 …` — environment values are never shown.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in self.env.keys() {
            write!(f, "{key}=*** ")?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env: Vec<&str> = self.env.keys().map(String::as_str).collect();
        f.debug_struct("CommandSpec")
            .field("tool", &self.tool)
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &env)
            .finish()
    }
}

/// A `pg_dump` invocation plus the file or directory it will write.
#[derive(Debug, Clone)]
pub struct BackupPlan {
    pub target: PathBuf,
    pub command: CommandSpec,
}

// ─── Builder ──────────────────────────────────────────────────────────────────

/// Turns requests into [`CommandSpec`]s.
///
/// Holds the tool paths and the prompt capability for one invocation.
pub struct CommandBuilder<'a> {
    tools: &'a ToolPaths,
    prompt: &'a dyn PasswordPrompt,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(tools: &'a ToolPaths, prompt: &'a dyn PasswordPrompt) -> Self {
        Self { tools, prompt }
    }

    /// Build the `pg_dump` command for `req`, naming the artifact after `now`.
    ///
    /// ```text
    /// pg_dump --host H --port P --username U --format=X [-b] --verbose
    ///         [--no-password] --file <dir>/backup_<db>_<ts><ext> --dbname <db>
    /// ```
    pub fn backup(&self, req: &BackupRequest, now: DateTime<Utc>) -> Result<BackupPlan> {
        let target = backup_target(&req.backup_dir, &req.connection.dbname, req.format, now);

        let mut cmd = CommandSpec::new(Tool::PgDump, self.tools);
        connection_args(&mut cmd, &req.connection);
        cmd.arg(format!("--format={}", req.format.code()));
        if req.format.includes_large_objects() {
            cmd.arg("-b");
        }
        cmd.arg("--verbose");
        self.apply_password(&mut cmd, &req.password, &req.connection)?;
        cmd.arg("--file")
            .arg(target.as_os_str())
            .arg("--dbname")
            .arg(req.connection.dbname.as_str());

        Ok(BackupPlan {
            target,
            command: cmd,
        })
    }

    /// Build the restore command for `req`.
    ///
    /// ```text
    /// psql       --host H --port P --username U --dbname D [--no-password] --file F   # *.sql
    /// pg_restore --host H --port P --username U --dbname D --verbose [--no-password] F
    /// ```
    pub fn restore(&self, req: &RestoreRequest) -> Result<CommandSpec> {
        let tool = restore_tool(&req.backup_file);
        let file = req.backup_file.as_os_str();

        let mut cmd = CommandSpec::new(tool, self.tools);
        connection_args(&mut cmd, &req.connection);
        cmd.arg("--dbname").arg(req.connection.dbname.as_str());
        match tool {
            Tool::Psql => {
                self.apply_password(&mut cmd, &req.password, &req.connection)?;
                cmd.arg("--file").arg(file);
            },
            Tool::PgRestore | Tool::PgDump => {
                cmd.arg("--verbose");
                self.apply_password(&mut cmd, &req.password, &req.connection)?;
                cmd.arg(file);
            },
        }
        Ok(cmd)
    }

    /// Resolve the password and attach it to `cmd`'s environment.
    ///
    /// An empty password sets nothing, leaving libpq to `.pgpass` or its own
    /// prompt.  [`PasswordSource::Skip`] also forwards `--no-password`.
    fn apply_password(
        &self,
        cmd: &mut CommandSpec,
        source: &PasswordSource,
        conn: &Connection,
    ) -> Result<()> {
        let password = match source {
            PasswordSource::Given(pw) => pw.clone(),
            PasswordSource::Prompt => self.prompt.read_password(&format!(
                "Password for {}@{}:{}: ",
                conn.username, conn.host, conn.port
            ))?,
            PasswordSource::Skip => {
                cmd.arg("--no-password");
                return Ok(());
            },
        };
        if !password.is_empty() {
            cmd.env.insert(PASSWORD_ENV.into(), password);
        }
        Ok(())
    }
}

/// `--host H --port P --username U`, shared by all three tools.
fn connection_args(cmd: &mut CommandSpec, conn: &Connection) {
    cmd.arg("--host")
        .arg(conn.host.as_str())
        .arg("--port")
        .arg(conn.port.to_string())
        .arg("--username")
        .arg(conn.username.as_str());
}

// ─── Pure helpers ─────────────────────────────────────────────────────────────

/// `backup_<dbname>_<YYYYMMDD_HHMMSS><ext>`.
///
/// Path separators in `dbname` are replaced so the artifact always lands
/// directly inside the backup directory.
pub fn backup_file_name(dbname: &str, format: DumpFormat, now: DateTime<Utc>) -> String {
    let safe: String = dbname
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!(
        "backup_{safe}_{}{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension().unwrap_or_default()
    )
}

/// Full path of the artifact `pg_dump` will write.
pub fn backup_target(dir: &Path, dbname: &str, format: DumpFormat, now: DateTime<Utc>) -> PathBuf {
    dir.join(backup_file_name(dbname, format, now))
}

/// `psql` for plain SQL scripts, `pg_restore` for everything else.
///
/// Only the file name decides; the file is not opened.
pub fn restore_tool(backup_file: &Path) -> Tool {
    let is_sql = backup_file
        .file_name()
        .is_some_and(|n| n.as_encoded_bytes().ends_with(b".sql"));
    if is_sql { Tool::Psql } else { Tool::PgRestore }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
