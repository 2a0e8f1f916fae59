//! Error taxonomy for a single backup or restore invocation.
//!
//! Every failure is terminal: nothing here is retried.  `main` logs the error
//! with context, prints it to stderr and exits non-zero.
//!
//! `Display` shows only the top-level message; underlying OS errors are
//! reachable through `source()` and rendered once by [`Error::report`] or the
//! cause chain in `ui::print_failure`.

use std::{error::Error as _, io};

use thiserror::Error;

use crate::command::Tool;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The utility could not be spawned because it is not on `PATH` (or the
    /// configured path does not exist).
    #[error("`{program}` ({tool}) was not found; is the PostgreSQL client installed and on PATH?")]
    ToolNotFound {
        tool: Tool,
        program: String,
        /// The redacted command line that was attempted.
        command: String,
        #[source]
        source: io::Error,
    },

    /// The utility ran but exited non-zero.  `code` is `None` when the child
    /// was terminated by a signal.
    #[error("{tool} {}", describe_exit(.code))]
    ExecutionFailure {
        tool: Tool,
        code: Option<i32>,
        /// The redacted command line that was attempted.
        command: String,
    },

    /// Filesystem or terminal I/O failed before or around the invocation.
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The request is incomplete or cannot be satisfied as given.
    #[error("invalid input: {0}")]
    InputValidation(String),
}

impl Error {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Short, stable name of the error class, used as a structured log field.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::ExecutionFailure { .. } => "execution_failure",
            Self::Io { .. } => "io",
            Self::InputValidation(_) => "input_validation",
        }
    }

    /// The command line behind a spawn or exit failure, secrets redacted.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::ToolNotFound { command, .. } | Self::ExecutionFailure { command, .. } => {
                Some(command)
            },
            Self::Io { .. } | Self::InputValidation(_) => None,
        }
    }

    /// The message followed by every cause, `": "`-separated, for one-line
    /// log records.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".into(),
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn execution_failure_names_tool_and_code() {
        let err = Error::ExecutionFailure {
            tool: Tool::PgDump,
            code: Some(1),
            command: "pg_dump --format=c shop".into(),
        };
        assert_eq!(err.to_string(), "pg_dump exited with status 1");
        assert_eq!(err.command(), Some("pg_dump --format=c shop"));
    }

    #[test]
    fn execution_failure_without_code_mentions_signal() {
        let err = Error::ExecutionFailure {
            tool: Tool::PgRestore,
            code: None,
            command: "pg_restore x.dump".into(),
        };
        assert_eq!(err.to_string(), "pg_restore was terminated by a signal");
    }

    #[test]
    fn io_error_displays_context_and_keeps_cause_as_source() {
        let err = Error::io(
            "creating backup directory ./backups",
            io::Error::other("read-only file system"),
        );
        assert_eq!(err.to_string(), "creating backup directory ./backups");
        assert_eq!(err.source().unwrap().to_string(), "read-only file system");
        assert_eq!(err.kind(), "io");
        assert_eq!(err.command(), None);
    }

    #[test]
    fn report_mentions_each_cause_once() {
        let err = Error::io(
            "creating backup directory ./backups",
            io::Error::other("read-only file system"),
        );
        let report = err.report();
        assert_eq!(report, "creating backup directory ./backups: read-only file system");
        assert_eq!(report.matches("read-only file system").count(), 1);
    }

    #[test]
    fn tool_not_found_mentions_program() {
        let err = Error::ToolNotFound {
            tool: Tool::Psql,
            program: "/opt/pg/bin/psql".into(),
            command: "/opt/pg/bin/psql --file x.sql".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/opt/pg/bin/psql"));
        assert_eq!(err.kind(), "tool_not_found");
    }
}
