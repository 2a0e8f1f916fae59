//! Terminal interaction — the secure password prompt and outcome lines.
//!
//! While a utility runs it owns the terminal, so there is no spinner here.
//! What this module prints is the one-line verdict afterwards:
//!
//! ```text
//!   ✓  Backup completed: ./backups/backup_shop_20240501_120000.dump
//!   ✗  Restore failed
//!
//!   Error: pg_restore exited with status 1
//! ```

use console::{Term, style};

use crate::{
    command::PasswordPrompt,
    error::{Error, Result},
};

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Green ✓  — printed when the operation succeeds.
fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
/// Red ✗    — printed when it fails.
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// Print the success line to stdout.
pub fn print_success(message: &str) {
    println!("  {}  {}", icon_ok(), style(message).bold());
}

/// Print the failure line and the error (with its causes) to stderr.
pub fn print_failure(label: &str, error: &dyn std::error::Error) {
    eprintln!("  {}  {}", icon_err(), style(label).bold());
    eprintln!();
    eprintln!("  {} {}", style("Error:").red().bold(), error);
    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("    {} {cause}", style("caused by:").dim());
        source = cause.source();
    }
}

// ─── Password prompt ──────────────────────────────────────────────────────────

/// Reads the password from the controlling terminal with echo off.
///
/// The prompt goes to stderr when that is a terminal so stdout stays clean
/// for scripting; with stderr redirected (`2>err.log`) it falls back to
/// stdout.  Only when neither is a terminal does prompting fail.
pub struct TerminalPrompt {
    term: Option<Term>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            term: prompt_term([Term::stderr(), Term::stdout()]),
        }
    }
}

/// The first candidate attached to a terminal.
fn prompt_term(candidates: impl IntoIterator<Item = Term>) -> Option<Term> {
    candidates.into_iter().find(Term::is_term)
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordPrompt for TerminalPrompt {
    fn read_password(&self, prompt: &str) -> Result<String> {
        let Some(term) = &self.term else {
            return Err(Error::InputValidation(
                "no password given and neither stderr nor stdout is a terminal \
                 to prompt on; pass --password or --no-password"
                    .into(),
            ));
        };
        term.write_str(prompt)
            .map_err(|e| Error::io("writing password prompt", e))?;
        term.read_secure_line()
            .map_err(|e| Error::io("reading password from terminal", e))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_helpers_do_not_panic() {
        // Smoke test: rendering must work without a terminal attached.
        print_success("Backup completed: ./backups/x.dump");
        let err = Error::ExecutionFailure {
            tool: crate::command::Tool::PgDump,
            code: Some(1),
            command: "pg_dump shop".into(),
        };
        print_failure("Backup failed", &err);
    }

    #[test]
    fn prompt_without_any_terminal_is_input_error() {
        let prompt = TerminalPrompt { term: None };
        let err = prompt.read_password("Password: ").unwrap_err();
        assert!(
            matches!(err, Error::InputValidation(ref m) if m.contains("--no-password")),
            "{err:?}"
        );
    }

    #[test]
    fn prompt_term_skips_candidates_that_are_not_terminals() {
        // Under the test harness both streams are pipes.
        let (stderr, stdout) = (Term::stderr(), Term::stdout());
        let expected = stderr.is_term() || stdout.is_term();
        assert_eq!(prompt_term([stderr, stdout]).is_some(), expected);
        assert!(prompt_term(std::iter::empty()).is_none());
    }
}
