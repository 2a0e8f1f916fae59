//! `pgkeeper init` — scaffold a starter `pgkeeper.toml`.
//!
//! The generated file sets only what can be guessed (the local user name);
//! everything else is present but commented out, so it documents the format
//! without overriding any defaults.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};

use crate::{config::DEFAULT_BACKUP_DIR, logging::DEFAULT_LOG_FILE, ui};

/// Write the starter config to `path`, refusing to overwrite.
pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        bail!(
            "{} already exists; refusing to overwrite it",
            path.display()
        );
    }
    fs::write(path, template(&effective_user()))
        .with_context(|| format!("writing {}", path.display()))?;
    ui::print_success(&format!("Created {}", path.display()));
    Ok(())
}

/// `$USER`, then `$LOGNAME`, then `postgres`.
fn effective_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "postgres".into())
}

fn template(user: &str) -> String {
    format!(
        r#"# pgkeeper configuration. Command-line flags override every value here.
# Passwords are never read from this file; use --password, the prompt,
# or ~/.pgpass with --no-password.

[connection]
# host     = "localhost"
# port     = 5432
username = "{user}"

[backup]
# dir    = "{DEFAULT_BACKUP_DIR}"
# format = "c"           # c (custom), d (directory), t (tar), p (plain)

[log]
# level = "info"         # debug, info, warning, error, critical
# file  = "{DEFAULT_LOG_FILE}"  # "" disables the log file

[tools]
# pg_dump    = "/usr/lib/postgresql/16/bin/pg_dump"
# pg_restore = "/usr/lib/postgresql/16/bin/pg_restore"
# psql       = "/usr/lib/postgresql/16/bin/psql"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PartialConfig};

    #[test]
    fn template_parses_and_only_sets_username() {
        let partial: PartialConfig = toml::from_str(&template("alice")).unwrap();
        let cfg = partial.resolve();
        assert_eq!(cfg.connection.username.as_deref(), Some("alice"));

        let mut expected = Config::default();
        expected.connection.username = Some("alice".into());
        assert_eq!(cfg, expected);
    }

    #[test]
    fn run_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgkeeper.toml");
        run(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[connection]"));
        assert!(text.contains("[tools]"));
    }

    #[test]
    fn run_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgkeeper.toml");
        fs::write(&path, "# existing").unwrap();
        let err = run(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# existing");
    }
}
