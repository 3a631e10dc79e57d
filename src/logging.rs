//! Logging setup.
//!
//! Stdout carries rendered results and stderr carries input prompts, so logs
//! go to a file unless `--log-stderr` is given. `RUST_LOG` overrides the
//! default directives.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

impl LogTarget {
    /// Picks the target from the command-line flags. Without either flag the
    /// platform log file is used.
    pub fn from_flags(log_stderr: bool, log_file: Option<PathBuf>) -> Self {
        match (log_stderr, log_file) {
            (true, _) => Self::Stderr,
            (false, Some(path)) => Self::File(path),
            (false, None) => Self::File(default_log_path()),
        }
    }
}

/// Installs the global subscriber. A log file that cannot be opened leaves
/// logging off and prints a warning.
pub fn init(target: &LogTarget, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
        LogTarget::File(path) => match open_log_file(path) {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init(),
            Err(e) => eprintln!("Warning: Could not open log file {}: {e}", path.display()),
        },
    }
}

/// Filter used when `RUST_LOG` is unset. Third-party crates stay at warn.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,db_questionnaire=debug,questionnaire=debug"
    } else {
        "warn,db_questionnaire=info,questionnaire=info"
    }
}

// Truncated on every run.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}

/// `<state dir>/db-questionnaire/questionnaire.log`, falling back to the
/// config dir and then the temp dir.
pub fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("db-questionnaire"))
        .unwrap_or_else(std::env::temp_dir)
        .join("questionnaire.log")
}
