//! Process execution utilities
//!
//! Thin wrappers over `std::process::Command` used to drive `./gradlew`
//! and `apksigner`. Arguments are passed as a vector so secrets never go
//! through a shell.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code of the command
    pub exit_code: i32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandResult {
    /// Create from std::process::Output
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Run a command in a specific directory and capture its output
pub fn run_command_in_dir<S: AsRef<str>>(program: &str, args: &[S], dir: &Path) -> Result<CommandResult> {
    run_command_with_env(program, args, &[], dir)
}

/// Run a command in a directory with extra environment variables.
///
/// Variable values are not logged.
pub fn run_command_with_env<S: AsRef<str>>(
    program: &str,
    args: &[S],
    env: &[(String, String)],
    dir: &Path,
) -> Result<CommandResult> {
    debug!(
        program,
        dir = %dir.display(),
        argc = args.len(),
        env = ?env.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
        "Running command"
    );

    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(AsRef::as_ref))
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    for (key, value) in env {
        cmd.env(key, value);
    }

    let output = cmd
        .output()
        .map_err(|e| Error::process(format!("Failed to execute {}: {}", program, e)).with_source(e))?;

    Ok(CommandResult::from_output(output))
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which_command(program).is_some()
}

/// Get the path to a command
pub fn which_command(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
