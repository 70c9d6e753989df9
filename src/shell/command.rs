//! Backend query execution.
//!
//! Queries run the backend directly (no shell) with both pipes captured.
//! `Command::output` drains stdout and stderr and waits for the child, so a
//! [`CommandResult`] is only produced once the process is gone.

use crate::error::{DispatchError, Result};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing a backend query.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// First line of stdout, trimmed.
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().next().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Options for query execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,
}

/// Run `program` with `args` and capture its output.
///
/// Fails only if the process could not be started; a non-zero exit is
/// reported through [`CommandResult::success`].
pub fn execute<S: AsRef<OsStr>>(
    program: &OsStr,
    args: &[S],
    options: &CommandOptions,
) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    cmd.stdin(Stdio::null());

    let output = cmd.output().map_err(|_| DispatchError::CommandFailed {
        command: describe(program, args),
        code: None,
    })?;

    Ok(CommandResult {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration: start.elapsed(),
        success: output.status.success(),
    })
}

/// Run a query that must succeed, returning its stdout.
pub fn execute_checked<S: AsRef<OsStr>>(program: &OsStr, args: &[S]) -> Result<String> {
    let result = execute(program, args, &CommandOptions::default())?;
    tracing::debug!(
        "{} exited with {:?} after {:?}",
        describe(program, args),
        result.exit_code,
        result.duration
    );
    if result.success {
        Ok(result.stdout)
    } else {
        if !result.stderr.trim().is_empty() {
            tracing::warn!("{}: {}", describe(program, args), result.stderr.trim());
        }
        Err(DispatchError::CommandFailed {
            command: describe(program, args),
            code: result.exit_code,
        })
    }
}

fn describe<S: AsRef<OsStr>>(program: &OsStr, args: &[S]) -> String {
    let mut parts = vec![program.to_string_lossy().to_string()];
    parts.extend(args.iter().map(|a| a.as_ref().to_string_lossy().to_string()));
    parts.join(" ")
}
