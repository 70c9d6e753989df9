//! Process replacement.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::DispatchError;

/// The program and arguments the shim hands over to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to run; a bare name is looked up on `PATH` by the OS.
    pub program: OsString,
    /// Arguments after the program name.
    pub args: Vec<OsString>,
    /// Directory to put in front of `PATH` for the new process.
    pub path_prefix: Option<PathBuf>,
    /// Directory to put in front of `PYTHONPATH` for the new process.
    pub python_path_prefix: Option<PathBuf>,
}

impl Invocation {
    /// Run `program` with `args` unchanged.
    pub fn new<I, S>(program: &OsStr, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.to_os_string(),
            args: args.into_iter().map(Into::into).collect(),
            path_prefix: None,
            python_path_prefix: None,
        }
    }

    /// Put `dir` in front of `PATH` for the new process.
    pub fn with_path_prefix(mut self, dir: Option<PathBuf>) -> Self {
        self.path_prefix = dir;
        self
    }

    /// Put `dir` in front of `PYTHONPATH` for the new process.
    pub fn with_python_path_prefix(mut self, dir: Option<PathBuf>) -> Self {
        self.python_path_prefix = dir;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (var, prefix) in [
            ("PATH", &self.path_prefix),
            ("PYTHONPATH", &self.python_path_prefix),
        ] {
            let Some(dir) = prefix else { continue };
            if let Some(value) = prepend_to_path(std::env::var_os(var), dir) {
                cmd.env(var, value);
            }
        }
        cmd
    }

    /// Replace the current process with the invocation.
    ///
    /// Only returns if the replacement could not happen.
    #[cfg(unix)]
    pub fn exec(self) -> DispatchError {
        use std::os::unix::process::CommandExt;

        tracing::debug!("exec {:?} {:?}", self.program, self.args);
        let source = self.command().exec();
        DispatchError::ExecFailed {
            program: self.program.to_string_lossy().to_string(),
            source,
        }
    }

    /// Run the invocation and exit with its status.
    #[cfg(not(unix))]
    pub fn exec(self) -> DispatchError {
        match self.command().status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(source) => DispatchError::ExecFailed {
                program: self.program.to_string_lossy().to_string(),
                source,
            },
        }
    }
}

/// `dir` followed by the entries of a search-path variable's value.
pub fn prepend_to_path(path: Option<OsString>, dir: &Path) -> Option<OsString> {
    let mut entries = vec![dir.to_path_buf()];
    if let Some(path) = path.filter(|p| !p.is_empty()) {
        entries.extend(std::env::split_paths(&path));
    }
    match std::env::join_paths(entries) {
        Ok(joined) => Some(joined),
        Err(e) => {
            tracing::warn!("cannot add {} to PATH: {}", dir.display(), e);
            None
        }
    }
}
