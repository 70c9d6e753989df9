//! Repository state probing for bridge redirects.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{ConfigMap, REMOTE_PREFIX};
use crate::error::Result;
use crate::shell::{execute, CommandOptions};

/// Questions the redirector asks about the current repository.
pub trait RepoProbe {
    /// Whether the bridge helper can be run.
    fn bridge_usable(&self) -> Result<bool>;

    /// Whether the current repository is managed by the bridge.
    fn is_bridge_repository(&self) -> Result<bool>;

    /// Names of the configured remotes.
    fn remotes(&self) -> Result<Vec<String>>;
}

/// Probe backed by the primary backend and its configuration.
pub struct GitRepoProbe<'a> {
    git: OsString,
    bridge: Option<PathBuf>,
    marker: String,
    config: &'a ConfigMap,
    cwd: Option<PathBuf>,
}

impl<'a> GitRepoProbe<'a> {
    /// Create a probe.
    ///
    /// `bridge` is the located bridge helper, if it was found.
    pub fn new(git: &OsStr, bridge: Option<PathBuf>, marker: &str, config: &'a ConfigMap) -> Self {
        Self {
            git: git.to_os_string(),
            bridge,
            marker: marker.to_string(),
            config,
            cwd: None,
        }
    }

    /// Probe the repository at `dir` instead of the current directory.
    pub fn in_dir(mut self, dir: PathBuf) -> Self {
        self.cwd = Some(dir);
        self
    }

    fn git_dir(&self) -> Result<Option<PathBuf>> {
        let options = CommandOptions {
            cwd: self.cwd.clone(),
        };
        let result = execute(&self.git, &["rev-parse", "--git-dir"], &options)?;
        if !result.success {
            return Ok(None);
        }
        let Some(line) = result.first_line() else {
            return Ok(None);
        };
        let dir = PathBuf::from(line);
        Ok(Some(match &self.cwd {
            Some(cwd) if dir.is_relative() => cwd.join(dir),
            _ => dir,
        }))
    }
}

impl RepoProbe for GitRepoProbe<'_> {
    fn bridge_usable(&self) -> Result<bool> {
        Ok(self.bridge.as_ref().is_some_and(|p| p.exists()))
    }

    fn is_bridge_repository(&self) -> Result<bool> {
        Ok(self
            .git_dir()?
            .is_some_and(|dir| dir.join(&self.marker).exists()))
    }

    fn remotes(&self) -> Result<Vec<String>> {
        Ok(remote_names(self.config))
    }
}

/// `<name>.<key>` after the `remote.` prefix; the name may contain dots.
static REMOTE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)\.[^.]+$").expect("REMOTE_KEY must compile")
});

/// Remote names declared by `remote.<name>.<key>` settings.
pub fn remote_names(config: &ConfigMap) -> Vec<String> {
    let mut names: Vec<String> = config
        .with_prefix(REMOTE_PREFIX)
        .filter_map(|(rest, _)| REMOTE_KEY.captures(rest))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect();
    names.sort();
    names.dedup();
    names
}
