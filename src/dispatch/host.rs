//! The dispatcher's view of the outside world.
//!
//! Everything that touches the backend, the filesystem search path, or the
//! repository goes through [`Host`], so the planning logic can be exercised
//! against a fake.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::config::ConfigMap;
use crate::error::Result;
use crate::locator;
use crate::redirect::{GitRepoProbe, RepoProbe};
use crate::shell::execute_checked;

/// Environment variable pinning the primary backend program.
pub const PRIMARY_ENV: &str = "GIT_DISPATCH_GIT";

/// Primary backend program when none is pinned.
pub const DEFAULT_PRIMARY: &str = "git";

/// External collaborators of the dispatcher.
pub trait Host {
    /// Program that runs the primary backend.
    fn primary(&self) -> &OsStr;

    /// Directory holding the backend's built-in command executables.
    fn exec_path(&self) -> Result<PathBuf>;

    /// The backend's configuration listing.
    fn config(&self) -> Result<ConfigMap>;

    /// Search for an executable by name.
    fn find_executable(&self, name: &str) -> Option<PathBuf>;

    /// Probe for the current repository.
    fn repo_probe<'a>(
        &'a self,
        bridge: Option<PathBuf>,
        marker: &str,
        config: &'a ConfigMap,
    ) -> Box<dyn RepoProbe + 'a>;
}

/// Host backed by the real backend, `PATH`, and current directory.
#[derive(Debug, Clone)]
pub struct SystemHost {
    git: OsString,
}

impl SystemHost {
    /// Host running `git` as the primary backend.
    pub fn new(git: impl Into<OsString>) -> Self {
        Self { git: git.into() }
    }

    /// Host whose primary backend comes from `GIT_DISPATCH_GIT`, or `git`.
    pub fn from_env() -> Self {
        let git = std::env::var_os(PRIMARY_ENV)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| OsString::from(DEFAULT_PRIMARY));
        Self::new(git)
    }
}

impl Host for SystemHost {
    fn primary(&self) -> &OsStr {
        &self.git
    }

    fn exec_path(&self) -> Result<PathBuf> {
        let stdout = execute_checked(&self.git, &["--exec-path"])?;
        stdout
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} --exec-path printed no directory",
                    self.git.to_string_lossy()
                )
                .into()
            })
    }

    fn config(&self) -> Result<ConfigMap> {
        let listing = execute_checked(&self.git, &["var", "-l"])?;
        let config = ConfigMap::parse(&listing);
        tracing::debug!("read {} configuration entries", config.len());
        Ok(config)
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        locator::find(name)
    }

    fn repo_probe<'a>(
        &'a self,
        bridge: Option<PathBuf>,
        marker: &str,
        config: &'a ConfigMap,
    ) -> Box<dyn RepoProbe + 'a> {
        Box::new(GitRepoProbe::new(&self.git, bridge, marker, config))
    }
}
