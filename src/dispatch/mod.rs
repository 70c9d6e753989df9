//! Command dispatching.
//!
//! This module ties the pieces together:
//! - [`Host`] for the backend, search path, and repository queries
//! - [`DispatchContext`] for the per-run configuration and catalog
//! - [`Dispatcher`] for turning raw arguments into an [`Invocation`]
//!
//! # Example
//!
//! ```no_run
//! use git_dispatch::dispatch::{Dispatcher, SystemHost};
//!
//! let host = SystemHost::from_env();
//! let argv = vec!["stat".to_string()];
//! let invocation = Dispatcher::new(&host).plan(&argv).unwrap();
//! let err = invocation.exec();
//! eprintln!("git-dispatch: {}", err);
//! ```

pub mod exec;
pub mod host;

pub use exec::{prepend_to_path, Invocation};
pub use host::{Host, SystemHost, DEFAULT_PRIMARY, PRIMARY_ENV};

use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::config::{Backend, ConfigMap};
use crate::defaults::inject;
use crate::error::Result;
use crate::locator::has_exec_bit;
use crate::redirect::{is_transfer_command, redirect, BridgeSpec};
use crate::resolve::{canonicalize, command_position, resolve};

/// First-token flag that turns off default injection.
pub const NO_DEFAULTS_FLAG: &str = "--nodefaults";

/// Executable name of the social-coding wrapper.
pub const HUB: &str = "hub";

/// Everything one run knows about its configuration.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub config: ConfigMap,
    pub extension_dir: PathBuf,
    pub catalog: Catalog,
    pub hub: Backend,
    pub bridge: Backend,
    pub bridge_spec: BridgeSpec,
    /// The bridge path came from configuration rather than a search.
    pub bridge_pinned: bool,
    /// Extra module directory the bridge helper needs.
    pub python_path: Option<PathBuf>,
}

impl DispatchContext {
    /// Build the context from the extension directory and configuration.
    pub fn new(extension_dir: PathBuf, config: ConfigMap, no_defaults: bool) -> Self {
        let catalog = Catalog::build(&extension_dir, &config);
        let catalog = if no_defaults {
            catalog.without_defaults()
        } else {
            catalog
        };
        let hub = Backend::from_setting(config.dispatch_setting("hub"));
        let bridge = Backend::from_setting(config.dispatch_setting("bridge"));
        let bridge_pinned = matches!(bridge, Backend::Located(_));
        let bridge_spec = BridgeSpec::from_config(&config);
        let python_path = config
            .dispatch_setting("pythonpath")
            .filter(|v| !v.is_off())
            .map(|v| PathBuf::from(v.to_string()))
            .filter(|p| !p.as_os_str().is_empty());

        Self {
            config,
            extension_dir,
            catalog,
            hub,
            bridge,
            bridge_spec,
            bridge_pinned,
            python_path,
        }
    }

    /// Directory of a pinned bridge helper, for the new process's `PATH`.
    ///
    /// A searched-for helper is already reachable, so only a pinned one
    /// contributes.
    pub fn bridge_dir(&self) -> Option<PathBuf> {
        if !self.bridge_pinned {
            return None;
        }
        self.bridge
            .path()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    /// Query the host for everything the context needs.
    pub fn load(host: &dyn Host, no_defaults: bool) -> Result<Self> {
        let extension_dir = host.exec_path()?;
        let config = host.config()?;
        Ok(Self::new(extension_dir, config, no_defaults))
    }
}

/// Turns a raw argument vector into the invocation to hand over to.
pub struct Dispatcher<'a> {
    host: &'a dyn Host,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher over `host`.
    pub fn new(host: &'a dyn Host) -> Self {
        Self { host }
    }

    /// Plan the invocation for `argv` (program name excluded).
    pub fn plan(&self, argv: &[String]) -> Result<Invocation> {
        let primary = self.host.primary();

        if argv.is_empty() {
            return Ok(Invocation::new(primary, Vec::<String>::new()));
        }

        let (no_defaults, args) = match argv.split_first() {
            Some((first, rest)) if first == NO_DEFAULTS_FLAG => (true, rest),
            _ => (false, argv),
        };

        if command_position(args).is_none() {
            tracing::debug!("no command token, passing through");
            return Ok(Invocation::new(primary, args.iter().cloned()));
        }

        let mut ctx = DispatchContext::load(self.host, no_defaults)?;

        let resolution = resolve(args, &ctx.catalog)?;
        let args = canonicalize(args, &resolution);

        ctx.hub.locate_with(|| self.host.find_executable(HUB));

        let (args, offset) = if is_transfer_command(&resolution.name) && !ctx.bridge.is_disabled()
        {
            let helper = ctx.bridge_spec.helper_name();
            let extension_dir = &ctx.extension_dir;
            ctx.bridge.locate_with(|| {
                self.host
                    .find_executable(&helper)
                    .or_else(|| find_extension(extension_dir, &helper))
            });

            let probe = self.host.repo_probe(
                ctx.bridge.path().map(Path::to_path_buf),
                &ctx.bridge_spec.marker,
                &ctx.config,
            );
            let outcome = redirect(
                &resolution.name,
                resolution.position,
                &args,
                &ctx.bridge,
                &ctx.bridge_spec,
                probe.as_ref(),
            );
            outcome.apply(&args)
        } else {
            (args, 0)
        };

        let args = inject(
            &args,
            &resolution.name,
            resolution.position,
            offset,
            &ctx.catalog,
        );

        let program = ctx.hub.path().map(Path::as_os_str).unwrap_or(primary);
        Ok(Invocation::new(program, args)
            .with_path_prefix(ctx.bridge_dir())
            .with_python_path_prefix(ctx.python_path.clone()))
    }
}

fn find_extension(extension_dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = extension_dir.join(name);
    has_exec_bit(&candidate).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DispatchError, Result};
    use crate::redirect::RepoProbe;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::ffi::{OsStr, OsString};
    use std::fs;
    use tempfile::TempDir;

    struct StaticProbe {
        managed: bool,
        remotes: Vec<String>,
        bridge: Option<PathBuf>,
    }

    impl RepoProbe for StaticProbe {
        fn bridge_usable(&self) -> Result<bool> {
            Ok(self.bridge.is_some())
        }

        fn is_bridge_repository(&self) -> Result<bool> {
            Ok(self.managed)
        }

        fn remotes(&self) -> Result<Vec<String>> {
            Ok(self.remotes.clone())
        }
    }

    struct FakeHost {
        exec_dir: TempDir,
        config: ConfigMap,
        executables: HashMap<String, PathBuf>,
        managed: bool,
        queries: Cell<usize>,
        searched: RefCell<Vec<String>>,
    }

    impl FakeHost {
        fn new(builtins: &[&str], config: &str) -> Self {
            let exec_dir = TempDir::new().unwrap();
            for name in builtins {
                let path = exec_dir.path().join(format!("git-{}", name));
                fs::write(&path, "#!/bin/sh\n").unwrap();
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
                }
            }
            Self {
                exec_dir,
                config: ConfigMap::parse(config),
                executables: HashMap::new(),
                managed: false,
                queries: Cell::new(0),
                searched: RefCell::new(Vec::new()),
            }
        }

        fn with_executable(mut self, name: &str, path: &str) -> Self {
            self.executables.insert(name.to_string(), PathBuf::from(path));
            self
        }

        fn managed(mut self) -> Self {
            self.managed = true;
            self
        }
    }

    impl Host for FakeHost {
        fn primary(&self) -> &OsStr {
            OsStr::new("git")
        }

        fn exec_path(&self) -> Result<PathBuf> {
            self.queries.set(self.queries.get() + 1);
            Ok(self.exec_dir.path().to_path_buf())
        }

        fn config(&self) -> Result<ConfigMap> {
            self.queries.set(self.queries.get() + 1);
            Ok(self.config.clone())
        }

        fn find_executable(&self, name: &str) -> Option<PathBuf> {
            self.searched.borrow_mut().push(name.to_string());
            self.executables.get(name).cloned()
        }

        fn repo_probe<'a>(
            &'a self,
            bridge: Option<PathBuf>,
            _marker: &str,
            config: &'a ConfigMap,
        ) -> Box<dyn RepoProbe + 'a> {
            Box::new(StaticProbe {
                managed: self.managed,
                remotes: crate::redirect::probe::remote_names(config),
                bridge,
            })
        }
    }

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn os(tokens: &[&str]) -> Vec<OsString> {
        tokens.iter().map(OsString::from).collect()
    }

    const BUILTINS: &[&str] = &["checkout", "clone", "commit", "config", "fetch", "push", "status"];

    #[test]
    fn bare_invocation_runs_primary_without_queries() {
        let host = FakeHost::new(BUILTINS, "defaults.status=-sb\n");
        let inv = Dispatcher::new(&host).plan(&[]).unwrap();

        assert_eq!(inv, Invocation::new(OsStr::new("git"), Vec::<String>::new()));
        assert_eq!(host.queries.get(), 0);
        assert!(host.searched.borrow().is_empty());
    }

    #[test]
    fn flags_only_pass_through() {
        let host = FakeHost::new(BUILTINS, "");
        let inv = Dispatcher::new(&host).plan(&argv(&["--version"])).unwrap();
        assert_eq!(inv.args, os(&["--version"]));
        assert_eq!(host.queries.get(), 0);
    }

    #[test]
    fn defaults_are_injected_after_command() {
        let host = FakeHost::new(BUILTINS, "defaults.commit=-s\ndispatch.hub=off\n");
        let inv = Dispatcher::new(&host)
            .plan(&argv(&["commit", "-m", "x"]))
            .unwrap();
        assert_eq!(inv.program, OsString::from("git"));
        assert_eq!(inv.args, os(&["commit", "-s", "-m", "x"]));
    }

    #[test]
    fn nodefaults_suppresses_injection() {
        let host = FakeHost::new(BUILTINS, "defaults.commit=-s\ndispatch.hub=off\n");
        let inv = Dispatcher::new(&host)
            .plan(&argv(&["--nodefaults", "commit", "-m", "x"]))
            .unwrap();
        assert_eq!(inv.args, os(&["commit", "-m", "x"]));
    }

    #[test]
    fn nodefaults_alone_is_bare() {
        let host = FakeHost::new(BUILTINS, "");
        let inv = Dispatcher::new(&host).plan(&argv(&["--nodefaults"])).unwrap();
        assert!(inv.args.is_empty());
        assert_eq!(host.queries.get(), 0);
    }

    #[test]
    fn abbreviation_is_spelled_out() {
        let host = FakeHost::new(BUILTINS, "dispatch.hub=off\n");
        let inv = Dispatcher::new(&host).plan(&argv(&["che", "main"])).unwrap();
        assert_eq!(inv.args, os(&["checkout", "main"]));
    }

    #[test]
    fn ambiguous_abbreviation_fails() {
        let host = FakeHost::new(BUILTINS, "dispatch.hub=off\n");
        let err = Dispatcher::new(&host).plan(&argv(&["co"])).unwrap_err();
        match err {
            DispatchError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates, vec!["commit", "config"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_command_fails() {
        let host = FakeHost::new(BUILTINS, "dispatch.hub=off\n");
        let err = Dispatcher::new(&host).plan(&argv(&["zzz"])).unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { token } if token == "zzz"));
    }

    #[test]
    fn alias_resolves() {
        let host = FakeHost::new(BUILTINS, "alias.lg=log --graph\ndispatch.hub=off\n");
        let inv = Dispatcher::new(&host).plan(&argv(&["lg"])).unwrap();
        assert_eq!(inv.args, os(&["lg"]));
    }

    #[test]
    fn located_hub_becomes_the_program() {
        let host = FakeHost::new(BUILTINS, "").with_executable("hub", "/usr/local/bin/hub");
        let inv = Dispatcher::new(&host).plan(&argv(&["status"])).unwrap();
        assert_eq!(inv.program, OsString::from("/usr/local/bin/hub"));
        assert_eq!(inv.args, os(&["status"]));
    }

    #[test]
    fn pinned_hub_is_not_searched() {
        let host = FakeHost::new(BUILTINS, "dispatch.hub=/opt/hub\n");
        let inv = Dispatcher::new(&host).plan(&argv(&["status"])).unwrap();
        assert_eq!(inv.program, OsString::from("/opt/hub"));
        assert!(!host.searched.borrow().contains(&"hub".to_string()));
    }

    #[test]
    fn missing_hub_falls_back_to_primary() {
        let host = FakeHost::new(BUILTINS, "");
        let inv = Dispatcher::new(&host).plan(&argv(&["status"])).unwrap();
        assert_eq!(inv.program, OsString::from("git"));
        assert_eq!(*host.searched.borrow(), vec!["hub".to_string()]);
    }

    #[test]
    fn bridge_is_only_searched_for_transfer_commands() {
        let host = FakeHost::new(BUILTINS, "dispatch.hub=off\n");
        Dispatcher::new(&host).plan(&argv(&["status"])).unwrap();
        assert!(host.searched.borrow().is_empty());
    }

    #[test]
    fn marked_clone_is_redirected_with_defaults() {
        let host = FakeHost::new(BUILTINS, "dispatch.hub=off\ndefaults.clone=--quiet\n");
        let inv = Dispatcher::new(&host)
            .plan(&argv(&["clone", "hg+http://host/repo"]))
            .unwrap();
        assert_eq!(inv.args, os(&["hg", "clone", "--quiet", "http://host/repo"]));
        assert_eq!(*host.searched.borrow(), vec!["git-hg".to_string()]);
        assert!(inv.path_prefix.is_none());
    }

    #[test]
    fn disabled_bridge_leaves_clone_alone() {
        let host = FakeHost::new(BUILTINS, "dispatch.hub=off\ndispatch.bridge=off\n");
        let inv = Dispatcher::new(&host)
            .plan(&argv(&["clone", "hg+http://host/repo"]))
            .unwrap();
        assert_eq!(inv.args, os(&["clone", "hg+http://host/repo"]));
        assert!(host.searched.borrow().is_empty());
    }

    #[test]
    fn push_to_foreign_remote_is_not_redirected() {
        let host = FakeHost::new(
            BUILTINS,
            "dispatch.hub=off\nremote.origin.url=git@host:r\nremote.hg.url=hg::http://h/r\n",
        )
        .with_executable("git-hg", "/usr/bin/git-hg")
        .managed();
        let inv = Dispatcher::new(&host)
            .plan(&argv(&["push", "origin", "main"]))
            .unwrap();
        assert_eq!(inv.args, os(&["push", "origin", "main"]));
    }

    #[test]
    fn fetch_in_bridge_repository_is_redirected() {
        let host = FakeHost::new(BUILTINS, "dispatch.hub=off\n")
            .with_executable("git-hg", "/usr/bin/git-hg")
            .managed();
        let inv = Dispatcher::new(&host).plan(&argv(&["fe"])).unwrap();
        assert_eq!(inv.args, os(&["hg", "fetch"]));
    }

    #[test]
    fn pinned_bridge_dir_is_put_on_path() {
        let host = FakeHost::new(
            BUILTINS,
            "dispatch.hub=off\ndispatch.bridge=/opt/bridge/git-hg\n",
        )
        .managed();
        let inv = Dispatcher::new(&host).plan(&argv(&["push"])).unwrap();
        assert_eq!(inv.args, os(&["hg", "push"]));
        assert_eq!(inv.path_prefix, Some(PathBuf::from("/opt/bridge")));
    }

    #[test]
    fn pinned_bridge_dir_is_on_path_when_redirect_aborts() {
        let host = FakeHost::new(
            BUILTINS,
            "dispatch.hub=off\ndispatch.bridge=/opt/bridge/git-hg\nremote.hg.url=hg::http://h/r\n",
        )
        .managed();
        let inv = Dispatcher::new(&host).plan(&argv(&["fetch", "hg"])).unwrap();
        assert_eq!(inv.args, os(&["fetch", "hg"]));
        assert_eq!(inv.path_prefix, Some(PathBuf::from("/opt/bridge")));
    }

    #[test]
    fn pinned_bridge_dir_is_on_path_for_other_commands() {
        let host = FakeHost::new(
            BUILTINS,
            "dispatch.hub=off\ndispatch.bridge=/opt/bridge/git-hg\n",
        );
        let inv = Dispatcher::new(&host).plan(&argv(&["status"])).unwrap();
        assert_eq!(inv.args, os(&["status"]));
        assert_eq!(inv.path_prefix, Some(PathBuf::from("/opt/bridge")));
    }

    #[test]
    fn python_path_setting_is_prefixed() {
        let host = FakeHost::new(
            BUILTINS,
            "dispatch.hub=off\ndispatch.pythonpath=/opt/bridge/lib\n",
        );
        let inv = Dispatcher::new(&host).plan(&argv(&["status"])).unwrap();
        assert_eq!(inv.python_path_prefix, Some(PathBuf::from("/opt/bridge/lib")));
        assert!(inv.path_prefix.is_none());
    }

    #[test]
    fn hub_set_to_true_is_searched() {
        let host = FakeHost::new(BUILTINS, "dispatch.hub=true\n");
        let inv = Dispatcher::new(&host).plan(&argv(&["push", "origin"])).unwrap();
        assert_eq!(inv.program, OsString::from("git"));
        assert_eq!(inv.args, os(&["push", "origin"]));
        assert!(host.searched.borrow().contains(&"hub".to_string()));

        let host = FakeHost::new(BUILTINS, "dispatch.hub=true\n")
            .with_executable("hub", "/usr/local/bin/hub");
        let inv = Dispatcher::new(&host).plan(&argv(&["status"])).unwrap();
        assert_eq!(inv.program, OsString::from("/usr/local/bin/hub"));
    }

    #[test]
    fn bridge_helper_found_in_extension_dir() {
        let host = FakeHost::new(&["fetch", "hg"], "dispatch.hub=off\n").managed();
        let inv = Dispatcher::new(&host).plan(&argv(&["fetch"])).unwrap();
        assert_eq!(inv.args, os(&["hg", "fetch"]));
    }

    #[test]
    fn context_strips_defaults_when_asked() {
        let config = ConfigMap::parse("defaults.commit=-s\n");
        let ctx = DispatchContext::new(PathBuf::from("/nonexistent"), config, true);
        assert!(ctx.catalog.contains("commit"));
        assert!(ctx.catalog.defaults("commit").is_empty());
        assert_eq!(ctx.hub, Backend::Unconfigured);
        assert!(!ctx.bridge_pinned);
        assert!(ctx.bridge_dir().is_none());
        assert!(ctx.python_path.is_none());
    }

    #[test]
    fn context_bridge_dir_needs_a_directory() {
        let config = ConfigMap::parse("dispatch.bridge=git-hg\ndispatch.pythonpath=off\n");
        let ctx = DispatchContext::new(PathBuf::from("/nonexistent"), config, false);
        assert!(ctx.bridge_pinned);
        assert!(ctx.bridge_dir().is_none());
        assert!(ctx.python_path.is_none());
    }
}
