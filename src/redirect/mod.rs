//! Routing transfer commands through a foreign-repository bridge.
//!
//! A bridge is a git subcommand (for example `git hg`) that speaks to a
//! repository managed by another VCS. Two things send a command through it:
//!
//! - a clone URL carrying the bridge's scheme marker (`hg+https://...`)
//! - a fetch, pull or push inside a repository the bridge manages
//!
//! Redirection is best effort. When the probe errors or the push-safety
//! guard objects, the result is [`Redirect::Aborted`] and the caller
//! dispatches the original arguments unchanged.

pub mod probe;

pub use probe::{GitRepoProbe, RepoProbe};

use crate::config::{Backend, ConfigMap};
use crate::resolve::FLAG_PREFIX;

/// Commands the redirector looks at.
pub const TRANSFER_COMMANDS: &[&str] = &["clone", "fetch", "pull", "push"];

/// Default bridge selector token.
pub const DEFAULT_BRIDGE: &str = "hg";

/// Default name of the marker file a bridge leaves in the git directory.
pub const DEFAULT_MARKER: &str = "hgremote";

/// Whether `command` moves data between repositories.
pub fn is_transfer_command(command: &str) -> bool {
    TRANSFER_COMMANDS.contains(&command)
}

/// Describes the bridge a redirect targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSpec {
    /// Token inserted before the command (`git <token> clone ...`).
    pub token: String,
    /// URL prefix marking a bridge repository.
    pub scheme_prefix: String,
    /// Remote name the bridge pushes to and fetches from.
    pub remote: String,
    /// File in the git directory that marks a bridge-managed repository.
    pub marker: String,
}

impl BridgeSpec {
    /// Bridge spec for a selector token, with the usual derived names.
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            scheme_prefix: format!("{}+", token),
            remote: token.to_string(),
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    /// Read `dispatch.bridgecmd`, `dispatch.bridgescheme` and
    /// `dispatch.bridgeremote`, falling back to names derived from the token.
    pub fn from_config(config: &ConfigMap) -> Self {
        let token = config
            .dispatch_setting("bridgecmd")
            .map(|v| v.to_string())
            .unwrap_or_else(|| DEFAULT_BRIDGE.to_string());
        let mut spec = Self::new(&token);
        if let Some(scheme) = config.dispatch_setting("bridgescheme") {
            spec.scheme_prefix = scheme.to_string();
        }
        if let Some(remote) = config.dispatch_setting("bridgeremote") {
            spec.remote = remote.to_string();
        }
        spec
    }

    /// Executable name of the bridge helper.
    pub fn helper_name(&self) -> String {
        format!("{}{}", crate::catalog::COMMAND_PREFIX, self.token)
    }
}

impl Default for BridgeSpec {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE)
    }
}

/// Why an attempted redirect was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The bridge helper is not available.
    BridgeUnavailable,
    /// The current repository is not managed by the bridge.
    NotBridgeRepository,
    /// A fetch or pull named a target; only the implicit default is bridged.
    UnexpectedPositional(String),
    /// A push named a configured remote other than the bridge remote.
    ForeignRemote(String),
    /// The repository probe failed.
    ProbeFailed(String),
}

/// Outcome of a redirect decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// No trigger applies to this invocation.
    Unchanged,
    /// The arguments were rewritten; `offset` tokens were inserted before
    /// the command.
    Rewritten { args: Vec<String>, offset: usize },
    /// A trigger applied but a check failed.
    Aborted(AbortReason),
}

impl Redirect {
    /// Arguments and offset to dispatch with.
    ///
    /// Anything but a rewrite dispatches `original` with offset 0.
    pub fn apply(self, original: &[String]) -> (Vec<String>, usize) {
        match self {
            Redirect::Rewritten { args, offset } => (args, offset),
            Redirect::Unchanged | Redirect::Aborted(_) => (original.to_vec(), 0),
        }
    }
}

/// Non-flag tokens after the command token.
fn positionals_after(position: usize, args: &[String]) -> impl Iterator<Item = &String> {
    args.iter()
        .skip(position + 1)
        .filter(|a| !a.starts_with(FLAG_PREFIX))
}

/// Insert the bridge token before the command.
fn with_token(token: &str, position: usize, args: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len() + 1);
    out.extend(args[..position].iter().cloned());
    out.push(token.to_string());
    out.extend(args[position..].iter().cloned());
    out
}

/// Decide whether `command` at `position` must go through the bridge.
pub fn redirect(
    command: &str,
    position: usize,
    args: &[String],
    bridge: &Backend,
    spec: &BridgeSpec,
    probe: &dyn RepoProbe,
) -> Redirect {
    if bridge.is_disabled() || !is_transfer_command(command) || position >= args.len() {
        return Redirect::Unchanged;
    }

    let outcome = match command {
        "clone" => redirect_clone(position, args, spec),
        _ => redirect_existing(command, position, args, spec, probe),
    };

    match &outcome {
        Redirect::Rewritten { args, .. } => tracing::debug!("redirected to bridge: {:?}", args),
        Redirect::Aborted(reason) => tracing::debug!("bridge redirect aborted: {:?}", reason),
        Redirect::Unchanged => {}
    }
    outcome
}

fn redirect_clone(position: usize, args: &[String], spec: &BridgeSpec) -> Redirect {
    if spec.scheme_prefix.is_empty() {
        return Redirect::Unchanged;
    }
    let marked = args
        .iter()
        .enumerate()
        .skip(position + 1)
        .find(|(_, a)| a.starts_with(&spec.scheme_prefix))
        .map(|(i, _)| i);

    let Some(index) = marked else {
        return Redirect::Unchanged;
    };

    let mut rewritten = args.to_vec();
    rewritten[index] = args[index][spec.scheme_prefix.len()..].to_string();
    Redirect::Rewritten {
        args: with_token(&spec.token, position, rewritten),
        offset: 1,
    }
}

fn redirect_existing(
    command: &str,
    position: usize,
    args: &[String],
    spec: &BridgeSpec,
    probe: &dyn RepoProbe,
) -> Redirect {
    match probe.bridge_usable() {
        Ok(true) => {}
        Ok(false) => return Redirect::Aborted(AbortReason::BridgeUnavailable),
        Err(e) => return Redirect::Aborted(AbortReason::ProbeFailed(e.to_string())),
    }
    match probe.is_bridge_repository() {
        Ok(true) => {}
        Ok(false) => return Redirect::Aborted(AbortReason::NotBridgeRepository),
        Err(e) => return Redirect::Aborted(AbortReason::ProbeFailed(e.to_string())),
    }

    if command == "push" {
        let remotes = match probe.remotes() {
            Ok(remotes) => remotes,
            Err(e) => return Redirect::Aborted(AbortReason::ProbeFailed(e.to_string())),
        };
        let foreign = positionals_after(position, args)
            .find(|token| **token != spec.remote && remotes.contains(*token));
        if let Some(remote) = foreign {
            return Redirect::Aborted(AbortReason::ForeignRemote(remote.clone()));
        }
    } else if let Some(target) = positionals_after(position, args).next() {
        return Redirect::Aborted(AbortReason::UnexpectedPositional(target.clone()));
    }

    Redirect::Rewritten {
        args: with_token(&spec.token, position, args.to_vec()),
        offset: 1,
    }
}
