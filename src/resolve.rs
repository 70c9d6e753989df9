//! Command token resolution.
//!
//! Users abbreviate commands (`ch` for `checkout`), so a token that is not an
//! exact command name is matched as a prefix. A prefix that fits more than
//! one command is reported as ambiguous rather than guessed.

use crate::catalog::{sort_for_display, Catalog};
use crate::error::DispatchError;

/// Leading character of a flag token.
pub const FLAG_PREFIX: char = '-';

/// A resolved command and the index of its token in the argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    pub position: usize,
}

/// Why no command could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No command matches.
    NotFound { token: String },
    /// Several commands match by prefix, none exactly.
    Ambiguous {
        token: String,
        candidates: Vec<String>,
    },
}

impl From<ResolveError> for DispatchError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { token } => DispatchError::NotFound { token },
            ResolveError::Ambiguous { token, candidates } => {
                DispatchError::Ambiguous { token, candidates }
            }
        }
    }
}

fn is_flag(token: &str) -> bool {
    token.starts_with(FLAG_PREFIX)
}

/// Index of the first non-flag token, if there is one.
pub fn command_position(args: &[String]) -> Option<usize> {
    args.iter().position(|a| !is_flag(a))
}

/// Resolve the command named in `args`.
///
/// Every non-flag token is tried in order. An exact catalog match returns
/// at once; otherwise prefix matches from all tokens are pooled, and the
/// pool must hold exactly one candidate.
pub fn resolve(args: &[String], catalog: &Catalog) -> Result<Resolution, ResolveError> {
    let mut candidates: Vec<Resolution> = Vec::new();

    for (position, token) in args.iter().enumerate() {
        if is_flag(token) {
            continue;
        }
        if catalog.contains(token) {
            tracing::debug!("'{}' is an exact command at {}", token, position);
            return Ok(Resolution {
                name: token.clone(),
                position,
            });
        }
        candidates.extend(catalog.with_prefix(token).map(|name| Resolution {
            name: name.to_string(),
            position,
        }));
    }

    // Report the token the user most likely meant as the command.
    let token = command_position(args)
        .map(|i| args[i].clone())
        .unwrap_or_default();

    match candidates.len() {
        0 => Err(ResolveError::NotFound { token }),
        1 => {
            let found = candidates.remove(0);
            tracing::debug!("'{}' abbreviates '{}'", args[found.position], found.name);
            Ok(found)
        }
        _ => {
            let mut names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
            sort_for_display(&mut names);
            names.dedup();
            Err(ResolveError::Ambiguous {
                token,
                candidates: names.into_iter().map(str::to_string).collect(),
            })
        }
    }
}

/// Replace the token at `position` with the canonical command name.
pub fn canonicalize(args: &[String], resolution: &Resolution) -> Vec<String> {
    args.iter()
        .enumerate()
        .map(|(i, a)| {
            if i == resolution.position {
                resolution.name.clone()
            } else {
                a.clone()
            }
        })
        .collect()
}
