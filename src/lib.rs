//! git-dispatch - command-dispatch shim for git.
//!
//! git-dispatch sits in front of git. It expands abbreviated commands,
//! routes transfer commands through a foreign-repository bridge when the
//! repository calls for it, adds per-command default arguments, and then
//! replaces itself with git (or the `hub` wrapper).
//!
//! # Modules
//!
//! - [`catalog`] - Known command names and default arguments
//! - [`config`] - Configuration map and backend selection
//! - [`defaults`] - Default argument injection
//! - [`dispatch`] - Orchestration and process replacement
//! - [`error`] - Error types and result aliases
//! - [`locator`] - Executable lookup on the search path
//! - [`redirect`] - Bridge redirection and the push-safety guard
//! - [`resolve`] - Command token resolution
//! - [`shell`] - Backend queries
//!
//! # Example
//!
//! ```
//! use git_dispatch::catalog::Catalog;
//! use git_dispatch::resolve::resolve;
//!
//! let catalog: Catalog = ["commit", "config"]
//!     .into_iter()
//!     .map(|name| (name, Vec::<String>::new()))
//!     .collect();
//! let args = vec!["com".to_string(), "-m".to_string(), "wip".to_string()];
//! let found = resolve(&args, &catalog).unwrap();
//! assert_eq!(found.name, "commit");
//! ```

pub mod catalog;
pub mod config;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod locator;
pub mod redirect;
pub mod resolve;
pub mod shell;

pub use error::{DispatchError, Result};
