//! Configuration for git-dispatch.
//!
//! The backend's configuration store is the only source of settings:
//! - Flat key/value parsing in [`map`]
//! - Optional backend selection in [`backend`]
//!
//! # Example
//!
//! ```
//! use git_dispatch::config::{Backend, ConfigMap};
//!
//! let config = ConfigMap::parse("dispatch.hub=off\nalias.st=status\n");
//! let hub = Backend::from_setting(config.dispatch_setting("hub"));
//! assert_eq!(hub, Backend::Disabled);
//! ```
//!
//! # Recognized Namespaces
//!
//! - `dispatch.*` - backend pinning and bridge naming
//! - `alias.*`, `ext.*` - extra command names
//! - `defaults.*` - default arguments per command
//! - `remote.*` - remote names for the push-safety guard

pub mod backend;
pub mod map;

pub use backend::Backend;
pub use map::{
    ConfigMap, ConfigValue, ALIAS_PREFIX, DEFAULTS_PREFIX, DISPATCH_PREFIX, EXT_PREFIX,
    REMOTE_PREFIX,
};
