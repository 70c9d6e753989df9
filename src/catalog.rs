//! Known command names and their configured default arguments.
//!
//! The catalog unions three sources:
//! - built-in commands found as `git-<name>` executables in the backend's
//!   extension directory
//! - `alias.<name>` and `ext.<name>` configuration keys
//! - `defaults.<name>` keys, which also attach a default argument list

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::{ConfigMap, ALIAS_PREFIX, DEFAULTS_PREFIX, EXT_PREFIX};
use crate::locator::has_exec_bit;

/// Prefix of built-in command executables.
pub const COMMAND_PREFIX: &str = "git-";

/// Marks an executable that extends another command rather than being one.
pub const SUBCOMMAND_SEPARATOR: &str = "--";

/// Command name to default arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    commands: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Build the catalog from the extension directory and configuration.
    pub fn build(extension_dir: &Path, config: &ConfigMap) -> Self {
        let mut catalog = Self::default();

        for name in builtin_commands(extension_dir) {
            catalog.add(name);
        }

        for prefix in [ALIAS_PREFIX, EXT_PREFIX] {
            for (name, _) in config.with_prefix(prefix) {
                catalog.add(name.to_string());
            }
        }

        for (name, value) in config.with_prefix(DEFAULTS_PREFIX) {
            let args = value
                .to_string()
                .split_whitespace()
                .map(str::to_string)
                .collect();
            catalog.commands.insert(name.to_string(), args);
        }

        tracing::debug!("catalog holds {} commands", catalog.len());
        catalog
    }

    /// Register a command with no defaults, keeping any existing defaults.
    pub fn add(&mut self, name: String) {
        self.commands.entry(name).or_default();
    }

    /// Register a command with default arguments.
    pub fn insert(&mut self, name: &str, defaults: Vec<String>) {
        self.commands.insert(name.to_string(), defaults);
    }

    /// Same commands, with every default list emptied.
    pub fn without_defaults(&self) -> Self {
        Self {
            commands: self
                .commands
                .keys()
                .map(|name| (name.clone(), Vec::new()))
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Configured default arguments for `name` (empty if none).
    pub fn defaults(&self, name: &str) -> &[String] {
        self.commands.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Command names starting with `prefix`, in no particular order.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.commands
            .keys()
            .map(String::as_str)
            .filter(move |name| name.starts_with(prefix))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (S, Vec<String>)>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Sort names case-insensitively, breaking ties by exact spelling.
pub fn sort_for_display(names: &mut [&str]) {
    names.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
}

/// Names of the built-in commands in `extension_dir`.
///
/// An unreadable directory contributes nothing.
pub fn builtin_commands(extension_dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(extension_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(
                "cannot list extension dir {}: {}",
                extension_dir.display(),
                e
            );
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let file_name = entry.file_name().into_string().ok()?;
            if file_name.contains(SUBCOMMAND_SEPARATOR) {
                return None;
            }
            let name = file_name.strip_prefix(COMMAND_PREFIX)?;
            if name.is_empty() || !has_exec_bit(&entry.path()) {
                return None;
            }
            Some(name.to_string())
        })
        .collect()
}
