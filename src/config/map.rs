//! Flat configuration map read from the backend's config store.
//!
//! The backend lists its configuration as `key=value` lines. Values are
//! typed while parsing: `true`/`false` become booleans, integers become
//! integers, and everything else is kept as a string.

use std::collections::HashMap;
use std::fmt;

/// Prefix for the dispatcher's own settings.
pub const DISPATCH_PREFIX: &str = "dispatch.";
/// Prefix for user-defined aliases.
pub const ALIAS_PREFIX: &str = "alias.";
/// Prefix for user-defined extension commands.
pub const EXT_PREFIX: &str = "ext.";
/// Prefix for per-command default arguments.
pub const DEFAULTS_PREFIX: &str = "defaults.";
/// Prefix for remote definitions.
pub const REMOTE_PREFIX: &str = "remote.";

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl ConfigValue {
    /// Type a raw value the way the config listing is interpreted.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => ConfigValue::Bool(true),
            "false" => ConfigValue::Bool(false),
            _ => raw
                .parse::<i64>()
                .map(ConfigValue::Int)
                .unwrap_or_else(|_| ConfigValue::Str(raw.to_string())),
        }
    }

    /// Whether this value switches a feature off (`off`, `0`, `false`).
    pub fn is_off(&self) -> bool {
        match self {
            ConfigValue::Bool(b) => !b,
            ConfigValue::Int(i) => *i == 0,
            ConfigValue::Str(s) => matches!(s.to_lowercase().as_str(), "off" | "0" | "false"),
        }
    }

    /// Whether this value switches a feature on without naming anything
    /// (`true`, `on`, `yes`, a non-zero number).
    pub fn is_on(&self) -> bool {
        match self {
            ConfigValue::Bool(b) => *b,
            ConfigValue::Int(i) => *i != 0,
            ConfigValue::Str(s) => matches!(s.to_lowercase().as_str(), "on" | "yes" | "true"),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Str(s) => f.write_str(s),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(i) => write!(f, "{}", i),
        }
    }
}

/// Mapping from dotted key to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    entries: HashMap<String, ConfigValue>,
}

impl ConfigMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key=value` listing. Later lines overwrite earlier ones.
    pub fn parse(listing: &str) -> Self {
        let mut map = Self::new();
        for line in listing.lines() {
            let line = line.trim();
            if let Some((key, value)) = line.split_once('=') {
                if !key.is_empty() {
                    map.insert(key, ConfigValue::parse(value));
                }
            }
        }
        map
    }

    /// Set a value, replacing any previous one.
    pub fn insert(&mut self, key: &str, value: ConfigValue) {
        self.entries.insert(key.to_string(), value);
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Look up a dispatcher setting (`dispatch.<name>`).
    pub fn dispatch_setting(&self, name: &str) -> Option<&ConfigValue> {
        self.get(&format!("{}{}", DISPATCH_PREFIX, name))
    }

    /// Iterate over `(suffix, value)` for every key under `prefix`.
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ConfigValue)> + 'a {
        self.entries
            .iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|rest| (rest, v)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ConfigValue)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (K, ConfigValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
