//! Selection state for the optional backends.

use std::path::{Path, PathBuf};

use super::map::ConfigValue;

/// Where an optional backend lives, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// The user opted out.
    Disabled,
    /// Not pinned; search for it when first needed.
    Unconfigured,
    /// Known executable path.
    Located(PathBuf),
}

impl Backend {
    /// Read the selection from a `dispatch.<backend>` setting.
    ///
    /// Absent or a bare on value means search, an off value disables, and
    /// anything else pins a path.
    pub fn from_setting(value: Option<&ConfigValue>) -> Self {
        match value {
            None => Backend::Unconfigured,
            Some(v) if v.is_off() => Backend::Disabled,
            Some(v) if v.is_on() => Backend::Unconfigured,
            Some(v) => Backend::Located(PathBuf::from(v.to_string())),
        }
    }

    /// Search for the backend if it has not been resolved yet.
    ///
    /// A failed search leaves the backend `Unconfigured`; it is never
    /// searched twice in one run because the dispatcher asks at most once.
    pub fn locate_with<F>(&mut self, find: F) -> Option<&Path>
    where
        F: FnOnce() -> Option<PathBuf>,
    {
        if let Backend::Unconfigured = self {
            if let Some(path) = find() {
                *self = Backend::Located(path);
            }
        }
        self.path()
    }

    /// The located path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Backend::Located(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Backend::Disabled)
    }
}
