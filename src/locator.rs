//! Executable lookup on the search path.
//!
//! Candidates are checked the way the kernel decides whether the current
//! user may execute them: symbolic links are followed to a real file, and
//! only the permission class that applies (owner, group, or other) counts.
//!
//! # Example
//!
//! ```no_run
//! use git_dispatch::locator;
//!
//! if let Some(hub) = locator::find("hub") {
//!     println!("hub is at {}", hub.display());
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of symbolic links followed before giving up.
const MAX_LINK_HOPS: usize = 40;

/// The effective identity permission checks are made against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
    pub groups: Vec<u32>,
}

impl Identity {
    /// Identity of the running process.
    #[cfg(unix)]
    pub fn current() -> Self {
        // SAFETY: geteuid/getegid are simple syscalls that cannot fail
        let (uid, gid) = unsafe { (libc::geteuid(), libc::getegid()) };
        Self {
            uid,
            gid,
            groups: supplementary_groups(),
        }
    }

    #[cfg(not(unix))]
    pub fn current() -> Self {
        Self {
            uid: 0,
            gid: 0,
            groups: Vec::new(),
        }
    }

    fn in_group(&self, gid: u32) -> bool {
        self.gid == gid || self.groups.contains(&gid)
    }
}

#[cfg(unix)]
fn supplementary_groups() -> Vec<u32> {
    // SAFETY: a zero-sized call only returns the group count
    let count = unsafe { libc::getgroups(0, std::ptr::null_mut()) };
    if count <= 0 {
        return Vec::new();
    }
    let mut groups: Vec<libc::gid_t> = vec![0; count as usize];
    // SAFETY: the buffer holds exactly `count` entries
    let filled = unsafe { libc::getgroups(count, groups.as_mut_ptr()) };
    if filled < 0 {
        return Vec::new();
    }
    groups.truncate(filled as usize);
    groups
}

/// Whether `identity` may execute a file with the given mode and ownership.
///
/// Only one class is consulted: the owner bits if the identity owns the
/// file, else the group bits if it belongs to the owning group, else the
/// world bits.
pub fn permits(mode: u32, owner: u32, group: u32, identity: &Identity) -> bool {
    let exec_bit = if owner == identity.uid {
        0o100
    } else if identity.in_group(group) {
        0o010
    } else {
        0o001
    };
    mode & exec_bit != 0
}

/// Follow a chain of symbolic links to the file it finally names.
///
/// Returns `None` for a dead link or a chain that never ends.
pub fn resolve_links(path: &Path) -> Option<PathBuf> {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_LINK_HOPS {
        let meta = fs::symlink_metadata(&current).ok()?;
        if !meta.file_type().is_symlink() {
            return Some(current);
        }
        let target = fs::read_link(&current).ok()?;
        current = if target.is_absolute() {
            target
        } else {
            current
                .parent()
                .map(|dir| dir.join(&target))
                .unwrap_or(target)
        };
    }
    None
}

/// Check whether `path` is a file the identity may execute.
#[cfg(unix)]
pub fn is_executable_by(path: &Path, identity: &Identity) -> bool {
    use std::os::unix::fs::MetadataExt;

    let Some(real) = resolve_links(path) else {
        return false;
    };
    match fs::metadata(&real) {
        Ok(meta) if meta.is_file() => permits(meta.mode(), meta.uid(), meta.gid(), identity),
        _ => false,
    }
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable_by(path: &Path, _identity: &Identity) -> bool {
    resolve_links(path).map(|p| p.is_file()).unwrap_or(false)
}

/// Check whether a file has any executable permission bit set.
#[cfg(unix)]
pub fn has_exec_bit(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn has_exec_bit(path: &Path) -> bool {
    path.is_file()
}

/// Find `name` in the given directories, first match wins.
///
/// The returned path is the directory entry itself, not the link target.
pub fn find_in(name: &str, dirs: &[PathBuf], identity: &Identity) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable_by(candidate, identity))
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Find `name` on the process search path.
pub fn find(name: &str) -> Option<PathBuf> {
    let found = find_in(name, &parse_system_path(), &Identity::current());
    tracing::debug!("locate {}: {:?}", name, found);
    found
}
