// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ownership and permission checks for configuration files (unix only).

use crate::domain::errors::PermissionKind;
use crate::domain::{ConfigError, Result};
use crate::ports::FileValidator;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// A [`FileValidator`] enforcing ownership and mode restrictions.
///
/// Checks run in this order: symlink, owner, group, file mode, parent directory
/// mode. The first failing check determines the error.
///
/// # Examples
///
/// ```rust,no_run
/// use tiercfg::adapters::SecurityPolicy;
///
/// // root-owned, not writable by group or others, no symlinks
/// let policy = SecurityPolicy::new()
///     .require_owner(0)
///     .forbid_file_mode(0o022)
///     .forbid_dir_mode(0o022)
///     .deny_symlinks();
/// ```
#[derive(Clone, Debug)]
pub struct SecurityPolicy {
    owner: Option<u32>,
    group: Option<u32>,
    forbidden_file_mode: u32,
    forbidden_dir_mode: u32,
    follow_symlinks: bool,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            owner: None,
            group: None,
            forbidden_file_mode: 0,
            forbidden_dir_mode: 0,
            follow_symlinks: true,
        }
    }
}

impl SecurityPolicy {
    /// Creates a policy that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the file to be owned by `uid`.
    pub fn require_owner(mut self, uid: u32) -> Self {
        self.owner = Some(uid);
        self
    }

    /// Requires the file's group to be `gid`.
    pub fn require_group(mut self, gid: u32) -> Self {
        self.group = Some(gid);
        self
    }

    /// Rejects files with any of `bits` set in their mode.
    pub fn forbid_file_mode(mut self, bits: u32) -> Self {
        self.forbidden_file_mode = bits & 0o7777;
        self
    }

    /// Rejects files whose parent directory has any of `bits` set.
    pub fn forbid_dir_mode(mut self, bits: u32) -> Self {
        self.forbidden_dir_mode = bits & 0o7777;
        self
    }

    /// Rejects symbolic links.
    pub fn deny_symlinks(mut self) -> Self {
        self.follow_symlinks = false;
        self
    }

    fn violation(kind: PermissionKind, path: &Path) -> ConfigError {
        tracing::debug!("Security check '{}' failed for '{}'", kind, path.display());
        ConfigError::Permission {
            kind,
            path: path.to_path_buf(),
        }
    }
}

impl FileValidator for SecurityPolicy {
    fn validate(&self, path: &Path) -> Result<()> {
        if !self.follow_symlinks {
            let link = fs::symlink_metadata(path).map_err(|e| ConfigError::from_io(path, e))?;
            if link.file_type().is_symlink() {
                return Err(Self::violation(PermissionKind::FileIsSymlink, path));
            }
        }

        let metadata = fs::metadata(path).map_err(|e| ConfigError::from_io(path, e))?;
        if self.owner.is_some_and(|uid| metadata.uid() != uid) {
            return Err(Self::violation(PermissionKind::WrongOwner, path));
        }
        if self.group.is_some_and(|gid| metadata.gid() != gid) {
            return Err(Self::violation(PermissionKind::WrongGroup, path));
        }
        if metadata.mode() & self.forbidden_file_mode != 0 {
            return Err(Self::violation(PermissionKind::WrongFilePermission, path));
        }

        if self.forbidden_dir_mode != 0 {
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let dir = fs::metadata(parent).map_err(|e| ConfigError::from_io(parent, e))?;
            if dir.mode() & self.forbidden_dir_mode != 0 {
                return Err(Self::violation(PermissionKind::WrongDirPermission, path));
            }
        }
        Ok(())
    }
}
