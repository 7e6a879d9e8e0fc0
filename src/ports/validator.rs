// SPDX-License-Identifier: MIT OR Apache-2.0

//! File validator trait definition.
//!
//! A validator inspects a candidate file before it is read, e.g. to check
//! ownership, permissions or a naming policy. It runs synchronously on the thread
//! that asked for the parse, once per file, and can only reject that file.

use crate::domain::{ConfigError, Result};
use std::path::Path;

/// A check run against every file before it is parsed.
///
/// Any closure `Fn(&Path) -> bool` is a validator; returning `false` rejects the
/// file with [`ConfigError::ValidatorRejected`]. Implement the trait directly to
/// return a more specific error, such as
/// [`ConfigError::Permission`].
///
/// # Examples
///
/// ```rust
/// use tiercfg::ports::FileValidator;
/// use std::path::Path;
///
/// let only_conf = |path: &Path| path.extension().is_some_and(|e| e == "conf");
/// assert!(only_conf.validate(Path::new("/etc/a.conf")).is_ok());
/// assert!(only_conf.validate(Path::new("/etc/a.txt")).is_err());
/// ```
pub trait FileValidator: Send + Sync {
    /// Accepts or rejects `path`.
    fn validate(&self, path: &Path) -> Result<()>;
}

impl<F> FileValidator for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn validate(&self, path: &Path) -> Result<()> {
        if self(path) {
            Ok(())
        } else {
            Err(ConfigError::ValidatorRejected {
                path: path.to_path_buf(),
            })
        }
    }
}
