// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration source trait definition.
//!
//! This module defines the `ConfigSource` trait, the port through which the loader
//! and the directory resolver obtain raw configuration bytes. Sources only deliver
//! bytes; parsing is the job of a [`ConfigParser`](crate::ports::ConfigParser).

use crate::domain::Result;
use std::path::Path;

/// A trait for configuration sources.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so candidates can be read in parallel.
///
/// # Absence
///
/// A source that does not exist is not an error: `read` returns `Ok(None)` and
/// callers decide whether absence matters.
///
/// # Examples
///
/// ```rust
/// use tiercfg::ports::ConfigSource;
/// use tiercfg::domain::Result;
/// use std::path::Path;
///
/// struct Fixed(&'static str);
///
/// impl ConfigSource for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     fn path(&self) -> Option<&Path> {
///         None
///     }
///
///     fn read(&self) -> Result<Option<Vec<u8>>> {
///         Ok(Some(self.0.as_bytes().to_vec()))
///     }
/// }
///
/// let source = Fixed("a = 1\n");
/// assert_eq!(source.read().unwrap().unwrap(), b"a = 1\n");
/// ```
pub trait ConfigSource: Send + Sync {
    /// Returns a short identifier used in logs.
    fn name(&self) -> &str;

    /// Returns the file backing this source, if any.
    ///
    /// The path is handed to validators and recorded in parse errors.
    fn path(&self) -> Option<&Path>;

    /// Reads the whole source.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(bytes))` - The content
    /// * `Ok(None)` - The source does not exist
    /// * `Err(ConfigError)` - The source exists but could not be read
    fn read(&self) -> Result<Option<Vec<u8>>>;
}
