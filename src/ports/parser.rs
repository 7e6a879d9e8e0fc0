// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration parser trait definition.
//!
//! This module defines the `ConfigParser` trait, which turns the raw bytes of one
//! configuration source into a [`ConfigFile`] handle.

use crate::domain::{ConfigFile, Result};
use std::path::Path;

/// A trait for parsing a single configuration source.
///
/// Parsing is all-or-nothing: a fatal grammar error returns `Err` and no partial
/// handle. Implementations must be pure with respect to shared state, so that
/// independent sources can be parsed on different threads.
///
/// # Examples
///
/// ```rust
/// use tiercfg::ports::ConfigParser;
/// use tiercfg::domain::{ConfigFile, Result};
/// use std::path::Path;
///
/// struct OneKeyParser;
///
/// impl ConfigParser for OneKeyParser {
///     fn parse(&self, bytes: &[u8], _origin: Option<&Path>) -> Result<ConfigFile> {
///         let mut config = ConfigFile::ini();
///         config.set(None, "raw", String::from_utf8_lossy(bytes).trim())?;
///         Ok(config)
///     }
/// }
///
/// let config = OneKeyParser.parse(b"hello\n", None).unwrap();
/// assert_eq!(config.get_string(None, "raw").unwrap(), "hello");
/// ```
pub trait ConfigParser: Send + Sync {
    /// Parses `bytes` into a handle.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The raw content of the source
    /// * `origin` - The path the bytes were read from, used for error locations
    ///   and recorded as the handle's path; `None` for in-memory input
    ///
    /// # Returns
    ///
    /// * `Ok(ConfigFile)` - The parsed handle
    /// * `Err(ConfigError)` - The content violates the grammar
    fn parse(&self, bytes: &[u8], origin: Option<&Path>) -> Result<ConfigFile>;
}

impl<P: ConfigParser + ?Sized> ConfigParser for &P {
    fn parse(&self, bytes: &[u8], origin: Option<&Path>) -> Result<ConfigFile> {
        (**self).parse(bytes, origin)
    }
}
