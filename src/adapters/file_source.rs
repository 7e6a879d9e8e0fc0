// SPDX-License-Identifier: MIT OR Apache-2.0

//! File and in-memory configuration source adapters.

use crate::domain::{ConfigError, Result};
use crate::ports::ConfigSource;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum allowed size for a configuration file (10MB)
/// This prevents denial of service attacks via extremely large files
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration source backed by a file on disk.
///
/// A missing file reads as absent (`Ok(None)`); every other I/O failure is an
/// error.
///
/// # Examples
///
/// ```rust,no_run
/// use tiercfg::adapters::FileSource;
/// use tiercfg::ports::ConfigSource;
///
/// let source = FileSource::new("/etc/example.conf");
/// match source.read().unwrap() {
///     Some(bytes) => println!("{} bytes", bytes.len()),
///     None => println!("not there"),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a source for `path`. Nothing is read until [`ConfigSource::read`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        // Check file size before reading to prevent DoS via large files
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::from_io(&self.path, e)),
        };
        if metadata.len() > MAX_FILE_SIZE {
            return Err(ConfigError::Io {
                path: self.path.clone(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Configuration file too large: {} bytes (max {} bytes)",
                        metadata.len(),
                        MAX_FILE_SIZE
                    ),
                ),
            });
        }
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            // removed between the metadata call and the read
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::from_io(&self.path, e)),
        }
    }
}

/// Configuration source holding its content in memory.
///
/// Mostly useful in tests and for configuration embedded in a binary. A path may
/// be attached so errors and validators see a realistic location.
///
/// # Examples
///
/// ```rust
/// use tiercfg::adapters::MemorySource;
/// use tiercfg::ports::ConfigSource;
///
/// let source = MemorySource::new("[Group]\nBla = 1\n");
/// assert!(source.read().unwrap().is_some());
/// assert!(source.path().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    content: Vec<u8>,
    path: Option<PathBuf>,
}

impl MemorySource {
    /// Creates a source from bytes or text.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            path: None,
        }
    }

    /// Attaches a path used for error locations and validators.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }
}

impl ConfigSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(Some(self.content.clone()))
    }
}
