// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-source loading.
//!
//! These functions tie a source, a parser and an optional validator together. On a
//! fatal failure the error location is also recorded in this thread's
//! [last-error-location slot](crate::domain::location::last_error_location).

use crate::adapters::{FileSource, KeyFileParser, ParseOptions};
use crate::domain::location::record_error;
use crate::domain::{ConfigError, ConfigFile, Result};
use crate::ports::{ConfigParser, ConfigSource, FileValidator};
use std::path::{Path, PathBuf};

/// Records the location of a failed load before handing the result back.
pub(crate) fn recorded<T>(result: Result<T>, origin: Option<&Path>) -> Result<T> {
    if let Err(e) = &result {
        record_error(e, origin);
    }
    result
}

/// Validates, reads and parses one source; `Ok(None)` if the source is absent.
pub(crate) fn load_optional(
    source: &dyn ConfigSource,
    parser: &dyn ConfigParser,
    validator: Option<&dyn FileValidator>,
) -> Result<Option<ConfigFile>> {
    if let (Some(validator), Some(path)) = (validator, source.path()) {
        if path.exists() || path.is_symlink() {
            validator.validate(path)?;
        }
    }
    match source.read()? {
        Some(bytes) => parser.parse(&bytes, source.path()).map(Some),
        None => Ok(None),
    }
}

/// Loads a single source.
///
/// The validator, if any, runs before the source is read and only for sources
/// backed by a path.
///
/// # Errors
///
/// * [`ConfigError::FileNotFound`] - the source does not exist
/// * any error of the validator or the parser
///
/// # Examples
///
/// ```rust
/// use tiercfg::adapters::{KeyFileParser, MemorySource};
/// use tiercfg::service::load;
///
/// let source = MemorySource::new("[Group]\nBla = 12\n");
/// let config = load(&source, &KeyFileParser::new(), None).unwrap();
/// assert_eq!(config.get_int(Some("Group"), "Bla").unwrap(), 12);
/// ```
pub fn load(
    source: &dyn ConfigSource,
    parser: &dyn ConfigParser,
    validator: Option<&dyn FileValidator>,
) -> Result<ConfigFile> {
    let result = load_optional(source, parser, validator).and_then(|loaded| {
        loaded.ok_or_else(|| ConfigError::FileNotFound {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(source.name())),
        })
    });
    if let Err(e) = &result {
        tracing::debug!("Failed to load source '{}': {}", source.name(), e);
    }
    recorded(result, source.path())
}

/// Parses in-memory content.
///
/// # Examples
///
/// ```rust
/// use tiercfg::parse_bytes;
///
/// let config = parse_bytes("[Group]\nBla = 12\n", '=', '#').unwrap();
/// assert_eq!(config.get_int(Some("Group"), "Bla").unwrap(), 12);
/// ```
pub fn parse_bytes(bytes: impl AsRef<[u8]>, delimiter: char, comment: char) -> Result<ConfigFile> {
    let options = recorded(ParseOptions::new(delimiter, comment), None)?;
    parse_bytes_with(bytes, &options)
}

/// Parses in-memory content with explicit options.
pub fn parse_bytes_with(bytes: impl AsRef<[u8]>, options: &ParseOptions) -> Result<ConfigFile> {
    let parser = KeyFileParser::with_options(*options);
    recorded(parser.parse(bytes.as_ref(), None), None)
}

/// Parses one file.
///
/// # Errors
///
/// [`ConfigError::FileNotFound`] if the file does not exist, otherwise any parse
/// error.
pub fn parse_file(path: impl AsRef<Path>, delimiter: char, comment: char) -> Result<ConfigFile> {
    let path = path.as_ref();
    let options = recorded(ParseOptions::new(delimiter, comment), Some(path))?;
    parse_file_with(path, &options, None)
}

/// Parses one file with explicit options and an optional validator.
///
/// # Examples
///
/// ```rust,no_run
/// use tiercfg::adapters::ParseOptions;
/// use tiercfg::parse_file_with;
/// use std::path::Path;
///
/// let only_etc = |path: &Path| path.starts_with("/etc");
/// let config = parse_file_with("/etc/example.conf", &ParseOptions::default(), Some(&only_etc));
/// ```
pub fn parse_file_with(
    path: impl AsRef<Path>,
    options: &ParseOptions,
    validator: Option<&dyn FileValidator>,
) -> Result<ConfigFile> {
    let source = FileSource::new(path);
    load(&source, &KeyFileParser::with_options(*options), validator)
}
