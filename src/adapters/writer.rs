// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-file serializer.
//!
//! Emits the root group's keys first without a header, then every named group as
//! a `[Name]` header followed by its keys, using the handle's own delimiter and
//! comment characters. Parsing the output yields the same `(group, key, value)`
//! triples; values joined from duplicate keys need [`DuplicateKeys::Join`] for
//! that.
//!
//! [`DuplicateKeys::Join`]: crate::adapters::DuplicateKeys::Join

use crate::domain::config_file::Entry;
use crate::domain::{ConfigError, ConfigFile, Result};
use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};

impl ConfigFile {
    /// Serializes the handle.
    ///
    /// A value joined from duplicate keys holds line breaks and is written as one
    /// `key=` line per part. Reading it back as one value needs
    /// [`DuplicateKeys::Join`]; any other policy keeps only the last part.
    ///
    /// [`DuplicateKeys::Join`]: crate::adapters::DuplicateKeys::Join
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tiercfg::domain::ConfigFile;
    ///
    /// let mut config = ConfigFile::ini();
    /// config.set(Some("Group"), "Bla", 12)?;
    /// config.set(None, "top", "  padded ")?;
    /// assert_eq!(config.to_text(), "top=\"  padded \"\n\n[Group]\nBla=12\n");
    /// # Ok::<(), tiercfg::domain::ConfigError>(())
    /// ```
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = write_key_file(self, &mut out);
        out
    }

    /// Writes the handle to `dir/file_name` and returns the written path.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::FileNotFound`] - `dir` does not exist
    /// * [`ConfigError::WriteError`] - the file could not be created or written
    pub fn write_to(&self, dir: impl AsRef<Path>, file_name: &str) -> Result<PathBuf> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ConfigError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }
        let path = dir.join(file_name);
        fs::write(&path, self.to_text()).map_err(|source| ConfigError::WriteError {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Wrote configuration to '{}'", path.display());
        Ok(path)
    }
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_key_file(self, f)
    }
}

fn write_key_file(config: &ConfigFile, out: &mut impl fmt::Write) -> fmt::Result {
    let mut wrote_any = false;
    if let Some(root) = config.group(None) {
        for (key, entry) in root.iter() {
            write_entry(config, key, entry, out)?;
            wrote_any = true;
        }
    }
    for (name, group) in config.groups().filter(|(name, _)| !name.is_empty()) {
        if wrote_any {
            out.write_char('\n')?;
        }
        writeln!(out, "[{}]", name)?;
        wrote_any = true;
        for (key, entry) in group.iter() {
            write_entry(config, key, entry, out)?;
        }
    }
    Ok(())
}

fn write_entry(
    config: &ConfigFile,
    key: &str,
    entry: &Entry,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    let comment = config.comment();
    if let Some(before) = entry.comment_before() {
        for line in before.lines() {
            if line.is_empty() {
                writeln!(out, "{}", comment)?;
            } else {
                writeln!(out, "{} {}", comment, line)?;
            }
        }
    }
    // joined duplicates are written back one line each
    let mut parts = entry.value().as_str().split('\n').peekable();
    while let Some(part) = parts.next() {
        write!(out, "{}{}{}", key, config.delimiter(), quote(part, comment))?;
        if parts.peek().is_none() {
            if let Some(after) = entry.comment_after() {
                write!(out, " {} {}", comment, after)?;
            }
        }
        out.write_char('\n')?;
    }
    Ok(())
}

/// Quotes values the parser would otherwise trim, cut or unquote.
///
/// Inside the quotes `"` and `\` are escaped with a backslash.
fn quote(value: &str, comment: char) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value.trim() != value
        || value.contains(comment)
        || value.contains('"');
    if !needs_quotes {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DuplicateKeys, KeyFileParser, ParseOptions};
    use crate::domain::ErrorCode;
    use crate::ports::ConfigParser;

    fn reparse(config: &ConfigFile) -> ConfigFile {
        let options = ParseOptions::new(config.delimiter(), config.comment()).unwrap();
        KeyFileParser::with_options(options)
            .parse(config.to_text().as_bytes(), None)
            .unwrap()
    }

    #[test]
    fn test_root_first_then_groups() {
        let mut config = ConfigFile::ini();
        config.set(Some("G"), "a", 1).unwrap();
        config.set(None, "r", 2).unwrap();
        assert_eq!(config.to_text(), "r=2\n\n[G]\na=1\n");
    }

    #[test]
    fn test_empty_handle() {
        assert_eq!(ConfigFile::ini().to_text(), "");
    }

    #[test]
    fn test_display_matches_to_text() {
        let mut config = ConfigFile::ini();
        config.set(Some("G"), "a", true).unwrap();
        assert_eq!(format!("{}", config), config.to_text());
    }

    #[test]
    fn test_quoting_round_trips() {
        let mut config = ConfigFile::ini();
        for (key, value) in [
            ("empty", ""),
            ("padded", "  x  "),
            ("hash", "a # b"),
            ("quoted", "\"already\""),
            ("plain", "just text"),
            ("inner_quote_and_hash", "a\"b#c"),
            ("backslash_and_hash", "C:\\dir # x"),
            ("trailing_backslash", "ends\\ "),
            ("lone_quote", "say \"hi"),
        ] {
            config.set(Some("G"), key, value).unwrap();
        }
        assert_eq!(reparse(&config).triples(), config.triples());
    }

    #[test]
    fn test_inner_quotes_are_escaped() {
        let mut config = ConfigFile::ini();
        config.set(Some("G"), "k", "a\"b#c").unwrap();
        assert_eq!(config.to_text(), "[G]\nk=\"a\\\"b#c\"\n");

        let text = "[G]\nk = \"say \\\"hi\\\" # now\" # note\n";
        let parsed = KeyFileParser::new().parse(text.as_bytes(), None).unwrap();
        let entry = parsed.entry(Some("G"), "k").unwrap();
        assert_eq!(entry.value().as_str(), "say \"hi\" # now");
        assert_eq!(entry.comment_after(), Some("note"));
        assert_eq!(reparse(&parsed).triples(), parsed.triples());
    }

    #[test]
    fn test_joined_values_reparse_with_join() {
        let join = ParseOptions::default().with_duplicate_keys(DuplicateKeys::Join);
        let text = "[G]\nk = one\nk = two\n";
        let joined = KeyFileParser::with_options(join)
            .parse(text.as_bytes(), None)
            .unwrap();
        assert_eq!(joined.get_string(Some("G"), "k").unwrap(), "one\ntwo");
        assert_eq!(joined.to_text(), "[G]\nk=one\nk=two\n");

        let again = KeyFileParser::with_options(join)
            .parse(joined.to_text().as_bytes(), None)
            .unwrap();
        assert_eq!(again.triples(), joined.triples());

        let overwritten = reparse(&joined);
        assert_eq!(overwritten.get_string(Some("G"), "k").unwrap(), "two");
    }

    #[test]
    fn test_comments_are_written() {
        let text = "# about k\nk = v # trailing\n";
        let config = KeyFileParser::new().parse(text.as_bytes(), None).unwrap();
        assert_eq!(config.to_text(), "# about k\nk=v # trailing\n");
        let again = reparse(&config);
        assert_eq!(
            again.entry(None, "k").unwrap().comment_after(),
            Some("trailing")
        );
    }

    #[test]
    fn test_custom_tags_are_used() {
        let mut config = ConfigFile::new(':', ';').unwrap();
        config.set(Some("G"), "k", "a # b").unwrap();
        assert_eq!(config.to_text(), "[G]\nk:a # b\n");
        assert_eq!(reparse(&config).triples(), config.triples());
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ConfigFile::ini();
        config.set(Some("G"), "k", 1).unwrap();

        let path = config.write_to(dir.path(), "out.conf").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[G]\nk=1\n");
    }

    #[test]
    fn test_write_to_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigFile::ini()
            .write_to(dir.path().join("missing"), "out.conf")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoFile);
    }

    #[test]
    fn test_write_to_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("taken")).unwrap();
        let err = ConfigFile::ini()
            .write_to(dir.path(), "taken")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::WriteError);
    }
}
