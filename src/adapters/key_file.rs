// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-file parser adapter.
//!
//! This module implements [`ConfigParser`] for the line-oriented key-file format:
//!
//! ```text
//! # comment
//! root_key = value
//!
//! [Group]
//! Bla = 12   # trailing comment
//! Name[de] = "quoted # not a comment"
//! ```
//!
//! Delimiter and comment characters are configurable through [`ParseOptions`].

use crate::domain::config_file::{check_tags, Entry, DEFAULT_COMMENT, DEFAULT_DELIMITER};
use crate::domain::errors::SyntaxErrorKind;
use crate::domain::{ConfigError, ConfigFile, ConfigValue, Result};
use crate::ports::ConfigParser;
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

/// What to do when a key appears twice in the same group of one source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DuplicateKeys {
    /// The last occurrence wins.
    #[default]
    Overwrite,
    /// The second occurrence is a parse error.
    Reject,
    /// Values are joined with a newline, in order of appearance.
    Join,
}

/// Parser settings.
///
/// # Examples
///
/// ```rust
/// use tiercfg::adapters::{DuplicateKeys, ParseOptions};
///
/// let options = ParseOptions::new(':', ';')
///     .unwrap()
///     .with_duplicate_keys(DuplicateKeys::Reject);
/// assert_eq!(options.delimiter(), ':');
///
/// assert!(ParseOptions::new('#', '#').is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    delimiter: char,
    comment: char,
    duplicate_keys: DuplicateKeys,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            comment: DEFAULT_COMMENT,
            duplicate_keys: DuplicateKeys::Overwrite,
        }
    }
}

impl ParseOptions {
    /// Creates options with the given tags.
    ///
    /// A whitespace delimiter splits each key line at its first whitespace run.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidArgument`] if the characters are equal or the
    /// comment character is whitespace.
    pub fn new(delimiter: char, comment: char) -> Result<Self> {
        check_tags(delimiter, comment)?;
        Ok(Self {
            delimiter,
            comment,
            duplicate_keys: DuplicateKeys::default(),
        })
    }

    /// Sets the duplicate key policy.
    pub fn with_duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// The delimiter.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The comment character.
    pub fn comment(&self) -> char {
        self.comment
    }

    /// The duplicate key policy.
    pub fn duplicate_keys(&self) -> DuplicateKeys {
        self.duplicate_keys
    }
}

/// Parser for the key-file format.
///
/// # Examples
///
/// ```rust
/// use tiercfg::adapters::KeyFileParser;
/// use tiercfg::ports::ConfigParser;
///
/// let parser = KeyFileParser::new();
/// let config = parser.parse(b"[Group]\nBla = 12\n", None).unwrap();
/// assert_eq!(config.get_int(Some("Group"), "Bla").unwrap(), 12);
/// ```
#[derive(Clone, Debug, Default)]
pub struct KeyFileParser {
    options: ParseOptions,
}

impl KeyFileParser {
    /// Creates a parser with `=` and `#`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with explicit options.
    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// The parser's options.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }
}

impl ConfigParser for KeyFileParser {
    fn parse(&self, bytes: &[u8], origin: Option<&Path>) -> Result<ConfigFile> {
        let mut state = ParseState {
            options: self.options,
            origin,
            source: origin.map(Arc::from),
            config: ConfigFile::with_tags_unchecked(self.options.delimiter, self.options.comment),
            group: String::new(),
            pending_comments: Vec::new(),
        };
        for (index, raw) in bytes.split(|b| *b == b'\n').enumerate() {
            let line_number = index as u64 + 1;
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = std::str::from_utf8(raw).map_err(|e| {
                ConfigError::syntax(
                    SyntaxErrorKind::Generic,
                    origin,
                    line_number,
                    format!("invalid UTF-8: {}", e),
                )
            })?;
            state.line(line, line_number)?;
        }
        state.config.set_path(origin.map(Path::to_path_buf));
        Ok(state.config)
    }
}

struct ParseState<'a> {
    options: ParseOptions,
    origin: Option<&'a Path>,
    source: Option<Arc<Path>>,
    config: ConfigFile,
    group: String,
    pending_comments: Vec<String>,
}

impl ParseState<'_> {
    fn error(&self, kind: SyntaxErrorKind, line: u64, detail: impl Into<String>) -> ConfigError {
        ConfigError::syntax(kind, self.origin, line, detail)
    }

    fn line(&mut self, line: &str, number: u64) -> Result<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        if let Some(text) = trimmed.strip_prefix(self.options.comment) {
            self.pending_comments.push(text.trim().to_string());
            return Ok(());
        }
        if trimmed.starts_with('[') {
            return self.header(trimmed, number);
        }
        self.key_line(trimmed, number)
    }

    fn header(&mut self, line: &str, number: u64) -> Result<()> {
        let close = line
            .find(']')
            .ok_or_else(|| self.error(SyntaxErrorKind::MissingBracket, number, line))?;
        let name = line[1..close].trim();
        if name.is_empty() {
            return Err(self.error(SyntaxErrorKind::EmptySectionName, number, line));
        }
        let rest = line[close + 1..].trim_start();
        if !rest.is_empty() && !rest.starts_with(self.options.comment) {
            return Err(self.error(SyntaxErrorKind::TextAfterSection, number, rest));
        }
        self.pending_comments.clear();
        self.group = name.to_string();
        self.config.group_mut(name);
        Ok(())
    }

    fn key_line(&mut self, line: &str, number: u64) -> Result<()> {
        let (content, trailing) = split_comment(line, self.options.comment);
        let (key, value) = split_delimiter(content, self.options.delimiter)
            .ok_or_else(|| self.error(SyntaxErrorKind::MissingDelimiter, number, line))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(self.error(SyntaxErrorKind::Generic, number, "missing key name"));
        }
        let value = value.trim();
        if value.is_empty() {
            return Err(self.error(SyntaxErrorKind::KeyHasNullValue, number, key));
        }
        let value = unquote(value);

        let comment_before = if self.pending_comments.is_empty() {
            None
        } else {
            Some(self.pending_comments.join("\n"))
        };
        self.pending_comments.clear();
        let comment_after = trailing.map(str::trim).filter(|c| !c.is_empty());

        let policy = self.options.duplicate_keys;
        let group = self.config.group_mut(&self.group);
        if let Some(existing) = group.get_mut(key) {
            match policy {
                DuplicateKeys::Overwrite => {}
                DuplicateKeys::Reject => {
                    return Err(ConfigError::syntax(
                        SyntaxErrorKind::Generic,
                        self.origin,
                        number,
                        format!("duplicate key '{}'", key),
                    ));
                }
                DuplicateKeys::Join => {
                    let joined = format!("{}\n{}", existing.value().as_str(), value);
                    *existing.value_mut() = ConfigValue::new(joined);
                    return Ok(());
                }
            }
        }
        let mut entry = Entry::parsed(ConfigValue::new(value.into_owned()), number, self.source.clone());
        entry.set_comments(comment_before, comment_after.map(str::to_string));
        group.insert(key.to_string(), entry);
        Ok(())
    }
}

/// Splits off a trailing comment; the comment character is literal inside quotes.
///
/// Inside quotes a backslash escapes the next character, so `\"` does not end
/// the quoted region.
fn split_comment(line: &str, comment: char) -> (&str, Option<&str>) {
    let mut in_quotes = false;
    let mut escaped = false;
    for (index, ch) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if in_quotes && ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == comment && !in_quotes {
            return (&line[..index], Some(&line[index + ch.len_utf8()..]));
        }
    }
    (line, None)
}

fn split_delimiter(content: &str, delimiter: char) -> Option<(&str, &str)> {
    if delimiter.is_whitespace() {
        let index = content.find(char::is_whitespace)?;
        Some((&content[..index], &content[index..]))
    } else {
        content.split_once(delimiter)
    }
}

/// Strips one pair of surrounding quotes and resolves `\"` and `\\` inside them.
///
/// Any other backslash is kept as written.
fn unquote(value: &str) -> Cow<'_, str> {
    if value.len() < 2 || !value.starts_with('"') || !value.ends_with('"') {
        return Cow::Borrowed(value);
    }
    let inner = &value[1..value.len() - 1];
    // an odd run of backslashes escapes the closing quote
    let trailing = inner.chars().rev().take_while(|c| *c == '\\').count();
    if trailing % 2 == 1 {
        return Cow::Borrowed(value);
    }
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\\')) => out.push(next),
            Some(next) => {
                out.push(ch);
                out.push(next);
            }
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}
