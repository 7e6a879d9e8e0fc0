// SPDX-License-Identifier: MIT OR Apache-2.0

//! The configuration handle.
//!
//! A [`ConfigFile`] owns an ordered mapping from group names to [`Group`]s, plus the
//! delimiter and comment characters it was parsed with and the path of its source.
//! Handles are plain owned values: they are dropped when they go out of scope and
//! are only shared through an explicit `clone` or [`merge`](crate::domain::merge::merge).
//!
//! A handle is not synchronized. Sharing one across threads for mutation needs
//! external locking (e.g. `RwLock<ConfigFile>`).
//!
//! # Groups
//!
//! Keys declared before the first `[Header]` live in the root group, whose name is
//! the empty string. Every accessor takes the group as `Option<&str>`; both `None`
//! and `Some("")` select the root group.

use crate::domain::config_key::ConfigKey;
use crate::domain::config_value::{ConfigValue, FromValue, IntoValue};
use crate::domain::errors::{ConfigError, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the root group.
pub const ROOT_GROUP: &str = "";

/// Default key/value delimiter.
pub const DEFAULT_DELIMITER: char = '=';

/// Default comment character.
pub const DEFAULT_COMMENT: char = '#';

/// Checks the tag invariants shared by handles and parse options.
pub(crate) fn check_tags(delimiter: char, comment: char) -> Result<()> {
    if delimiter == comment {
        return Err(ConfigError::invalid_argument(format!(
            "delimiter and comment must differ, both are {:?}",
            delimiter
        )));
    }
    if comment.is_whitespace() {
        return Err(ConfigError::invalid_argument(
            "comment character must not be whitespace",
        ));
    }
    Ok(())
}

fn group_name(group: Option<&str>) -> &str {
    group.unwrap_or(ROOT_GROUP)
}

/// A group name must fit between `[` and the first `]` of a header line.
fn check_group(name: &str) -> Result<()> {
    if name.trim() != name || name.contains(&[']', '\n', '\r'][..]) {
        return Err(ConfigError::invalid_argument(format!(
            "group name {:?} cannot be written as a header",
            name
        )));
    }
    Ok(())
}

/// A single key's value together with its provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    value: ConfigValue,
    line: u64,
    comment_before: Option<String>,
    comment_after: Option<String>,
    source: Option<Arc<Path>>,
}

impl Entry {
    /// Creates an entry without provenance.
    pub fn new(value: ConfigValue) -> Self {
        Self {
            value,
            line: 0,
            comment_before: None,
            comment_after: None,
            source: None,
        }
    }

    pub(crate) fn parsed(value: ConfigValue, line: u64, source: Option<Arc<Path>>) -> Self {
        Self {
            line,
            source,
            ..Self::new(value)
        }
    }

    /// The stored value.
    pub fn value(&self) -> &ConfigValue {
        &self.value
    }

    /// 1-based line in the source file, `0` for values set programmatically.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Comment lines directly above the key, without the comment characters.
    pub fn comment_before(&self) -> Option<&str> {
        self.comment_before.as_deref()
    }

    /// Comment trailing the value on the same line.
    pub fn comment_after(&self) -> Option<&str> {
        self.comment_after.as_deref()
    }

    /// The file the entry was read from.
    ///
    /// Unlike [`ConfigFile::path`] this survives merging, so a merged handle can
    /// still tell which drop-in set a key.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub(crate) fn set_comments(&mut self, before: Option<String>, after: Option<String>) {
        self.comment_before = before;
        self.comment_after = after;
    }

    pub(crate) fn value_mut(&mut self) -> &mut ConfigValue {
        &mut self.value
    }
}

/// A named set of keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    entries: IndexMap<String, Entry>,
}

impl Group {
    /// Key names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Looks up an entry.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Iterates over `(key, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the group has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or replaces an entry, keeping the position of an existing key.
    pub(crate) fn insert(&mut self, key: String, entry: Entry) -> Option<Entry> {
        self.entries.insert(key, entry)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.get_mut(key)
    }
}

/// An in-memory configuration handle.
///
/// # Examples
///
/// ```
/// use tiercfg::domain::ConfigFile;
///
/// let mut config = ConfigFile::ini();
/// config.set(Some("Group"), "Bla", 12)?;
/// config.set(None, "top", "level")?;
///
/// assert_eq!(config.get_int(Some("Group"), "Bla")?, 12);
/// assert_eq!(config.get_string(None, "top")?, "level");
/// assert_eq!(config.get_int_or(Some("Missing"), "Bla", 7)?, 7);
/// # Ok::<(), tiercfg::domain::ConfigError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigFile {
    groups: IndexMap<String, Group>,
    delimiter: char,
    comment: char,
    path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::ini()
    }
}

impl ConfigFile {
    /// Creates an empty handle with the given tags.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::InvalidArgument`] if `delimiter == comment` or the
    /// comment character is whitespace.
    pub fn new(delimiter: char, comment: char) -> Result<Self> {
        check_tags(delimiter, comment)?;
        Ok(Self::with_tags_unchecked(delimiter, comment))
    }

    /// Creates an empty handle using `=` and `#`.
    pub fn ini() -> Self {
        Self::with_tags_unchecked(DEFAULT_DELIMITER, DEFAULT_COMMENT)
    }

    pub(crate) fn with_tags_unchecked(delimiter: char, comment: char) -> Self {
        Self {
            groups: IndexMap::new(),
            delimiter,
            comment,
            path: None,
        }
    }

    /// The key/value delimiter.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The comment character.
    pub fn comment(&self) -> char {
        self.comment
    }

    /// Changes the delimiter used when the handle is written out.
    pub fn set_delimiter(&mut self, delimiter: char) -> Result<()> {
        check_tags(delimiter, self.comment)?;
        self.delimiter = delimiter;
        Ok(())
    }

    /// Changes the comment character used when the handle is written out.
    pub fn set_comment(&mut self, comment: char) -> Result<()> {
        check_tags(self.delimiter, comment)?;
        self.comment = comment;
        Ok(())
    }

    /// The source file, `None` for constructed, in-memory or merged handles.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
    }

    /// Names of all named groups, in order of first appearance.
    ///
    /// # Errors
    ///
    /// [`ConfigError::GroupNotFound`] if the handle only has the root group. The
    /// error names the root group, which is the only one present.
    pub fn group_names(&self) -> Result<Vec<&str>> {
        let names: Vec<&str> = self
            .groups
            .keys()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Err(ConfigError::GroupNotFound {
                group: String::new(),
            });
        }
        Ok(names)
    }

    /// Iterates over every group, root included, as `(name, group)`.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Group)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// Looks up a group.
    pub fn group(&self, group: Option<&str>) -> Option<&Group> {
        self.groups.get(group_name(group))
    }

    /// Whether the group exists.
    pub fn contains_group(&self, group: Option<&str>) -> bool {
        self.groups.contains_key(group_name(group))
    }

    /// Key names of a group.
    ///
    /// # Errors
    ///
    /// [`ConfigError::GroupNotFound`] if the group is missing and
    /// [`ConfigError::KeyNotFound`] if it has no keys.
    pub fn keys(&self, group: Option<&str>) -> Result<Vec<&str>> {
        let found = self.find_group(group)?;
        let keys: Vec<&str> = found.keys().collect();
        if keys.is_empty() {
            return Err(ConfigError::KeyNotFound {
                group: group_name(group).to_string(),
                key: String::new(),
            });
        }
        Ok(keys)
    }

    /// Whether `key` exists in `group`.
    pub fn contains_key(&self, group: Option<&str>, key: &str) -> bool {
        self.group(group).is_some_and(|g| g.get(key).is_some())
    }

    fn find_group(&self, group: Option<&str>) -> Result<&Group> {
        let name = group_name(group);
        self.groups
            .get(name)
            .ok_or_else(|| ConfigError::GroupNotFound {
                group: name.to_string(),
            })
    }

    /// Looks up an entry with its provenance.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyKey`] for an empty key name, then
    /// [`ConfigError::GroupNotFound`] or [`ConfigError::KeyNotFound`].
    pub fn entry(&self, group: Option<&str>, key: &str) -> Result<&Entry> {
        if key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        let found = self.find_group(group)?;
        found.get(key).ok_or_else(|| ConfigError::KeyNotFound {
            group: group_name(group).to_string(),
            key: key.to_string(),
        })
    }

    /// Looks up the raw value.
    pub fn value(&self, group: Option<&str>, key: &str) -> Result<&ConfigValue> {
        self.entry(group, key).map(Entry::value)
    }

    /// Looks up and coerces a value.
    pub fn get<T: FromValue>(&self, group: Option<&str>, key: &str) -> Result<T> {
        let value = self.value(group, key)?;
        T::from_value(value, key)
    }

    /// Like [`get`](Self::get) but returns `default` when the group or key is
    /// missing.
    ///
    /// A value that exists but fails coercion is still an error.
    ///
    /// ```
    /// use tiercfg::domain::ConfigFile;
    ///
    /// let mut config = ConfigFile::ini();
    /// config.set(Some("G"), "flag", "maybe")?;
    ///
    /// assert_eq!(config.get_or(Some("NoSuchGroup"), "k", 7i64)?, 7);
    /// assert!(config.get_or(Some("G"), "flag", false).is_err());
    /// # Ok::<(), tiercfg::domain::ConfigError>(())
    /// ```
    pub fn get_or<T: FromValue>(&self, group: Option<&str>, key: &str, default: T) -> Result<T> {
        match self.get(group, key) {
            Err(e) if e.is_absorbed_by_default() => Ok(default),
            other => other,
        }
    }

    /// Reads a signed integer.
    pub fn get_int(&self, group: Option<&str>, key: &str) -> Result<i64> {
        self.get(group, key)
    }

    /// Reads an unsigned integer.
    pub fn get_uint(&self, group: Option<&str>, key: &str) -> Result<u64> {
        self.get(group, key)
    }

    /// Reads a float.
    pub fn get_float(&self, group: Option<&str>, key: &str) -> Result<f64> {
        self.get(group, key)
    }

    /// Reads a boolean.
    pub fn get_bool(&self, group: Option<&str>, key: &str) -> Result<bool> {
        self.get(group, key)
    }

    /// Reads the text of a value.
    pub fn get_string(&self, group: Option<&str>, key: &str) -> Result<String> {
        self.get(group, key)
    }

    /// Reads a signed integer with a default.
    pub fn get_int_or(&self, group: Option<&str>, key: &str, default: i64) -> Result<i64> {
        self.get_or(group, key, default)
    }

    /// Reads an unsigned integer with a default.
    pub fn get_uint_or(&self, group: Option<&str>, key: &str, default: u64) -> Result<u64> {
        self.get_or(group, key, default)
    }

    /// Reads a float with a default.
    pub fn get_float_or(&self, group: Option<&str>, key: &str, default: f64) -> Result<f64> {
        self.get_or(group, key, default)
    }

    /// Reads a boolean with a default.
    pub fn get_bool_or(&self, group: Option<&str>, key: &str, default: bool) -> Result<bool> {
        self.get_or(group, key, default)
    }

    /// Reads the text of a value with a default.
    pub fn get_string_or(
        &self,
        group: Option<&str>,
        key: &str,
        default: impl Into<String>,
    ) -> Result<String> {
        self.get_or(group, key, default.into())
    }

    /// Reads the best match for `locale` among `key[ll_CC]`, `key[ll]` and `key`.
    ///
    /// ```
    /// use tiercfg::domain::ConfigFile;
    ///
    /// let mut config = ConfigFile::ini();
    /// config.set(Some("Desktop Entry"), "Name", "Files")?;
    /// config.set(Some("Desktop Entry"), "Name[de]", "Dateien")?;
    ///
    /// let name = config.get_localized(Some("Desktop Entry"), "Name", "de_AT.UTF-8")?;
    /// assert_eq!(name, "Dateien");
    /// let name = config.get_localized(Some("Desktop Entry"), "Name", "fr_FR")?;
    /// assert_eq!(name, "Files");
    /// # Ok::<(), tiercfg::domain::ConfigError>(())
    /// ```
    pub fn get_localized(&self, group: Option<&str>, key: &str, locale: &str) -> Result<String> {
        if key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        let found = self.find_group(group)?;
        ConfigKey::from(key)
            .localized_candidates(locale)
            .iter()
            .find_map(|candidate| found.get(candidate.as_str()))
            .map(|entry| entry.value().as_string())
            .ok_or_else(|| ConfigError::KeyNotFound {
                group: group_name(group).to_string(),
                key: key.to_string(),
            })
    }

    /// Sets a key, creating the group if needed.
    ///
    /// Overwriting keeps the key's position and comments. The entry's line and
    /// source are cleared, since the value no longer comes from that file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyKey`] for an empty key name.
    /// [`ConfigError::InvalidArgument`] if the key, group or value could not be
    /// written out and read back with this handle's tags: a key holding the
    /// delimiter, the comment character, `"` or a line break, a key starting with
    /// `[`, a group holding `]` or a line break, names with surrounding
    /// whitespace, or a value spanning several lines.
    pub fn set<V: IntoValue>(&mut self, group: Option<&str>, key: &str, value: V) -> Result<()> {
        self.check_key(key)?;
        let name = group_name(group);
        check_group(name)?;
        let value = value.into_value();
        if value.as_str().contains(&['\n', '\r'][..]) {
            return Err(ConfigError::invalid_argument(format!(
                "value for key {:?} spans several lines",
                key
            )));
        }
        let target = self.group_mut(name);
        match target.get_mut(key) {
            Some(entry) => {
                entry.value = value;
                entry.line = 0;
                entry.source = None;
            }
            None => {
                target.insert(key.to_string(), Entry::new(value));
            }
        }
        Ok(())
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        if key.trim() != key {
            return Err(ConfigError::invalid_argument(format!(
                "key {:?} has surrounding whitespace",
                key
            )));
        }
        if key.starts_with('[') {
            return Err(ConfigError::invalid_argument(format!(
                "key {:?} starts with '['",
                key
            )));
        }
        let split_on_space = self.delimiter.is_whitespace();
        let bad = key.chars().find(|&c| {
            c == self.delimiter
                || c == self.comment
                || matches!(c, '"' | '\n' | '\r')
                || (split_on_space && c.is_whitespace())
        });
        match bad {
            Some(c) => Err(ConfigError::invalid_argument(format!(
                "key {:?} contains {:?}",
                key, c
            ))),
            None => Ok(()),
        }
    }

    /// Sets a signed integer.
    pub fn set_int(&mut self, group: Option<&str>, key: &str, value: i64) -> Result<()> {
        self.set(group, key, value)
    }

    /// Sets an unsigned integer.
    pub fn set_uint(&mut self, group: Option<&str>, key: &str, value: u64) -> Result<()> {
        self.set(group, key, value)
    }

    /// Sets a float.
    pub fn set_float(&mut self, group: Option<&str>, key: &str, value: f64) -> Result<()> {
        self.set(group, key, value)
    }

    /// Sets a boolean, stored as `true` or `false`.
    pub fn set_bool(&mut self, group: Option<&str>, key: &str, value: bool) -> Result<()> {
        self.set(group, key, value)
    }

    /// Sets a string.
    pub fn set_string(&mut self, group: Option<&str>, key: &str, value: &str) -> Result<()> {
        self.set(group, key, value)
    }

    /// Removes a key and returns its entry. The group stays, even if empty.
    pub fn remove_key(&mut self, group: Option<&str>, key: &str) -> Result<Entry> {
        if key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        let name = group_name(group);
        let found = self
            .groups
            .get_mut(name)
            .ok_or_else(|| ConfigError::GroupNotFound {
                group: name.to_string(),
            })?;
        found
            .entries
            .shift_remove(key)
            .ok_or_else(|| ConfigError::KeyNotFound {
                group: name.to_string(),
                key: key.to_string(),
            })
    }

    /// Total number of keys across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Group::len).sum()
    }

    /// Whether the handle holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over `(group, key, value)` in group order, then key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ConfigValue)> {
        self.groups.iter().flat_map(|(group, g)| {
            g.iter()
                .map(move |(key, entry)| (group.as_str(), key, entry.value()))
        })
    }

    /// Owned `(group, key, text)` triples, sorted.
    ///
    /// Two handles with equal triples hold the same configuration, regardless of
    /// line order or provenance.
    pub fn triples(&self) -> Vec<(String, String, String)> {
        let mut triples: Vec<_> = self
            .iter()
            .map(|(g, k, v)| (g.to_string(), k.to_string(), v.as_string()))
            .collect();
        triples.sort();
        triples
    }

    /// Returns the group, creating it at the end if missing.
    pub(crate) fn group_mut(&mut self, name: &str) -> &mut Group {
        self.groups.entry(name.to_string()).or_default()
    }
}
