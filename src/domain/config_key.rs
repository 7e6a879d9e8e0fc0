// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration key newtype with locale suffix support.
//!
//! Key names follow the `Name[locale]` convention for localized variants. A
//! localized key is a distinct key in its group; this type only helps taking the
//! name apart and building lookup candidates.

use std::fmt;

/// A key name within a group.
///
/// # Examples
///
/// ```
/// use tiercfg::domain::config_key::ConfigKey;
///
/// let key = ConfigKey::from("Name[de_DE]");
/// assert_eq!(key.base(), "Name");
/// assert_eq!(key.locale(), Some("de_DE"));
///
/// let plain = ConfigKey::from("Name");
/// assert_eq!(plain.locale(), None);
/// assert_eq!(plain.with_locale("fr").as_str(), "Name[fr]");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Creates a new `ConfigKey` from a `String`.
    pub fn new(key: String) -> Self {
        ConfigKey(key)
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the `ConfigKey` into its inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the key name is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn split_locale(&self) -> Option<(&str, &str)> {
        let body = self.0.strip_suffix(']')?;
        let open = body.rfind('[')?;
        let (base, locale) = (&body[..open], &body[open + 1..]);
        if base.is_empty() || locale.is_empty() {
            return None;
        }
        Some((base, locale))
    }

    /// The key name without its `[locale]` suffix.
    pub fn base(&self) -> &str {
        self.split_locale().map_or(self.0.as_str(), |(base, _)| base)
    }

    /// The locale in the `[locale]` suffix, if any.
    pub fn locale(&self) -> Option<&str> {
        self.split_locale().map(|(_, locale)| locale)
    }

    /// Returns the base name qualified with `locale`.
    pub fn with_locale(&self, locale: &str) -> ConfigKey {
        ConfigKey(format!("{}[{}]", self.base(), locale))
    }

    /// Lookup candidates for `locale`, most specific first.
    ///
    /// Encoding (`.UTF-8`) and modifier (`@euro`) parts are dropped, so
    /// `de_DE.UTF-8@euro` yields `Name[de_DE]`, `Name[de]`, `Name`.
    pub fn localized_candidates(&self, locale: &str) -> Vec<ConfigKey> {
        let trimmed = locale
            .split(['.', '@'])
            .next()
            .unwrap_or_default();
        let mut candidates = Vec::with_capacity(3);
        if !trimmed.is_empty() {
            candidates.push(self.with_locale(trimmed));
            if let Some((language, _)) = trimmed.split_once('_') {
                if !language.is_empty() {
                    candidates.push(self.with_locale(language));
                }
            }
        }
        candidates.push(ConfigKey(self.base().to_string()));
        candidates
    }
}

impl From<String> for ConfigKey {
    fn from(s: String) -> Self {
        ConfigKey(s)
    }
}

impl From<&str> for ConfigKey {
    fn from(s: &str) -> Self {
        ConfigKey(s.to_string())
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
