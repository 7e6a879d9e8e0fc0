// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration value type with lazy, type-safe conversions.
//!
//! A [`ConfigValue`] always keeps its authoritative text. Typed forms are derived
//! on demand when an accessor asks for them, never at parse time, so a file with
//! a syntactically valid but type-mismatched value loads fine and only fails when
//! the wrong accessor is used. The first successful numeric or boolean coercion
//! is cached.

use crate::domain::errors::{ConfigError, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;
use thiserror::Error;

/// The type a value is coerced to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Signed 64-bit integer.
    Int,
    /// Unsigned 64-bit integer.
    UInt,
    /// Double precision float.
    Float,
    /// Boolean.
    Bool,
    /// Plain text.
    String,
}

impl ValueKind {
    /// Human readable type name used in conversion errors.
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Int => "i64",
            ValueKind::UInt => "u64",
            ValueKind::Float => "f64",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
        }
    }
}

/// A coerced value.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Text.
    String(String),
}

impl TypedValue {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Int(_) => ValueKind::Int,
            TypedValue::UInt(_) => ValueKind::UInt,
            TypedValue::Float(_) => ValueKind::Float,
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::String(_) => ValueKind::String,
        }
    }
}

/// Why an integer literal was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegerError {
    /// No digits at all.
    #[error("empty number")]
    Empty,
    /// A sign in the wrong place.
    #[error("misplaced sign")]
    InvalidSign,
    /// A minus sign on an unsigned target.
    #[error("negative value for unsigned type")]
    Negative,
    /// The value does not fit the target type.
    #[error("number out of range")]
    OutOfRange,
    /// Invalid digits for the detected radix.
    #[error(transparent)]
    Digits(#[from] ParseIntError),
}

/// A finite float that overflows `f32`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("number out of range for f32")]
pub struct FloatRangeError;

/// Splits sign and C-style radix prefix: `0x`/`0X` is hex, a leading `0` octal.
fn split_integer(text: &str) -> std::result::Result<(bool, &str, u32), IntegerError> {
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        Some(_) => (false, text),
        None => return Err(IntegerError::Empty),
    };
    let (digits, radix) =
        if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            (hex, 16)
        } else if rest.len() > 1 && rest.starts_with('0') {
            (&rest[1..], 8)
        } else {
            (rest, 10)
        };
    if digits.is_empty() {
        return Err(IntegerError::Empty);
    }
    // from_str_radix would accept a second sign
    if digits.starts_with('+') || digits.starts_with('-') {
        return Err(IntegerError::InvalidSign);
    }
    Ok((negative, digits, radix))
}

fn widen(err: ParseIntError) -> IntegerError {
    match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => IntegerError::OutOfRange,
        _ => IntegerError::Digits(err),
    }
}

/// Parses a signed 64-bit integer with C-style radix prefixes.
pub(crate) fn parse_i64(text: &str) -> std::result::Result<i64, IntegerError> {
    let (negative, digits, radix) = split_integer(text)?;
    let magnitude = u64::from_str_radix(digits, radix).map_err(widen)? as i128;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map_err(|_| IntegerError::OutOfRange)
}

/// Parses an unsigned 64-bit integer with C-style radix prefixes.
pub(crate) fn parse_u64(text: &str) -> std::result::Result<u64, IntegerError> {
    let (negative, digits, radix) = split_integer(text)?;
    if negative {
        return Err(IntegerError::Negative);
    }
    u64::from_str_radix(digits, radix).map_err(widen)
}

/// Parses a boolean literal: `true/false`, `yes/no`, `1/0`, case-insensitive.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// A configuration value: raw text plus a lazily filled typed cache.
///
/// Two values are equal when their text is equal; the cache is invisible.
///
/// # Examples
///
/// ```
/// use tiercfg::domain::config_value::ConfigValue;
///
/// let value = ConfigValue::from("0x10");
/// assert_eq!(value.as_str(), "0x10");
/// assert_eq!(value.as_i64("Group.key").unwrap(), 16);
/// assert!(value.as_bool("Group.key").is_err());
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigValue {
    raw: String,
    #[serde(skip)]
    cached: OnceCell<TypedValue>,
}

impl ConfigValue {
    /// Creates a new `ConfigValue` from a `String`.
    pub fn new(raw: String) -> Self {
        Self {
            raw,
            cached: OnceCell::new(),
        }
    }

    /// Returns the authoritative text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns a copy of the text.
    pub fn as_string(&self) -> String {
        self.raw.clone()
    }

    /// Whether a typed form has been cached.
    pub fn is_cached(&self) -> bool {
        self.cached.get().is_some()
    }

    /// Coerces the text to `kind`.
    ///
    /// `key` only names the value in error messages. Numeric failures yield
    /// [`ConfigError::TypeConversion`], boolean failures
    /// [`ConfigError::WrongBooleanValue`].
    pub fn coerce(&self, kind: ValueKind, key: &str) -> Result<TypedValue> {
        Ok(match kind {
            ValueKind::Int => TypedValue::Int(self.as_i64(key)?),
            ValueKind::UInt => TypedValue::UInt(self.as_u64(key)?),
            ValueKind::Float => TypedValue::Float(self.as_f64(key)?),
            ValueKind::Bool => TypedValue::Bool(self.as_bool(key)?),
            ValueKind::String => TypedValue::String(self.as_string()),
        })
    }

    /// Converts the value to an `i64`.
    pub fn as_i64(&self, key: &str) -> Result<i64> {
        if let Some(TypedValue::Int(v)) = self.cached.get() {
            return Ok(*v);
        }
        let v = parse_i64(&self.raw)
            .map_err(|e| self.conversion_error(key, ValueKind::Int.type_name(), e))?;
        self.remember(TypedValue::Int(v));
        Ok(v)
    }

    /// Converts the value to a `u64`.
    pub fn as_u64(&self, key: &str) -> Result<u64> {
        if let Some(TypedValue::UInt(v)) = self.cached.get() {
            return Ok(*v);
        }
        let v = parse_u64(&self.raw)
            .map_err(|e| self.conversion_error(key, ValueKind::UInt.type_name(), e))?;
        self.remember(TypedValue::UInt(v));
        Ok(v)
    }

    /// Converts the value to an `f64`.
    pub fn as_f64(&self, key: &str) -> Result<f64> {
        if let Some(TypedValue::Float(v)) = self.cached.get() {
            return Ok(*v);
        }
        let v = self
            .raw
            .parse::<f64>()
            .map_err(|e| self.conversion_error(key, ValueKind::Float.type_name(), e))?;
        self.remember(TypedValue::Float(v));
        Ok(v)
    }

    /// Converts the value to a boolean.
    ///
    /// # Examples
    ///
    /// ```
    /// use tiercfg::domain::config_value::ConfigValue;
    ///
    /// assert!(ConfigValue::from("YES").as_bool("k").unwrap());
    /// assert!(!ConfigValue::from("0").as_bool("k").unwrap());
    /// assert!(ConfigValue::from("maybe").as_bool("k").is_err());
    /// ```
    pub fn as_bool(&self, key: &str) -> Result<bool> {
        if let Some(TypedValue::Bool(v)) = self.cached.get() {
            return Ok(*v);
        }
        let v = parse_bool(&self.raw).ok_or_else(|| ConfigError::WrongBooleanValue {
            key: key.to_string(),
            value: self.raw.clone(),
        })?;
        self.remember(TypedValue::Bool(v));
        Ok(v)
    }

    // only the first coercion wins the cache slot
    fn remember(&self, typed: TypedValue) {
        let _ = self.cached.set(typed);
    }

    /// Parses the value into any type that implements `FromStr`.
    pub fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.raw
            .parse::<T>()
            .map_err(|e| self.conversion_error(key, std::any::type_name::<T>(), e))
    }

    fn conversion_error<E>(&self, key: &str, target_type: &'static str, err: E) -> ConfigError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfigError::TypeConversion {
            key: key.to_string(),
            value: self.raw.clone(),
            target_type,
            source: Box::new(err),
        }
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ConfigValue {}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfigValue").field(&self.raw).finish()
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::new(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::new(s.to_string())
    }
}

impl From<ConfigValue> for String {
    fn from(value: ConfigValue) -> Self {
        value.raw
    }
}

impl AsRef<str> for ConfigValue {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Types that a [`ConfigValue`] can be coerced into.
pub trait FromValue: Sized {
    /// Performs the coercion; `key` names the value in errors.
    fn from_value(value: &ConfigValue, key: &str) -> Result<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &ConfigValue, key: &str) -> Result<Self> {
        value.as_i64(key)
    }
}

impl FromValue for i32 {
    fn from_value(value: &ConfigValue, key: &str) -> Result<Self> {
        let wide = value.as_i64(key)?;
        i32::try_from(wide).map_err(|e| value.conversion_error(key, "i32", e))
    }
}

impl FromValue for u64 {
    fn from_value(value: &ConfigValue, key: &str) -> Result<Self> {
        value.as_u64(key)
    }
}

impl FromValue for u32 {
    fn from_value(value: &ConfigValue, key: &str) -> Result<Self> {
        let wide = value.as_u64(key)?;
        u32::try_from(wide).map_err(|e| value.conversion_error(key, "u32", e))
    }
}

impl FromValue for f64 {
    fn from_value(value: &ConfigValue, key: &str) -> Result<Self> {
        value.as_f64(key)
    }
}

impl FromValue for f32 {
    fn from_value(value: &ConfigValue, key: &str) -> Result<Self> {
        let wide = value.as_f64(key)?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(value.conversion_error(key, "f32", FloatRangeError));
        }
        Ok(narrow)
    }
}

impl FromValue for bool {
    fn from_value(value: &ConfigValue, key: &str) -> Result<Self> {
        value.as_bool(key)
    }
}

impl FromValue for String {
    fn from_value(value: &ConfigValue, _key: &str) -> Result<Self> {
        Ok(value.as_string())
    }
}

/// Types that can be stored with [`ConfigFile::set`](crate::domain::ConfigFile::set).
///
/// Numbers are formatted as locale-independent decimal, booleans as lowercase
/// `true`/`false`.
pub trait IntoValue {
    /// Formats `self` as canonical text.
    fn into_value(self) -> ConfigValue;
}

macro_rules! into_value_display {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> ConfigValue {
                    ConfigValue::new(self.to_string())
                }
            }
        )*
    };
}

into_value_display!(i64, i32, u64, u32, f64, f32, bool, String, &str);

impl IntoValue for ConfigValue {
    fn into_value(self) -> ConfigValue {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_value_new() {
        let value = ConfigValue::new("test".to_string());
        assert_eq!(value.as_str(), "test");
        assert!(!value.is_cached());
    }

    #[test]
    fn test_bool_literals() {
        for text in ["true", "TRUE", "True", "yes", "YeS", "1"] {
            assert!(ConfigValue::from(text).as_bool("k").unwrap(), "{}", text);
        }
        for text in ["false", "FALSE", "no", "No", "0"] {
            assert!(!ConfigValue::from(text).as_bool("k").unwrap(), "{}", text);
        }
    }

    #[test]
    fn test_bool_rejects_other_words() {
        for text in ["maybe", "on", "off", "", "2", "truee"] {
            let err = ConfigValue::from(text).as_bool("k").unwrap_err();
            assert!(
                matches!(err, ConfigError::WrongBooleanValue { .. }),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_int_radix_prefixes() {
        assert_eq!(ConfigValue::from("42").as_i64("k").unwrap(), 42);
        assert_eq!(ConfigValue::from("-42").as_i64("k").unwrap(), -42);
        assert_eq!(ConfigValue::from("+7").as_i64("k").unwrap(), 7);
        assert_eq!(ConfigValue::from("0x1F").as_i64("k").unwrap(), 31);
        assert_eq!(ConfigValue::from("010").as_i64("k").unwrap(), 8);
        assert_eq!(ConfigValue::from("0").as_i64("k").unwrap(), 0);
    }

    #[test]
    fn test_int_limits() {
        assert_eq!(
            ConfigValue::from("9223372036854775807").as_i64("k").unwrap(),
            i64::MAX
        );
        assert_eq!(
            ConfigValue::from("-9223372036854775808").as_i64("k").unwrap(),
            i64::MIN
        );
        assert!(ConfigValue::from("9223372036854775808").as_i64("k").is_err());
        assert_eq!(
            ConfigValue::from("18446744073709551615").as_u64("k").unwrap(),
            u64::MAX
        );
        assert!(ConfigValue::from("18446744073709551616").as_u64("k").is_err());
    }

    #[test]
    fn test_int_rejects_garbage() {
        for text in ["", "-", "12abc", "3.14", "--1", "+-1", "0x", "09"] {
            let err = ConfigValue::from(text).as_i64("k").unwrap_err();
            assert!(
                matches!(err, ConfigError::TypeConversion { .. }),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_uint_rejects_negative() {
        let err = ConfigValue::from("-1").as_u64("k").unwrap_err();
        assert_eq!(err.code(), crate::domain::errors::ErrorCode::ParseError);
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_float() {
        assert_eq!(ConfigValue::from("3.14").as_f64("k").unwrap(), 3.14);
        assert_eq!(ConfigValue::from("-1e3").as_f64("k").unwrap(), -1000.0);
        assert!(ConfigValue::from("pi").as_f64("k").is_err());
    }

    #[test]
    fn test_cache_is_filled_and_reused() {
        let value = ConfigValue::from("1");
        assert!(value.as_bool("k").unwrap());
        assert!(value.is_cached());
        // a different kind is still computed
        assert_eq!(value.as_i64("k").unwrap(), 1);
        assert_eq!(
            value.coerce(ValueKind::Bool, "k").unwrap(),
            TypedValue::Bool(true)
        );
    }

    #[test]
    fn test_narrowing_overflow() {
        let value = ConfigValue::from("4294967296");
        assert!(u32::from_value(&value, "k").is_err());
        assert_eq!(u64::from_value(&value, "k").unwrap(), 4_294_967_296);
        assert!(i32::from_value(&ConfigValue::from("-2147483649"), "k").is_err());

        let huge = ConfigValue::from("1e300");
        let err = f32::from_value(&huge, "k").unwrap_err();
        assert_eq!(err.code(), crate::domain::errors::ErrorCode::ParseError);
        assert_eq!(f64::from_value(&huge, "k").unwrap(), 1e300);
        assert!(f32::from_value(&ConfigValue::from("inf"), "k")
            .unwrap()
            .is_infinite());
        assert_eq!(f32::from_value(&ConfigValue::from("0.5"), "k").unwrap(), 0.5);
    }

    #[test]
    fn test_equality_ignores_cache() {
        let a = ConfigValue::from("5");
        let b = ConfigValue::from("5");
        a.as_i64("k").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, ConfigValue::from("6"));
    }

    #[test]
    fn test_into_value_canonical_text() {
        assert_eq!(true.into_value().as_str(), "true");
        assert_eq!((-5i64).into_value().as_str(), "-5");
        assert_eq!(2.5f64.into_value().as_str(), "2.5");
        assert_eq!("x".into_value().as_str(), "x");
    }

    #[test]
    fn test_parse_custom_type() {
        let value = ConfigValue::from("127.0.0.1");
        let ip: std::net::IpAddr = value.parse("k").unwrap();
        assert_eq!(ip.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_serde_transparent() {
        fn assert_serialize<T: Serialize>() {}
        assert_serialize::<ConfigValue>();
    }
}
