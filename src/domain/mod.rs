// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types and logic.
//!
//! This module contains the configuration handle, the lazily coerced value model,
//! the merge algorithm and the error taxonomy. It performs no I/O.

pub mod config_file;
pub mod config_key;
pub mod config_value;
pub mod errors;
pub mod location;
pub mod merge;

// Re-export commonly used types
pub use config_file::{ConfigFile, Entry, Group, ROOT_GROUP};
pub use config_key::ConfigKey;
pub use config_value::{ConfigValue, FromValue, IntoValue, TypedValue, ValueKind};
pub use errors::{ConfigError, ErrorCategory, ErrorCode, ErrorLocation, Result};
pub use location::{clear_error_location, last_error_location};
