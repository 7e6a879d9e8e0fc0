// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered key-value configuration files.
//!
//! This crate parses line-oriented key files (`[Group]` headers, `key=value`
//! lines), resolves one logical configuration across directory tiers and drop-in
//! fragments, and merges the results into a typed, queryable handle.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: the [`ConfigFile`](domain::ConfigFile) handle, lazily coerced
//!   [`ConfigValue`](domain::ConfigValue)s, merging and the error taxonomy
//! - **Ports**: traits at the seams (`ConfigParser`, `ConfigSource`, `FileValidator`)
//! - **Adapters**: the key-file parser and writer, file and memory sources, and
//!   the unix security policy
//! - **Service**: single-source loading and the directory resolver
//!
//! # Layering
//!
//! With the default [`LayerList::system`](service::LayerList::system), resolving
//! `example` reads, lowest precedence first:
//!
//! ```text
//! /usr/etc/example.conf   /usr/etc/example.conf.d/*.conf
//! /run/example.conf       /run/example.conf.d/*.conf
//! /etc/example.conf       /etc/example.conf.d/*.conf
//! ```
//!
//! Every file is parsed on its own; the handles are then folded so that later
//! files override earlier ones key by key.
//!
//! # Errors
//!
//! Every [`ConfigError`](domain::ConfigError) maps onto a stable
//! [`ErrorCode`](domain::ErrorCode). Parse errors carry their file and line; the
//! location of the last failed load is also kept per thread, see
//! [`last_error_location`].
//!
//! # Feature Flags
//!
//! - `cli`: Build the `tiercfg` command-line tool (default)
//! - `parallel`: Read and parse candidate files in parallel with `rayon`
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use tiercfg::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = parse_bytes("[Group]\nBla = 12\nFlag = yes\n", '=', '#')?;
//!
//! assert_eq!(config.get_int(Some("Group"), "Bla")?, 12);
//! assert!(config.get_bool(Some("Group"), "Flag")?);
//! assert_eq!(config.get_int_or(Some("NoSuchGroup"), "Bla", 7)?, 7);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::location::{clear_error_location, last_error_location};
pub use service::{parse_bytes, parse_bytes_with, parse_file, parse_file_with};

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::adapters::{
        DuplicateKeys, FileSource, KeyFileParser, MemorySource, ParseOptions,
    };
    #[cfg(unix)]
    pub use crate::adapters::SecurityPolicy;
    pub use crate::domain::merge::{fold, merge};
    pub use crate::domain::{
        clear_error_location, last_error_location, ConfigError, ConfigFile, ConfigKey,
        ConfigValue, ErrorCode, FromValue, IntoValue, Result,
    };
    pub use crate::ports::{ConfigParser, ConfigSource, FileValidator};
    pub use crate::service::{
        load, parse_bytes, parse_bytes_with, parse_file, parse_file_with, DirectoryLayer,
        DirectoryResolver, LayerList, MainFilePolicy,
    };
}
