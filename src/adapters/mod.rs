// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing implementations of the ports.
//!
//! This module contains the key-file parser and serializer, the file and memory
//! sources, and (on unix) the ownership/permission validator.

pub mod file_source;
pub mod key_file;
#[cfg(unix)]
pub mod security;
pub mod writer;

// Re-export commonly used types
pub use file_source::{FileSource, MemorySource, MAX_FILE_SIZE};
pub use key_file::{DuplicateKeys, KeyFileParser, ParseOptions};
#[cfg(unix)]
pub use security::SecurityPolicy;
