// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer orchestrating sources, parsers and validators.
//!
//! This module provides single-source loading and the directory resolver that
//! layers vendor, runtime and administrator configuration with drop-in fragments.

pub mod dropins;
pub mod layers;
pub mod loader;
pub mod resolver;

// Re-export commonly used types
pub use layers::{DirectoryLayer, LayerList};
pub use loader::{load, parse_bytes, parse_bytes_with, parse_file, parse_file_with};
pub use resolver::{
    Candidate, CandidateKind, DirectoryResolver, MainFilePolicy, ResolverBuilder,
};
