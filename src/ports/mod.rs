// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) at the seams of the crate:
//! where bytes come from, how they are parsed and how files are vetted before
//! they are read. These traits are implemented by the adapters layer.

pub mod parser;
pub mod source;
pub mod validator;

// Re-export commonly used types
pub use parser::ConfigParser;
pub use source::ConfigSource;
pub use validator::FileValidator;
