//! Payload validation module.
//!
//! Provides the typed decode of a message body and the numeric
//! normalization of version strings.

pub mod payload;
pub mod version;

pub use payload::*;
pub use version::*;
