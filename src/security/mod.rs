//! Security module.
//!
//! Provides one-way masking of PII fields and redaction of raw PII from
//! log output.

pub mod masking;
pub mod redaction;

pub use masking::*;
pub use redaction::*;
