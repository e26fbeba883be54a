//! Storage module.
//!
//! SQL query builders and the persistence sink for `user_logins`.

pub mod queries;
pub mod sink;

pub use queries::*;
pub use sink::*;
