//! Record transformation module.
//!
//! Turns a validated payload into the row shape persisted to `user_logins`.

pub mod clock;
pub mod record;

pub use clock::*;
pub use record::*;
