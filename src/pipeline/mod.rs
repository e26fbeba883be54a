//! Pipeline orchestration module.
//!
//! One run = one pass over one fetched batch:
//! - Fetch the batch from the message source
//! - Extract each envelope body
//! - Transform the body into a masked record
//! - Persist the record
//! - Report per-message outcomes and run totals

pub mod context;
pub mod driver;
pub mod outcome;

pub use context::*;
pub use driver::*;
pub use outcome::*;
