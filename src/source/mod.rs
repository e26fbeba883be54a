//! Message source module.
//!
//! Retrieves batches of raw envelopes from the queue transport:
//! - `envelope` - the envelope type and the source trait
//! - `sqs` - the HTTP queue client and its XML response parser

pub mod envelope;
pub mod sqs;

pub use envelope::*;
pub use sqs::*;
