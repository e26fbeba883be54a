//! Login Ingest - single-pass login-event ingestion pipeline
//!
//! Pulls pending login events from a queue, masks the PII they carry,
//! normalizes the app version and writes one `user_logins` row per message.
//! The implementation prioritizes:
//!
//! 1. **Privacy** - IP and device id are hashed before leaving the transform,
//!    and never written to logs in the clear
//! 2. **Isolation** - one bad message never stops the rest of the batch
//! 3. **Logging** - every decision point logged with run and message context
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Run driver, outcomes, run context
//! - `source` - Queue client and envelope parsing
//! - `validation` - Typed payload decode and version normalization
//! - `transform` - Payload to output record, injectable clock
//! - `security` - PII masking and log redaction
//! - `storage` - SQL builders and the Postgres sink
//! - `config` - Environment-driven settings
//! - `logging` - Structured logging with run context
//! - `error` - Fatal and per-message error types

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod security;
pub mod source;
pub mod storage;
pub mod transform;
pub mod validation;

pub use config::Config;
pub use error::{FatalError, MessageError};
pub use pipeline::{Pipeline, RunContext, RunState, RunSummary};
