//! Structured logging with run context.
//!
//! Every log line carries the run id, and the message reference when one
//! exists, so a failed message can be replayed from the log alone.

pub mod structured;

pub use structured::*;

/// Initialize the process-wide logger.
///
/// Defaults to `info`; `RUST_LOG` overrides. Safe to call more than once.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
