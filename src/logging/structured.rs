//! Structured logging utilities.
//!
//! Provides context-aware logging with run_id and message reference included
//! in every log message.

use std::fmt;

/// Logging context for one pipeline run.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub message_ref: Option<String>,
}

impl LogContext {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            message_ref: None,
        }
    }

    pub fn with_message(&self, message_ref: &str) -> Self {
        Self {
            run_id: self.run_id.clone(),
            message_ref: Some(message_ref.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message_ref {
            Some(mref) => write!(f, "[run={}] [msg={}]", self.run_id, mref),
            None => write!(f, "[run={}]", self.run_id),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::info!(
            concat!("{} {}", $(" ", stringify!($key), "={}"),*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::warn!(
            concat!("{} {}", $(" ", stringify!($key), "={}"),*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::error!(
            concat!("{} {}", $(" ", stringify!($key), "={}"),*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::debug!(
            concat!("{} {}", $(" ", stringify!($key), "={}"),*),
            $ctx,
            $event
            $(, $value)*
        )
    };
}
