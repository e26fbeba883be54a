//! Pipeline context management.
//!
//! Provides run and message context for logging and state tracking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        let run_id = format!("run-{}", &Uuid::new_v4().to_string()[..8]);
        Self::with_id(&run_id)
    }

    pub fn with_id(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.run_id)
    }

    /// Create a message context for this run.
    pub fn message_context(&self, reference: &str) -> MessageContext {
        MessageContext {
            run_id: self.run_id.clone(),
            reference: reference.to_string(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Context for a single message within a run.
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub run_id: String,
    pub reference: String,
}

impl MessageContext {
    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.run_id).with_message(&self.reference)
    }
}
