//! Main ingestion pipeline.
//!
//! Coordinates one pass over the queue:
//! 1. Fetch a batch (a failure here aborts the run)
//! 2. Per envelope: extract the body
//! 3. Transform the body into a masked record
//! 4. Persist the record
//! 5. Return totals and per-message outcomes
//!
//! Steps 2-4 are isolated per envelope: a failure is logged with replay
//! context and the next envelope is processed.

use std::fmt;

use crate::error::{FatalError, MalformedEnvelopeError, MessageError};
use crate::logging::structured::LogContext;
use crate::security::redaction::redact_for_log;
use crate::source::envelope::{MessageSource, RawEnvelope};
use crate::storage::sink::{IdempotencyStrategy, InsertOutcome, PersistenceSink};
use crate::transform::clock::Clock;
use crate::transform::record::transform_body;
use crate::{log_debug, log_error, log_info, log_warn};

use super::context::RunContext;
use super::outcome::{MessageOutcome, OutcomeKind};

/// Driver state. A run starts and ends in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Extracting,
    Transforming,
    Persisting,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Fetching => "fetching",
            RunState::Extracting => "extracting",
            RunState::Transforming => "transforming",
            RunState::Persisting => "persisting",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one run.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: String,
    pub fetched: usize,
    pub succeeded: usize,
    pub skipped_duplicate: usize,
    pub failed_malformed: usize,
    pub failed_validation: usize,
    pub failed_persistence: usize,
    pub final_state: RunState,
    pub outcomes: Vec<MessageOutcome>,
}

impl RunSummary {
    fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            fetched: 0,
            succeeded: 0,
            skipped_duplicate: 0,
            failed_malformed: 0,
            failed_validation: 0,
            failed_persistence: 0,
            final_state: RunState::Idle,
            outcomes: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failed_malformed + self.failed_validation + self.failed_persistence
    }

    fn record(&mut self, outcome: MessageOutcome) {
        match outcome.kind {
            OutcomeKind::Persisted => self.succeeded += 1,
            OutcomeKind::Duplicate => self.skipped_duplicate += 1,
            OutcomeKind::MalformedEnvelope => self.failed_malformed += 1,
            OutcomeKind::ValidationFailed => self.failed_validation += 1,
            OutcomeKind::PersistenceFailed => self.failed_persistence += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Single-pass ingestion driver.
pub struct Pipeline<'a> {
    source: &'a dyn MessageSource,
    sink: &'a mut dyn PersistenceSink,
    clock: &'a dyn Clock,
    state: RunState,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn MessageSource,
        sink: &'a mut dyn PersistenceSink,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            source,
            sink,
            clock,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn enter(&mut self, next: RunState, ctx: &LogContext) {
        log_debug!(ctx, "STATE_TRANSITION", from = self.state, to = next);
        self.state = next;
    }

    /// Run one pass: fetch one batch and process every envelope in it.
    pub async fn run_once(&mut self, run: &RunContext) -> Result<RunSummary, FatalError> {
        let ctx = run.log_context();
        let mut summary = RunSummary::new(&run.run_id);

        self.enter(RunState::Fetching, &ctx);
        let batch = match self.source.fetch_batch(&ctx).await {
            Ok(batch) => batch,
            Err(e) => {
                log_error!(ctx, "FETCH_FAILED", error = e);
                self.enter(RunState::Idle, &ctx);
                return Err(e.into());
            }
        };

        summary.fetched = batch.len();
        log_info!(ctx, "BATCH_FETCHED", messages = batch.len());

        for (index, envelope) in batch.iter().enumerate() {
            let reference = envelope.reference(index);
            let msg_ctx = run.message_context(&reference).log_context();

            let result = self.process_message(envelope, &msg_ctx).await;
            let outcome = MessageOutcome::from_result(&reference, &result);

            match &result {
                Ok(InsertOutcome::Inserted) => {
                    log_info!(msg_ctx, "MESSAGE_PERSISTED");
                }
                Ok(InsertOutcome::Duplicate) => {
                    log_info!(msg_ctx, "MESSAGE_DUPLICATE", strategy = self.sink.strategy());
                }
                Err(e) => report_failure(&msg_ctx, envelope, e),
            }

            summary.record(outcome);
        }

        self.enter(RunState::Idle, &ctx);
        summary.final_state = self.state;

        log_info!(
            ctx,
            "RUN_COMPLETE",
            fetched = summary.fetched,
            succeeded = summary.succeeded,
            duplicates = summary.skipped_duplicate,
            malformed = summary.failed_malformed,
            invalid = summary.failed_validation,
            persist_failed = summary.failed_persistence
        );

        Ok(summary)
    }

    /// Extract, transform and persist one envelope.
    async fn process_message(
        &mut self,
        envelope: &RawEnvelope,
        ctx: &LogContext,
    ) -> Result<InsertOutcome, MessageError> {
        self.enter(RunState::Extracting, ctx);
        let body = self.source.extract_body(envelope)?;
        let message_id = envelope.message_id.as_deref();
        if self.sink.strategy() == IdempotencyStrategy::MessageId && message_id.is_none() {
            return Err(MalformedEnvelopeError::MissingMessageId.into());
        }

        self.enter(RunState::Transforming, ctx);
        let record = transform_body(&body, self.clock)?;

        self.enter(RunState::Persisting, ctx);
        let outcome = self.sink.insert(&record, message_id).await?;

        Ok(outcome)
    }
}

/// Log a per-message failure with enough context to replay it.
fn report_failure(ctx: &LogContext, envelope: &RawEnvelope, error: &MessageError) {
    let receipt = envelope.receipt_handle.as_deref().unwrap_or("-");
    let body = envelope
        .body
        .as_deref()
        .map(redact_for_log)
        .unwrap_or_else(|| "-".to_string());

    match error {
        MessageError::Validation(e) => {
            log_warn!(
                ctx,
                "MESSAGE_SKIPPED",
                kind = error.kind(),
                fields = e.fields().join(","),
                error = e,
                receipt = receipt,
                body = body,
            );
        }
        _ => {
            log_warn!(
                ctx,
                "MESSAGE_SKIPPED",
                kind = error.kind(),
                error = error,
                receipt = receipt,
                body = body,
            );
        }
    }
}
