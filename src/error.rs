//! Error taxonomy for the ingestion pipeline.
//!
//! Errors split into two tiers:
//! - [`FatalError`] aborts a run before any message is processed.
//! - [`MessageError`] is scoped to one envelope; the driver records it and
//!   moves on to the next envelope.

use std::fmt;

use thiserror::Error;

/// The queue transport could not be reached or answered with a failure.
#[derive(Debug, Error)]
pub enum SourceUnavailableError {
    #[error("queue request failed: {0}")]
    Transport(String),

    #[error("queue returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("queue response could not be parsed: {0}")]
    Response(String),
}

/// An envelope lacks a structural element the pipeline requires.
#[derive(Debug, Error)]
pub enum MalformedEnvelopeError {
    #[error("envelope has no Body element")]
    MissingBody,

    #[error("envelope has no MessageId element")]
    MissingMessageId,
}

/// What is wrong with a single payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    NotAString,
    NoDigits,
    Overflow,
    NotAnObject,
    InvalidJson(String),
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing => write!(f, "missing"),
            FieldProblem::NotAString => write!(f, "not a string"),
            FieldProblem::NoDigits => write!(f, "contains no digits"),
            FieldProblem::Overflow => write!(f, "numeric value overflows i64"),
            FieldProblem::NotAnObject => write!(f, "payload is not a JSON object"),
            FieldProblem::InvalidJson(e) => write!(f, "invalid JSON: {}", e),
        }
    }
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub problem: FieldProblem,
}

impl FieldIssue {
    pub fn new(field: &str, problem: FieldProblem) -> Self {
        Self {
            field: field.to_string(),
            problem,
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// A payload failed validation. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn single(field: &str, problem: FieldProblem) -> Self {
        Self {
            issues: vec![FieldIssue::new(field, problem)],
        }
    }

    /// Names of every implicated field, in detection order.
    pub fn fields(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.field.as_str()).collect()
    }

    pub fn mentions(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "validation failed: {}", parts.join("; "))
    }
}

/// The store rejected a write.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database connection failed: {0}")]
    Connect(String),

    #[error("insert rejected: {0}")]
    Insert(String),
}

impl From<sqlx::Error> for PersistenceError {
    fn from(e: sqlx::Error) -> Self {
        PersistenceError::Insert(e.to_string())
    }
}

/// Startup configuration could not be read.
#[derive(Debug, Error)]
#[error("invalid configuration for {var}: {reason}")]
pub struct ConfigError {
    pub var: String,
    pub reason: String,
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error(transparent)]
    SourceUnavailable(#[from] SourceUnavailableError),
}

/// Errors confined to one message.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error(transparent)]
    MalformedEnvelope(#[from] MalformedEnvelopeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl MessageError {
    pub fn kind(&self) -> &'static str {
        match self {
            MessageError::MalformedEnvelope(_) => "malformed_envelope",
            MessageError::Validation(_) => "validation",
            MessageError::Persistence(_) => "persistence",
        }
    }
}
