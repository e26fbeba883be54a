//! Per-message outcome classification.

use crate::error::MessageError;
use crate::storage::sink::InsertOutcome;

/// Where a message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Persisted,
    Duplicate,
    MalformedEnvelope,
    ValidationFailed,
    PersistenceFailed,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Persisted => "persisted",
            OutcomeKind::Duplicate => "duplicate",
            OutcomeKind::MalformedEnvelope => "malformed_envelope",
            OutcomeKind::ValidationFailed => "validation_failed",
            OutcomeKind::PersistenceFailed => "persistence_failed",
        }
    }
}

/// Result of processing one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome {
    pub reference: String,
    pub kind: OutcomeKind,
    pub reason: Option<String>,
    /// Payload fields implicated in a validation failure.
    pub fields: Vec<String>,
}

impl MessageOutcome {
    pub fn from_result(reference: &str, result: &Result<InsertOutcome, MessageError>) -> Self {
        let (kind, reason, fields) = match result {
            Ok(InsertOutcome::Inserted) => (OutcomeKind::Persisted, None, Vec::new()),
            Ok(InsertOutcome::Duplicate) => (OutcomeKind::Duplicate, None, Vec::new()),
            Err(MessageError::MalformedEnvelope(e)) => {
                (OutcomeKind::MalformedEnvelope, Some(e.to_string()), Vec::new())
            }
            Err(MessageError::Validation(e)) => (
                OutcomeKind::ValidationFailed,
                Some(e.to_string()),
                e.fields().into_iter().map(str::to_string).collect(),
            ),
            Err(MessageError::Persistence(e)) => {
                (OutcomeKind::PersistenceFailed, Some(e.to_string()), Vec::new())
            }
        };

        Self {
            reference: reference.to_string(),
            kind,
            reason,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FieldProblem, MalformedEnvelopeError, PersistenceError, ValidationError};

    #[test]
    fn test_success_outcomes() {
        let outcome = MessageOutcome::from_result("m-1", &Ok(InsertOutcome::Inserted));
        assert_eq!(outcome.kind, OutcomeKind::Persisted);
        assert!(outcome.reason.is_none());

        let outcome = MessageOutcome::from_result("m-1", &Ok(InsertOutcome::Duplicate));
        assert_eq!(outcome.kind, OutcomeKind::Duplicate);
    }

    #[test]
    fn test_validation_outcome_names_fields() {
        let err = ValidationError::single("locale", FieldProblem::Missing);
        let outcome = MessageOutcome::from_result("m-2", &Err(err.into()));
        assert_eq!(outcome.kind, OutcomeKind::ValidationFailed);
        assert_eq!(outcome.fields, vec!["locale".to_string()]);
    }

    #[test]
    fn test_failure_kinds() {
        let outcome = MessageOutcome::from_result(
            "#0",
            &Err(MalformedEnvelopeError::MissingBody.into()),
        );
        assert_eq!(outcome.kind.as_str(), "malformed_envelope");

        let outcome = MessageOutcome::from_result(
            "#1",
            &Err(PersistenceError::Insert("constraint".to_string()).into()),
        );
        assert_eq!(outcome.kind.as_str(), "persistence_failed");
        assert_eq!(outcome.reason.as_deref(), Some("insert rejected: constraint"));
    }
}
