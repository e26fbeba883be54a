//! Raw envelopes and the source abstraction.

use async_trait::async_trait;

use crate::error::{MalformedEnvelopeError, SourceUnavailableError};
use crate::logging::structured::LogContext;

/// One queue message as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEnvelope {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
}

impl RawEnvelope {
    /// Envelope carrying only a body.
    pub fn with_body(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            ..Self::default()
        }
    }

    /// Reference used in logs: the message id, or the position in the batch.
    pub fn reference(&self, index: usize) -> String {
        match &self.message_id {
            Some(id) => id.clone(),
            None => format!("#{}", index),
        }
    }
}

/// Pulls batches of envelopes from a queue.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch the currently pending messages, in arrival order.
    ///
    /// An empty queue yields an empty batch, not an error.
    async fn fetch_batch(
        &self,
        ctx: &LogContext,
    ) -> Result<Vec<RawEnvelope>, SourceUnavailableError>;

    /// Payload text of one envelope.
    fn extract_body(&self, envelope: &RawEnvelope) -> Result<String, MalformedEnvelopeError> {
        extract_body(envelope)
    }
}

pub fn extract_body(envelope: &RawEnvelope) -> Result<String, MalformedEnvelopeError> {
    envelope
        .body
        .clone()
        .ok_or(MalformedEnvelopeError::MissingBody)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_body() {
        let envelope = RawEnvelope::with_body(r#"{"a":1}"#);
        assert_eq!(extract_body(&envelope).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_extract_missing_body() {
        let envelope = RawEnvelope {
            message_id: Some("m-1".to_string()),
            ..RawEnvelope::default()
        };
        assert!(matches!(
            extract_body(&envelope),
            Err(MalformedEnvelopeError::MissingBody)
        ));
    }

    #[test]
    fn test_empty_body_is_present() {
        let envelope = RawEnvelope::with_body("");
        assert_eq!(extract_body(&envelope).unwrap(), "");
    }

    #[test]
    fn test_reference() {
        let envelope = RawEnvelope {
            message_id: Some("m-9".to_string()),
            ..RawEnvelope::default()
        };
        assert_eq!(envelope.reference(3), "m-9");
        assert_eq!(RawEnvelope::default().reference(3), "#3");
    }
}
