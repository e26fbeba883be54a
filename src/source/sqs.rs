//! Queue client speaking the SQS query protocol.
//!
//! A receive is a form-encoded POST of `Action=ReceiveMessage` to the queue
//! URL. The answer is an XML document holding zero or more `Message`
//! elements, each with `MessageId`, `ReceiptHandle` and `Body` children.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

use crate::config::QueueConfig;
use crate::error::SourceUnavailableError;
use crate::log_info;
use crate::logging::structured::LogContext;
use crate::security::redaction::truncate_at_char_boundary;

use super::envelope::{MessageSource, RawEnvelope};

/// Longest error-response body carried into an error, in bytes.
const MAX_ERROR_BODY: usize = 512;

/// HTTP queue source.
pub struct SqsQueueSource {
    config: QueueConfig,
    http_client: Client,
}

impl SqsQueueSource {
    pub fn new(config: QueueConfig) -> Result<Self, SourceUnavailableError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SourceUnavailableError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl MessageSource for SqsQueueSource {
    async fn fetch_batch(
        &self,
        ctx: &LogContext,
    ) -> Result<Vec<RawEnvelope>, SourceUnavailableError> {
        let response = self
            .http_client
            .post(&self.config.url)
            .form(&receive_params(&self.config))
            .send()
            .await
            .map_err(|e| SourceUnavailableError::Transport(e.to_string()))?;

        let status = response.status();
        log_info!(
            ctx,
            "QUEUE_RESPONSE",
            url = self.config.url,
            status = status.as_u16()
        );

        let text = response
            .text()
            .await
            .map_err(|e| SourceUnavailableError::Transport(e.to_string()))?;

        if !status.is_success() {
            let mut body = text;
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(SourceUnavailableError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_receive_response(&text)
    }
}

/// Form parameters of a receive request.
pub fn receive_params(config: &QueueConfig) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("Action", "ReceiveMessage".to_string()),
        ("MaxNumberOfMessages", config.max_messages.to_string()),
    ];
    if let Some(v) = config.visibility_timeout_secs {
        params.push(("VisibilityTimeout", v.to_string()));
    }
    if let Some(w) = config.wait_time_secs {
        params.push(("WaitTimeSeconds", w.to_string()));
    }
    params
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    MessageId,
    ReceiptHandle,
    Body,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"MessageId" => Some(Field::MessageId),
            b"ReceiptHandle" => Some(Field::ReceiptHandle),
            b"Body" => Some(Field::Body),
            _ => None,
        }
    }

    fn slot<'a>(&self, envelope: &'a mut RawEnvelope) -> &'a mut Option<String> {
        match self {
            Field::MessageId => &mut envelope.message_id,
            Field::ReceiptHandle => &mut envelope.receipt_handle,
            Field::Body => &mut envelope.body,
        }
    }
}

/// Parse a receive response into envelopes, in document order.
///
/// Only direct children of a `Message` are captured; nested elements such as
/// message attributes are skipped. Anything other than a single well-formed
/// root element (an empty reply, a plain-text error page, a JSON body) means
/// the transport answered with something other than a queue response.
pub fn parse_receive_response(xml: &str) -> Result<Vec<RawEnvelope>, SourceUnavailableError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut envelopes = Vec::new();
    let mut current: Option<RawEnvelope> = None;
    // Depth relative to the open Message element.
    let mut depth = 0usize;
    let mut field: Option<Field> = None;
    // Open elements in the whole document.
    let mut doc_depth = 0usize;
    let mut root_seen = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            SourceUnavailableError::Response(format!(
                "XML error at position {}: {}",
                reader.error_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => {
                if doc_depth == 0 {
                    check_single_root(&mut root_seen)?;
                }
                doc_depth += 1;

                let name = e.local_name();
                if let Some(envelope) = current.as_mut() {
                    depth += 1;
                    if depth == 1 {
                        field = Field::from_tag(name.as_ref());
                        if let Some(f) = field {
                            *f.slot(envelope) = Some(String::new());
                        }
                    }
                } else if name.as_ref() == b"Message" {
                    current = Some(RawEnvelope::default());
                    depth = 0;
                }
            }
            Event::Empty(e) => {
                if doc_depth == 0 {
                    check_single_root(&mut root_seen)?;
                }

                if let Some(envelope) = current.as_mut() {
                    if depth == 0 {
                        if let Some(f) = Field::from_tag(e.local_name().as_ref()) {
                            *f.slot(envelope) = Some(String::new());
                        }
                    }
                } else if e.local_name().as_ref() == b"Message" {
                    envelopes.push(RawEnvelope::default());
                }
            }
            Event::Text(t) => {
                if doc_depth == 0 {
                    return Err(SourceUnavailableError::Response(
                        "text outside the root element".to_string(),
                    ));
                }
                if let (Some(envelope), Some(f)) = (current.as_mut(), field) {
                    if depth == 1 {
                        let text = t.unescape().map_err(|e| {
                            SourceUnavailableError::Response(format!("bad text: {}", e))
                        })?;
                        f.slot(envelope).get_or_insert_with(String::new).push_str(&text);
                    }
                }
            }
            Event::CData(c) => {
                if doc_depth == 0 {
                    return Err(SourceUnavailableError::Response(
                        "CDATA outside the root element".to_string(),
                    ));
                }
                if let (Some(envelope), Some(f)) = (current.as_mut(), field) {
                    if depth == 1 {
                        let bytes = c.into_inner();
                        f.slot(envelope)
                            .get_or_insert_with(String::new)
                            .push_str(&String::from_utf8_lossy(&bytes));
                    }
                }
            }
            Event::End(_) => {
                doc_depth = doc_depth.saturating_sub(1);
                if current.is_some() {
                    if depth == 0 {
                        if let Some(envelope) = current.take() {
                            envelopes.push(envelope);
                        }
                    } else {
                        if depth == 1 {
                            field = None;
                        }
                        depth -= 1;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(SourceUnavailableError::Response(
            "response has no root element".to_string(),
        ));
    }
    if doc_depth > 0 || current.is_some() {
        return Err(SourceUnavailableError::Response(
            "document ended inside an open element".to_string(),
        ));
    }

    Ok(envelopes)
}

fn check_single_root(root_seen: &mut bool) -> Result<(), SourceUnavailableError> {
    if *root_seen {
        return Err(SourceUnavailableError::Response(
            "more than one root element".to_string(),
        ));
    }
    *root_seen = true;
    Ok(())
}
