//! End-to-end run over a canned queue response, with an in-memory store.

use async_trait::async_trait;
use chrono::NaiveDate;

use login_ingest::error::{PersistenceError, SourceUnavailableError};
use login_ingest::logging::LogContext;
use login_ingest::pipeline::{OutcomeKind, Pipeline, RunContext, RunState};
use login_ingest::security::{is_masked_token, mask};
use login_ingest::source::{parse_receive_response, MessageSource, RawEnvelope};
use login_ingest::storage::{InsertOutcome, PersistenceSink};
use login_ingest::transform::{FixedClock, OutputRecord};

const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ReceiveMessageResponse>
  <ReceiveMessageResult>
    <Message>
      <MessageId>a1</MessageId>
      <ReceiptHandle>rh-a1</ReceiptHandle>
      <Body>{"user_id": "424cdd21-063a-43a7-b91b-7ca1a833afae", "app_version": "2.3.0", "device_type": "android", "ip": "199.172.111.135", "locale": "RU", "device_id": "593-47-5928"}</Body>
    </Message>
    <Message>
      <MessageId>a2</MessageId>
      <ReceiptHandle>rh-a2</ReceiptHandle>
      <Body>{"user_id": "c0173198-76a8-4e67-bfc2-74eaa3bbff57", "app_version": "0.2.6", "device_type": "ios", "ip": "241.6.88.151", "locale": "PH", "device_id": "104-25-0070"}</Body>
    </Message>
    <Message>
      <MessageId>a3</MessageId>
      <ReceiptHandle>rh-a3</ReceiptHandle>
    </Message>
    <Message>
      <MessageId>a4</MessageId>
      <ReceiptHandle>rh-a4</ReceiptHandle>
      <Body>{"user_id": "66e0635b-ce36-4ec7-aa9e-8a8fca9b83d4", "app_version": "v2.3.10", "device_type": "ios", "ip": "130.111.167.54", "locale": null, "device_id": "127-42-0862"}</Body>
    </Message>
    <Message>
      <MessageId>a5</MessageId>
      <ReceiptHandle>rh-a5</ReceiptHandle>
      <Body>{"user_id": "181452ad-20c3-4e93-86ad-1934c9248903", "app_version": "v2.3.10", "device_type": "android", "ip": "118.79.6.245", "locale": "ID", "device_id": "190-44-3099"}</Body>
    </Message>
  </ReceiveMessageResult>
</ReceiveMessageResponse>"#;

struct CannedSource(&'static str);

#[async_trait]
impl MessageSource for CannedSource {
    async fn fetch_batch(
        &self,
        _ctx: &LogContext,
    ) -> Result<Vec<RawEnvelope>, SourceUnavailableError> {
        parse_receive_response(self.0)
    }
}

#[derive(Default)]
struct MemorySink {
    rows: Vec<OutputRecord>,
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn insert(
        &mut self,
        record: &OutputRecord,
        _message_id: Option<&str>,
    ) -> Result<InsertOutcome, PersistenceError> {
        self.rows.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }
}

fn clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2024, 7, 4).unwrap())
}

#[tokio::test]
async fn test_queue_response_to_rows() {
    let source = CannedSource(RESPONSE);
    let mut sink = MemorySink::default();
    let clock = clock();

    let summary = Pipeline::new(&source, &mut sink, &clock)
        .run_once(&RunContext::with_id("run-e2e"))
        .await
        .unwrap();

    assert_eq!(summary.fetched, 5);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed_malformed, 1);
    assert_eq!(summary.failed_validation, 1);
    assert_eq!(summary.failed_persistence, 0);
    assert_eq!(summary.final_state, RunState::Idle);

    let kinds: Vec<OutcomeKind> = summary.outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![
            OutcomeKind::Persisted,
            OutcomeKind::Persisted,
            OutcomeKind::MalformedEnvelope,
            OutcomeKind::ValidationFailed,
            OutcomeKind::Persisted,
        ]
    );
    assert_eq!(summary.outcomes[3].reference, "a4");
    assert_eq!(summary.outcomes[3].fields, vec!["locale".to_string()]);

    assert_eq!(sink.rows.len(), 3);
    let first = &sink.rows[0];
    assert_eq!(first.user_id, "424cdd21-063a-43a7-b91b-7ca1a833afae");
    assert_eq!(first.app_version_numeric, 230);
    assert_eq!(first.masked_ip, mask("199.172.111.135"));
    assert_eq!(first.masked_device_id, mask("593-47-5928"));
    assert_eq!(first.ingest_date, NaiveDate::from_ymd_opt(2024, 7, 4).unwrap());

    assert_eq!(sink.rows[1].app_version_numeric, 26);
    assert_eq!(sink.rows[2].app_version_numeric, 2310);

    for row in &sink.rows {
        assert!(is_masked_token(&row.masked_ip));
        assert!(is_masked_token(&row.masked_device_id));
    }
}

#[tokio::test]
async fn test_garbage_response_is_fatal() {
    let source = CannedSource("<html><body>502 Bad Gateway</html>");
    let mut sink = MemorySink::default();
    let clock = clock();

    let result = Pipeline::new(&source, &mut sink, &clock)
        .run_once(&RunContext::new())
        .await;

    assert!(result.is_err());
    assert!(sink.rows.is_empty());
}

#[tokio::test]
async fn test_same_batch_twice_yields_identical_rows() {
    let source = CannedSource(RESPONSE);
    let mut first = MemorySink::default();
    let mut second = MemorySink::default();
    let clock = clock();

    Pipeline::new(&source, &mut first, &clock)
        .run_once(&RunContext::new())
        .await
        .unwrap();
    Pipeline::new(&source, &mut second, &clock)
        .run_once(&RunContext::new())
        .await
        .unwrap();

    assert_eq!(first.rows, second.rows);
}
