//! Persistence sink for output records.
//!
//! Each insert is a single auto-committed statement. The sink owns its
//! connection for the whole run; [`PgSink::close`] hands it back to the
//! server, and dropping the sink closes it as well.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{Connection, PgConnection};

use crate::config::DatabaseConfig;
use crate::error::PersistenceError;
use crate::log_info;
use crate::logging::structured::LogContext;
use crate::transform::record::OutputRecord;

use super::queries::build_user_login_insert;

/// How repeated deliveries of one message are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdempotencyStrategy {
    /// Every delivery appends a row.
    #[default]
    Append,
    /// Rows are keyed by queue message id; repeats are skipped.
    MessageId,
}

impl IdempotencyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdempotencyStrategy::Append => "append",
            IdempotencyStrategy::MessageId => "message-id",
        }
    }
}

impl fmt::Display for IdempotencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdempotencyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "append" | "none" => Ok(IdempotencyStrategy::Append),
            "message-id" | "message_id" => Ok(IdempotencyStrategy::MessageId),
            other => Err(format!(
                "unknown strategy '{}', expected 'append' or 'message-id'",
                other
            )),
        }
    }
}

/// What an insert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same idempotency key already existed.
    Duplicate,
}

/// Durable store for output records.
#[async_trait]
pub trait PersistenceSink: Send {
    fn strategy(&self) -> IdempotencyStrategy {
        IdempotencyStrategy::Append
    }

    /// Write one record. `message_id` is the idempotency key when the
    /// strategy uses one.
    async fn insert(
        &mut self,
        record: &OutputRecord,
        message_id: Option<&str>,
    ) -> Result<InsertOutcome, PersistenceError>;
}

/// Postgres sink over a single owned connection.
pub struct PgSink {
    conn: PgConnection,
    strategy: IdempotencyStrategy,
    insert_sql: String,
}

impl PgSink {
    /// Open the connection, bounded by the configured timeout.
    pub async fn connect(
        config: &DatabaseConfig,
        strategy: IdempotencyStrategy,
        ctx: &LogContext,
    ) -> Result<Self, PersistenceError> {
        let conn = tokio::time::timeout(config.connect_timeout, PgConnection::connect(&config.url))
            .await
            .map_err(|_| {
                PersistenceError::Connect(format!(
                    "timed out after {}s",
                    config.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| PersistenceError::Connect(e.to_string()))?;

        log_info!(ctx, "DB_CONNECTED", strategy = strategy);

        Ok(Self {
            conn,
            strategy,
            insert_sql: build_user_login_insert(strategy),
        })
    }

    /// Close the connection gracefully.
    pub async fn close(self, ctx: &LogContext) -> Result<(), PersistenceError> {
        self.conn
            .close()
            .await
            .map_err(|e| PersistenceError::Connect(e.to_string()))?;
        log_info!(ctx, "DB_CLOSED");
        Ok(())
    }
}

#[async_trait]
impl PersistenceSink for PgSink {
    fn strategy(&self) -> IdempotencyStrategy {
        self.strategy
    }

    async fn insert(
        &mut self,
        record: &OutputRecord,
        message_id: Option<&str>,
    ) -> Result<InsertOutcome, PersistenceError> {
        let mut query = sqlx::query(&self.insert_sql)
            .bind(&record.user_id)
            .bind(&record.device_type)
            .bind(&record.masked_ip)
            .bind(&record.masked_device_id)
            .bind(&record.locale)
            .bind(record.app_version_numeric)
            .bind(record.ingest_date);

        if self.strategy == IdempotencyStrategy::MessageId {
            query = query.bind(message_id);
        }

        let done = query.execute(&mut self.conn).await?;

        if done.rows_affected() == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}
