//! # Message Log Repository
//!
//! Audit trail for notification dispatch.
//!
//! Every email/WhatsApp attempt after a confirmation (or resend) writes one
//! row here, success or failure. Dispatch itself is best-effort; the log is
//! what support staff consult when a customer reports a missing ticket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

// =============================================================================
// Types
// =============================================================================

/// Delivery channel for a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageChannel {
    Email,
    Whatsapp,
}

/// Terminal state of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DispatchState {
    Sent,
    Failed,
}

/// One row of the dispatch audit trail.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: String,
    pub booking_id: String,
    pub channel: MessageChannel,
    pub recipient: String,
    pub status: DispatchState,
    /// Error text for failed attempts.
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for message log operations.
#[derive(Debug, Clone)]
pub struct MessageLogRepository {
    pool: SqlitePool,
}

impl MessageLogRepository {
    /// Creates a new MessageLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MessageLogRepository { pool }
    }

    /// Records one dispatch attempt.
    pub async fn record(
        &self,
        booking_id: &str,
        channel: MessageChannel,
        recipient: &str,
        status: DispatchState,
        detail: Option<&str>,
    ) -> DbResult<()> {
        debug!(booking_id, ?channel, ?status, "Recording dispatch attempt");

        sqlx::query(
            r#"
            INSERT INTO message_log (
                id, booking_id, channel, recipient, status, detail, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(booking_id)
        .bind(channel)
        .bind(recipient)
        .bind(status)
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All dispatch attempts for a booking, oldest first.
    pub async fn list_for_booking(&self, booking_id: &str) -> DbResult<Vec<MessageLogEntry>> {
        let entries: Vec<MessageLogEntry> = sqlx::query_as(
            r#"
            SELECT id, booking_id, channel, recipient, status, detail, created_at
            FROM message_log
            WHERE booking_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
