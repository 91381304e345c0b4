//! # Ticket Repository
//!
//! Database operations for ticket units and the redemption scan log.
//!
//! ## Single-Use Guarantee
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two gate scans of the same ticket arrive concurrently                  │
//! │                                                                         │
//! │  Scan A ──► UPDATE tickets SET is_used = 1, used_at = ?                 │
//! │             WHERE ticket_number = ? AND is_used = 0                     │
//! │             → rows_affected = 1  (A wins)                               │
//! │                                                                         │
//! │  Scan B ──► same UPDATE                                                 │
//! │             → rows_affected = 0  (ticket already used)                  │
//! │                                                                         │
//! │  SQLite's write serialization resolves the race; there is never a       │
//! │  read-then-write window in this crate.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use utsav_core::types::TicketUnit;

const TICKET_COLUMNS: &str = "id, booking_id, ticket_number, category, qr_payload, \
     is_used, used_at, expires_at, created_at";

/// Repository for ticket database operations.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    /// Creates a new TicketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    /// Inserts a booking's ticket units in expansion order.
    ///
    /// `seq` records each unit's position so reads reproduce the exact
    /// issuance order.
    pub async fn insert_all(&self, tickets: &[TicketUnit]) -> DbResult<()> {
        for (seq, ticket) in tickets.iter().enumerate() {
            debug!(
                booking_id = %ticket.booking_id,
                ticket_number = %ticket.ticket_number,
                seq,
                "Inserting ticket"
            );

            sqlx::query(
                r#"
                INSERT INTO tickets (
                    id, booking_id, seq, ticket_number, category,
                    qr_payload, is_used, used_at, expires_at, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&ticket.id)
            .bind(&ticket.booking_id)
            .bind(seq as i64)
            .bind(&ticket.ticket_number)
            .bind(ticket.category)
            .bind(&ticket.qr_payload)
            .bind(ticket.is_used)
            .bind(ticket.used_at)
            .bind(ticket.expires_at)
            .bind(ticket.created_at)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// All tickets for a booking, in issuance order.
    pub async fn list_for_booking(&self, booking_id: &str) -> DbResult<Vec<TicketUnit>> {
        let tickets: Vec<TicketUnit> = sqlx::query_as(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets \
             WHERE booking_id = ?1 ORDER BY seq ASC"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Number of tickets issued for a booking.
    pub async fn count_for_booking(&self, booking_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE booking_id = ?1")
            .bind(booking_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Looks up a ticket by its QR token.
    pub async fn get_by_number(&self, ticket_number: &str) -> DbResult<Option<TicketUnit>> {
        let ticket: Option<TicketUnit> = sqlx::query_as(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_number = ?1"
        ))
        .bind(ticket_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Atomically flips a ticket `is_used: false → true`.
    ///
    /// ## Returns
    /// * `Ok(true)` - this scan redeemed the ticket
    /// * `Ok(false)` - ticket was already used (or does not exist; callers
    ///   that need the distinction load the ticket first)
    pub async fn mark_used(&self, ticket_number: &str, used_at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tickets SET
                is_used = 1,
                used_at = ?2
            WHERE ticket_number = ?1 AND is_used = 0
            "#,
        )
        .bind(ticket_number)
        .bind(used_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Appends a scan-log row for a successful redemption.
    ///
    /// `INSERT OR IGNORE` against the UNIQUE ticket_number column makes a
    /// retried append a no-op.
    pub async fn log_scan(
        &self,
        ticket_number: &str,
        booking_id: &str,
        scanned_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO scan_log (id, ticket_number, booking_id, scanned_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(ticket_number)
        .bind(booking_id)
        .bind(scanned_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of scan-log rows for a booking (diagnostics).
    pub async fn scan_count_for_booking(&self, booking_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM scan_log WHERE booking_id = ?1")
                .bind(booking_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
