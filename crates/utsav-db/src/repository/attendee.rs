//! # Attendee Repository
//!
//! Database operations for booking contacts.
//!
//! Attendees are optional at booking creation; notification dispatch needs
//! at least one with an email or phone. The primary-contact query encodes
//! the selection rule in one place: an explicit `is_primary` flag wins,
//! otherwise the earliest attendee does.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use utsav_core::types::Attendee;

const ATTENDEE_COLUMNS: &str =
    "id, booking_id, name, email, phone, is_primary, created_at";

/// Repository for attendee database operations.
#[derive(Debug, Clone)]
pub struct AttendeeRepository {
    pool: SqlitePool,
}

impl AttendeeRepository {
    /// Creates a new AttendeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AttendeeRepository { pool }
    }

    /// Inserts an attendee.
    pub async fn insert(&self, attendee: &Attendee) -> DbResult<()> {
        debug!(booking_id = %attendee.booking_id, name = %attendee.name, "Inserting attendee");

        sqlx::query(
            r#"
            INSERT INTO attendees (
                id, booking_id, name, email, phone, is_primary, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&attendee.id)
        .bind(&attendee.booking_id)
        .bind(&attendee.name)
        .bind(&attendee.email)
        .bind(&attendee.phone)
        .bind(attendee.is_primary)
        .bind(attendee.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All attendees for a booking, primary contact first.
    pub async fn list_for_booking(&self, booking_id: &str) -> DbResult<Vec<Attendee>> {
        let attendees: Vec<Attendee> = sqlx::query_as(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees \
             WHERE booking_id = ?1 \
             ORDER BY is_primary DESC, created_at ASC, id ASC"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attendees)
    }

    /// The contact to notify: the flagged primary, or the earliest attendee.
    pub async fn primary_contact(&self, booking_id: &str) -> DbResult<Option<Attendee>> {
        let attendee: Option<Attendee> = sqlx::query_as(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees \
             WHERE booking_id = ?1 \
             ORDER BY is_primary DESC, created_at ASC, id ASC \
             LIMIT 1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attendee)
    }

    /// Number of attendees attached to a booking.
    pub async fn count_for_booking(&self, booking_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM attendees WHERE booking_id = ?1")
                .bind(booking_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
