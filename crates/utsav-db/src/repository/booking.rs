//! # Booking Repository
//!
//! Database operations for the booking aggregate.
//!
//! ## Booking Lifecycle in Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. CREATE                                                              │
//! │     └── insert() → bookings { status: 'pending', pass_details: JSON }   │
//! │                                                                         │
//! │  2. OPEN PAYMENT ORDER                                                  │
//! │     └── link_payment() / update_total()  (pending only)                 │
//! │                                                                         │
//! │  3. CONFIRM (exactly once)                                              │
//! │     └── confirm() → UPDATE ... WHERE status = 'pending'                 │
//! │         rows_affected == 1  → this caller won, create tickets           │
//! │         rows_affected == 0  → already confirmed, idempotent no-op       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The conditional UPDATE in `confirm` is the storage-level guarantee that
//! ticket issuance happens exactly once per booking, with no in-process lock.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use utsav_core::pricing::PassAudit;
use utsav_core::types::{Booking, BookingStatus, FareClass};

/// Raw bookings row; `pass_details` is decoded into the domain type on read.
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: String,
    booking_date: NaiveDate,
    fare_class: FareClass,
    status: BookingStatus,
    total_paise: i64,
    discount_paise: i64,
    payment_id: Option<String>,
    pass_details: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> DbResult<Booking> {
        let audit: PassAudit =
            serde_json::from_str(&self.pass_details).map_err(|e| DbError::Corrupt {
                entity: "Booking".to_string(),
                id: self.id.clone(),
                reason: e.to_string(),
            })?;

        Ok(Booking {
            id: self.id,
            booking_date: self.booking_date,
            fare_class: self.fare_class,
            status: self.status,
            passes: audit.passes,
            total_paise: self.total_paise,
            discount_paise: self.discount_paise,
            payment_id: self.payment_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, booking_date, fare_class, status, total_paise, \
     discount_paise, payment_id, pass_details, created_at, updated_at";

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Inserts a booking with its audit blob.
    ///
    /// The audit captures the original selection, expanded counts, and
    /// breakdown; reads reconstruct `Booking::passes` from it.
    pub async fn insert(&self, booking: &Booking, audit: &PassAudit) -> DbResult<()> {
        debug!(id = %booking.id, date = %booking.booking_date, "Inserting booking");

        let pass_details = serde_json::to_string(audit)
            .map_err(|e| DbError::Internal(format!("serialize pass_details: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, booking_date, fare_class, status,
                total_paise, discount_paise, payment_id, pass_details,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&booking.id)
        .bind(booking.booking_date)
        .bind(booking.fare_class)
        .bind(booking.status)
        .bind(booking.total_paise)
        .bind(booking.discount_paise)
        .bind(&booking.payment_id)
        .bind(pass_details)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a booking by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    /// Gets the stored audit blob for a booking.
    pub async fn get_audit(&self, id: &str) -> DbResult<Option<PassAudit>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT pass_details FROM bookings WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        raw.map(|s| {
            serde_json::from_str(&s).map_err(|e| DbError::Corrupt {
                entity: "Booking".to_string(),
                id: id.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    /// Atomically transitions a booking `pending → confirmed`.
    ///
    /// ## Returns
    /// * `Ok(true)` - this caller performed the transition
    /// * `Ok(false)` - booking was already confirmed (idempotent path)
    /// * `Err(NotFound)` - no such booking at all
    pub async fn confirm(&self, id: &str) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'confirmed',
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Distinguish "already confirmed" from "does not exist"
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM bookings WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Ok(false),
            None => Err(DbError::not_found("Booking", id)),
        }
    }

    /// Links a payment row to a pending booking.
    pub async fn link_payment(&self, id: &str, payment_id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                payment_id = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(payment_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", id));
        }

        Ok(())
    }

    /// Updates the stored total on a pending booking.
    ///
    /// Used when reconciliation corrects the amount at payment-order time.
    /// Confirmed bookings are immutable, hence the status guard.
    pub async fn update_total(
        &self,
        id: &str,
        total_paise: i64,
        discount_paise: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                total_paise = ?2,
                discount_paise = ?3,
                updated_at = ?4
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(total_paise)
        .bind(discount_paise)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking (pending)", id));
        }

        Ok(())
    }

    /// Bookings for one event day, newest first.
    pub async fn list_for_date(&self, date: NaiveDate) -> DbResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE booking_date = ?1 ORDER BY created_at DESC"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    /// Gets a booking's fare class without decoding the full row.
    pub async fn fare_class(&self, id: &str) -> DbResult<Option<FareClass>> {
        let fare: Option<FareClass> =
            sqlx::query_scalar("SELECT fare_class FROM bookings WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(fare)
    }
}
