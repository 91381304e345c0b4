//! # Payment Repository
//!
//! Database operations for gateway payment orders.
//!
//! A payment row is written when an order is opened at the gateway
//! (`status = 'created'`) and flipped to `'paid'` at confirmation. The flip
//! is a conditional update so a replayed confirmation callback cannot mark
//! the same row paid twice.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use utsav_core::types::PaymentRecord;

const PAYMENT_COLUMNS: &str =
    "id, booking_id, order_id, payment_ref, amount_paise, currency, status, created_at";

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Inserts a payment order row.
    pub async fn insert(&self, payment: &PaymentRecord) -> DbResult<()> {
        debug!(
            booking_id = %payment.booking_id,
            order_id = %payment.order_id,
            amount = payment.amount_paise,
            "Inserting payment order"
        );

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, booking_id, order_id, payment_ref,
                amount_paise, currency, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.booking_id)
        .bind(&payment.order_id)
        .bind(&payment.payment_ref)
        .bind(payment.amount_paise)
        .bind(&payment.currency)
        .bind(payment.status)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Marks a created payment as paid, recording the gateway reference.
    ///
    /// Conditional on `status = 'created'`; a second confirmation of the
    /// same payment is a no-op rather than an overwrite.
    pub async fn mark_paid(&self, id: &str, payment_ref: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = 'paid',
                payment_ref = ?2
            WHERE id = ?1 AND status = 'created'
            "#,
        )
        .bind(id)
        .bind(payment_ref)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// The most recent payment row for a booking, if any.
    pub async fn latest_for_booking(&self, booking_id: &str) -> DbResult<Option<PaymentRecord>> {
        let payment: Option<PaymentRecord> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE booking_id = ?1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Finds a booking's payment row by gateway order id.
    pub async fn find_by_order(
        &self,
        booking_id: &str,
        order_id: &str,
    ) -> DbResult<PaymentRecord> {
        let payment: Option<PaymentRecord> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE booking_id = ?1 AND order_id = ?2"
        ))
        .bind(booking_id)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        payment.ok_or_else(|| {
            DbError::not_found("Payment", format!("{booking_id}/{order_id}"))
        })
    }
}
