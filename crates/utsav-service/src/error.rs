//! # Service Error Types
//!
//! Errors for the booking lifecycle orchestration layer.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  utsav-core   CoreError / ValidationError ─┐                            │
//! │  utsav-db     DbError ────────────────────┼──► ServiceError ──► caller │
//! │  gateway      GatewayError ───────────────┘                            │
//! │                                                                         │
//! │  NotifyError never becomes a ServiceError: notification failures are    │
//! │  captured into NotificationOutcome values, not raised.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::gateway::GatewayError;
use utsav_core::error::{CoreError, ValidationError};
use utsav_db::DbError;

/// Booking lifecycle errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed business-rule validation; nothing was persisted.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Pricing or reconciliation failure from the core.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Storage failure on a path that must not degrade.
    ///
    /// Booking creation handles `DbError::is_unavailable` itself (synthetic
    /// records); everywhere else storage problems surface as this.
    #[error("Storage error: {0}")]
    Db(#[from] DbError),

    /// Payment gateway failure. Never faked, always surfaced.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Operation requires a pending booking but it is already confirmed.
    #[error("Booking {booking_id} is already confirmed")]
    AlreadyConfirmed { booking_id: String },

    /// Operation requires a confirmed, paid booking.
    #[error("Booking {booking_id} is not confirmed")]
    NotConfirmed { booking_id: String },

    /// Internal serialization failure (QR payloads, audit blobs).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(format!("serialization failed: {err}"))
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
