//! # Gate Redemption
//!
//! Verifies and redeems tickets at the festival gate.
//!
//! ## Scan Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scanner input (QR JSON payload, or a bare ticket number)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  parse → load ticket → load booking                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  IST date gate: scan day must equal the booked event day                │
//! │  (wrong day leaves the ticket untouched and re-scannable)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  atomic is_used flip: exactly one concurrent scan wins                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  scan-log append (idempotent)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ist::ist_date;
use crate::render::QrPayload;
use utsav_core::types::{Booking, TicketUnit};
use utsav_db::{Database, DbError};

// =============================================================================
// Errors
// =============================================================================

/// Why a scan was refused.
#[derive(Debug, Error)]
pub enum RedemptionError {
    /// Input was neither a QR payload nor a plausible ticket number.
    #[error("Unreadable scan: {0}")]
    MalformedScan(String),

    /// No such ticket.
    #[error("Ticket not found: {ticket_number}")]
    NotFound { ticket_number: String },

    /// Ticket already redeemed.
    #[error("Ticket {ticket_number} already used")]
    AlreadyUsed {
        ticket_number: String,
        used_at: Option<DateTime<Utc>>,
    },

    /// Scan day (IST) does not match the booked event day.
    #[error("Ticket {ticket_number} is for {event_date}, not valid on {scan_date}")]
    WrongDate {
        ticket_number: String,
        event_date: NaiveDate,
        scan_date: NaiveDate,
    },

    /// Ticket expired before the scan.
    #[error("Ticket {ticket_number} expired at {expires_at}")]
    Expired {
        ticket_number: String,
        expires_at: DateTime<Utc>,
    },

    /// Storage failure during the scan.
    #[error("Storage error: {0}")]
    Db(#[from] DbError),
}

// =============================================================================
// Types
// =============================================================================

/// A verified (not yet redeemed) ticket with its booking context.
#[derive(Debug, Clone)]
pub struct VerifiedTicket {
    pub ticket: TicketUnit,
    pub booking: Booking,
}

// =============================================================================
// Verifier
// =============================================================================

/// Gate-side scan handler.
#[derive(Clone)]
pub struct RedemptionVerifier {
    db: Database,
}

impl RedemptionVerifier {
    pub fn new(db: Database) -> Self {
        RedemptionVerifier { db }
    }

    /// Extracts the ticket number from a raw scan.
    ///
    /// Accepts the QR JSON payload or a bare ticket number (manual entry at
    /// the gate when a camera fails).
    pub fn parse_scan(raw: &str) -> Result<String, RedemptionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RedemptionError::MalformedScan("empty input".to_string()));
        }

        if raw.starts_with('{') {
            let payload = QrPayload::from_json(raw)
                .map_err(|e| RedemptionError::MalformedScan(e.to_string()))?;
            return Ok(payload.ticket_number);
        }

        Ok(raw.to_string())
    }

    /// Looks up a scan without redeeming, for the gate UI's preview step.
    ///
    /// Reports used/expired/wrong-date exactly as [`Self::redeem`] would,
    /// but changes nothing.
    pub async fn verify(
        &self,
        raw_scan: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedTicket, RedemptionError> {
        let ticket_number = Self::parse_scan(raw_scan)?;
        let (ticket, booking) = self.load(&ticket_number).await?;
        self.check(&ticket, &booking, now)?;
        Ok(VerifiedTicket { ticket, booking })
    }

    /// Redeems a scan at the current instant.
    pub async fn redeem(&self, raw_scan: &str) -> Result<TicketUnit, RedemptionError> {
        self.redeem_at(raw_scan, Utc::now()).await
    }

    /// Redeems a scan at a supplied instant.
    ///
    /// The date gate runs before the flip, so a wrong-day scan leaves
    /// `is_used` untouched. The flip itself is conditional in storage;
    /// of N concurrent scans exactly one returns `Ok`.
    pub async fn redeem_at(
        &self,
        raw_scan: &str,
        now: DateTime<Utc>,
    ) -> Result<TicketUnit, RedemptionError> {
        let ticket_number = Self::parse_scan(raw_scan)?;
        debug!(ticket_number, "redeem");

        let (mut ticket, booking) = self.load(&ticket_number).await?;
        self.check(&ticket, &booking, now)?;

        let won = self.db.tickets().mark_used(&ticket_number, now).await?;
        if !won {
            // Lost the race since the check above
            let current = self.db.tickets().get_by_number(&ticket_number).await?;
            warn!(ticket_number, "Concurrent scan lost, ticket already used");
            return Err(RedemptionError::AlreadyUsed {
                ticket_number,
                used_at: current.and_then(|t| t.used_at),
            });
        }

        self.db
            .tickets()
            .log_scan(&ticket_number, &booking.id, now)
            .await?;

        ticket.is_used = true;
        ticket.used_at = Some(now);

        info!(
            ticket_number,
            booking_id = %booking.id,
            category = ticket.category.as_str(),
            "Ticket redeemed"
        );
        Ok(ticket)
    }

    async fn load(&self, ticket_number: &str) -> Result<(TicketUnit, Booking), RedemptionError> {
        let ticket = self
            .db
            .tickets()
            .get_by_number(ticket_number)
            .await?
            .ok_or_else(|| RedemptionError::NotFound {
                ticket_number: ticket_number.to_string(),
            })?;

        let booking = self
            .db
            .bookings()
            .get_by_id(&ticket.booking_id)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", ticket.booking_id.as_str()))?;

        Ok((ticket, booking))
    }

    fn check(
        &self,
        ticket: &TicketUnit,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<(), RedemptionError> {
        if ticket.is_used {
            return Err(RedemptionError::AlreadyUsed {
                ticket_number: ticket.ticket_number.clone(),
                used_at: ticket.used_at,
            });
        }

        if now >= ticket.expires_at {
            return Err(RedemptionError::Expired {
                ticket_number: ticket.ticket_number.clone(),
                expires_at: ticket.expires_at,
            });
        }

        let scan_date = ist_date(now);
        if scan_date != booking.booking_date {
            return Err(RedemptionError::WrongDate {
                ticket_number: ticket.ticket_number.clone(),
                event_date: booking.booking_date,
                scan_date,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_ticket_number() {
        let number = RedemptionVerifier::parse_scan("  TKT-abc123  ").unwrap();
        assert_eq!(number, "TKT-abc123");
    }

    #[test]
    fn test_parse_qr_json() {
        let raw = r#"{"ticket_number":"TKT-xyz","booking_id":"b1","category":"female","event_date":"2025-09-27"}"#;
        let number = RedemptionVerifier::parse_scan(raw).unwrap();
        assert_eq!(number, "TKT-xyz");
    }

    #[test]
    fn test_parse_rejects_garbage_json() {
        assert!(matches!(
            RedemptionVerifier::parse_scan("{broken"),
            Err(RedemptionError::MalformedScan(_))
        ));
        assert!(matches!(
            RedemptionVerifier::parse_scan(""),
            Err(RedemptionError::MalformedScan(_))
        ));
    }
}
