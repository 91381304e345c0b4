//! # Ticket Rendering
//!
//! The QR payload format plus the renderer trait the confirmation path uses
//! to produce the ticket PDF. Rendering is pure and synchronous; the real
//! implementation (PDF layout, QR raster) lives outside this crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use utsav_core::types::{Booking, FareCategory, TicketUnit};

// =============================================================================
// QR Payload
// =============================================================================

/// The JSON document encoded into each ticket's QR code.
///
/// Gate scanners send this back verbatim; [`crate::redemption`] parses it to
/// recover the ticket number. Field names are part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub ticket_number: String,
    pub booking_id: String,
    pub category: FareCategory,
    pub event_date: NaiveDate,
}

impl QrPayload {
    /// Serializes to the JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses the JSON wire form.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Everything the renderer needs to lay out one booking's ticket document.
#[derive(Debug, Clone)]
pub struct TicketBundle {
    pub booking: Booking,
    pub tickets: Vec<TicketUnit>,
    /// Primary attendee's name, printed on the ticket.
    pub attendee_name: String,
    pub event_name: String,
}

/// Rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("QR encoding failed: {0}")]
    Qr(String),
}

/// Renders ticket artifacts.
pub trait TicketRenderer: Send + Sync {
    /// Renders the booking's ticket document as PDF bytes.
    fn render_pdf(&self, bundle: &TicketBundle) -> Result<Vec<u8>, RenderError>;

    /// Renders one QR payload as PNG bytes.
    fn render_qr(&self, payload: &str) -> Result<Vec<u8>, RenderError>;
}
