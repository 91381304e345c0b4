//! # Notification Collaborators and Outcomes
//!
//! Transport traits for the two delivery channels plus the outcome values
//! that carry per-channel results back to the caller.
//!
//! ## Best-Effort Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Payment confirmed, tickets issued                                       │
//! │       │                                                                  │
//! │       ├──► render PDF ──► email with attachment ──► ChannelOutcome       │
//! │       └──► WhatsApp message ─────────────────────► ChannelOutcome       │
//! │                                                                          │
//! │  Every outcome (sent, failed, skipped) is RETURNED, never raised.        │
//! │  The booking is confirmed and the tickets exist regardless of what       │
//! │  happens on this path.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Types
// =============================================================================

/// Named binary attachment for an email.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Notification transport errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level delivery failure.
    #[error("Delivery failed: {0}")]
    Transport(String),

    /// Transport did not answer within the collaborator timeout.
    #[error("Delivery timed out")]
    Timeout,
}

/// Result of one channel's dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChannelOutcome {
    /// Delivered; `message_id` is the transport's receipt.
    Sent { message_id: String },
    /// Attempted and failed.
    Failed { reason: String },
    /// Not attempted (no address/phone on the booking, or no PDF for a
    /// channel that requires one).
    Skipped { reason: String },
}

impl ChannelOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, ChannelOutcome::Sent { .. })
    }
}

/// Combined result of a notification dispatch for one booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub email: ChannelOutcome,
    pub whatsapp: ChannelOutcome,
    /// Whether the ticket PDF rendered. A render failure downgrades the
    /// email to body-only and is recorded here.
    pub pdf_rendered: bool,
}

impl NotificationOutcome {
    /// True when at least one channel delivered.
    pub fn any_sent(&self) -> bool {
        self.email.is_sent() || self.whatsapp.is_sent()
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Sends ticket emails.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Delivers an email, returning the transport's message ID.
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachments: &[Attachment],
    ) -> Result<String, NotifyError>;
}

/// Sends WhatsApp messages with an optional PDF document.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Delivers a message, returning the transport's message ID.
    async fn send(
        &self,
        phone: &str,
        body: &str,
        document: Option<&Attachment>,
    ) -> Result<String, NotifyError>;
}
