//! # utsav-service: Booking Lifecycle and Redemption
//!
//! Orchestration layer for the Utsav ticketing backend. Composes the pure
//! pricing core with the SQLite storage layer and the external collaborator
//! traits (payment gateway, email, WhatsApp, ticket rendering).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       utsav-service (THIS CRATE)                        │
//! │                                                                         │
//! │   ┌──────────────────┐          ┌──────────────────┐                   │
//! │   │  BookingService  │          │RedemptionVerifier│                   │
//! │   │  (lifecycle.rs)  │          │  (redemption.rs) │                   │
//! │   │                  │          │                  │                   │
//! │   │ create_booking   │          │ verify           │                   │
//! │   │ add_attendee     │          │ redeem           │                   │
//! │   │ create_payment_  │          └────────┬─────────┘                   │
//! │   │   order          │                   │                             │
//! │   │ confirm_payment  │          ist.rs (UTC+5:30 gate dates)           │
//! │   │ resend_notif...  │                   │                             │
//! │   └───────┬──────────┘                   │                             │
//! │           │                              │                             │
//! │   collaborator traits                    │                             │
//! │   ┌───────┴───────────────────┐          │                             │
//! │   │ gateway.rs PaymentGateway │          │                             │
//! │   │ notify.rs  Email/Message  │          │                             │
//! │   │ render.rs  TicketRenderer │          │                             │
//! │   └───────────────────────────┘          │                             │
//! │           │                              │                             │
//! │           ▼                              ▼                             │
//! │       utsav-core  (pricing)      utsav-db  (storage)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`lifecycle`] - [`BookingService`]: creation, payment, confirmation,
//!   ticket issuance, notification dispatch
//! - [`redemption`] - [`RedemptionVerifier`]: gate-side QR scanning
//! - [`gateway`] - payment provider trait
//! - [`notify`] - email/WhatsApp transport traits and dispatch outcomes
//! - [`render`] - QR payload format and the PDF renderer trait
//! - [`ist`] - IST calendar helpers for the date gate
//! - [`error`] - [`ServiceError`]

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gateway;
pub mod ist;
pub mod lifecycle;
pub mod notify;
pub mod redemption;
pub mod render;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ServiceError, ServiceResult};
pub use gateway::{GatewayError, GatewayOrder, PaymentGateway};
pub use lifecycle::{
    AttendeeDetails, BookingDetail, BookingService, ConfirmOutcome, CreateBookingRequest,
    CreatedBooking,
};
pub use notify::{
    Attachment, ChannelOutcome, EmailSender, MessageSender, NotificationOutcome, NotifyError,
};
pub use redemption::{RedemptionError, RedemptionVerifier, VerifiedTicket};
pub use render::{QrPayload, RenderError, TicketBundle, TicketRenderer};
