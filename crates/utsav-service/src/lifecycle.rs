//! # Booking Lifecycle Service
//!
//! Orchestrates the full booking flow from creation to ticket delivery.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_booking                                                         │
//! │    validate date + selection → expand → price → reconcile → persist     │
//! │    (storage down → synthetic record, customer flow continues)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create_payment_order                                                   │
//! │    re-price → reconcile declared amount → gateway order → payment row   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  confirm_payment                                                        │
//! │    mark paid → CAS pending→confirmed                                    │
//! │    winner: re-expand, issue one ticket per unit                         │
//! │    loser:  return the existing tickets (idempotent)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  dispatch notifications (best effort: PDF, email, WhatsApp)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing runs twice, at creation and at payment-order time, and must agree;
//! drift is logged and the fresh computation wins. Expansion runs twice too,
//! which is safe because it is deterministic over the stored selection.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{GatewayError, PaymentGateway};
use crate::notify::{
    Attachment, ChannelOutcome, EmailSender, MessageSender, NotificationOutcome, NotifyError,
};
use crate::render::{QrPayload, TicketBundle, TicketRenderer};
use utsav_core::pricing::{PassAudit, PriceBreakdown, PricingEngine, UnitPrice};
use utsav_core::rates::RateTable;
use utsav_core::types::{
    Attendee, Booking, BookingRecord, BookingStatus, FareCategory, FareClass, PassSelection,
    PaymentRecord, PaymentStatus, TicketUnit,
};
use utsav_core::validation::{
    validate_attendee_name, validate_booking_date, validate_declared_amount, validate_email,
    validate_phone,
};
use utsav_core::{error::ValidationError, money::Money, passes::expand, TICKET_EXPIRY_DAYS};
use utsav_db::{Database, MessageChannel};

/// Default bound on any single gateway or transport call.
const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Request / Response Types
// =============================================================================

/// Input to [`BookingService::create_booking`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub booking_date: NaiveDate,
    pub fare_class: FareClass,
    pub passes: PassSelection,
    /// Client-side total in paise, reconciled against the computed one.
    pub declared_total_paise: Option<i64>,
}

/// Result of booking creation: the (possibly synthetic) record plus the
/// breakdown that produced its total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedBooking {
    pub record: BookingRecord,
    pub breakdown: PriceBreakdown,
}

/// Input to [`BookingService::add_attendee`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendeeDetails {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_primary: bool,
}

/// Result of a payment confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    pub booking: Booking,
    pub tickets: Vec<TicketUnit>,
    /// True when THIS call performed the pending → confirmed transition.
    /// False on a replayed confirmation; `tickets` then holds the originals.
    pub newly_confirmed: bool,
    pub notifications: NotificationOutcome,
}

/// Read-model for one booking.
#[derive(Debug, Clone)]
pub struct BookingDetail {
    pub booking: Booking,
    pub attendees: Vec<Attendee>,
    pub ticket_count: i64,
    pub latest_payment: Option<PaymentRecord>,
}

// =============================================================================
// Booking Service
// =============================================================================

/// The booking lifecycle orchestrator.
///
/// Holds the database, the pricing engine, and the external collaborators
/// behind their traits. Cheap to clone; every field is a handle.
#[derive(Clone)]
pub struct BookingService {
    db: Database,
    pricing: PricingEngine,
    gateway: Arc<dyn PaymentGateway>,
    email: Arc<dyn EmailSender>,
    messenger: Arc<dyn MessageSender>,
    renderer: Arc<dyn TicketRenderer>,
    event_name: String,
    collaborator_timeout: Duration,
}

impl BookingService {
    /// Creates a service over the given rate table and collaborators.
    pub fn new(
        db: Database,
        rates: Arc<RateTable>,
        gateway: Arc<dyn PaymentGateway>,
        email: Arc<dyn EmailSender>,
        messenger: Arc<dyn MessageSender>,
        renderer: Arc<dyn TicketRenderer>,
    ) -> Self {
        BookingService {
            db,
            pricing: PricingEngine::new(rates),
            gateway,
            email,
            messenger,
            renderer,
            event_name: "Malang Raas Dandiya 2025".to_string(),
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }

    /// Sets the event name printed on tickets and messages.
    pub fn with_event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = name.into();
        self
    }

    /// Sets the per-call bound on gateway and transport collaborators.
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    // =========================================================================
    // Booking Creation
    // =========================================================================

    /// Creates a pending booking with a server-computed total.
    ///
    /// When storage is unavailable the customer flow still completes: the
    /// caller receives a fully priced `Synthetic` record whose `offline-`
    /// id marks it for later reconciliation. Every other failure (bad input,
    /// pricing, constraint violations) is a hard error.
    pub async fn create_booking(&self, request: CreateBookingRequest) -> ServiceResult<CreatedBooking> {
        debug!(
            date = %request.booking_date,
            fare_class = request.fare_class.as_str(),
            passes = request.passes.pass_count(),
            "create_booking"
        );

        validate_booking_date(request.booking_date, self.pricing.rates())?;
        if let Some(paise) = request.declared_total_paise {
            validate_declared_amount(paise)?;
        }

        let expansion = expand(&request.passes)?;
        let breakdown = self.pricing.price_booking(
            &request.passes,
            &expansion,
            request.fare_class,
            request.booking_date,
        )?;

        let declared = request.declared_total_paise.map(Money::from_paise);
        let reconciled = self.pricing.reconcile(breakdown.total, declared)?;
        if reconciled.was_corrected() {
            warn!(
                computed = breakdown.total.paise(),
                declared = reconciled.amount().paise(),
                "Declared amount outside tolerance, accepting declared amount"
            );
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            booking_date: request.booking_date,
            fare_class: request.fare_class,
            status: BookingStatus::Pending,
            passes: request.passes.clone(),
            total_paise: reconciled.amount().paise(),
            discount_paise: breakdown.discount_amount.paise(),
            payment_id: None,
            created_at: now,
            updated_at: now,
        };
        let audit = PassAudit {
            passes: request.passes,
            expanded_counts: expansion.counts(),
            breakdown: breakdown.clone(),
        };

        match self.db.bookings().insert(&booking, &audit).await {
            Ok(()) => {
                info!(
                    booking_id = %booking.id,
                    total = %booking.total(),
                    units = expansion.unit_count(),
                    "Booking created"
                );
                Ok(CreatedBooking {
                    record: BookingRecord::Persisted(booking),
                    breakdown,
                })
            }
            Err(e) if e.is_unavailable() => {
                warn!(error = %e, "Storage unavailable, issuing synthetic booking");
                let mut synthetic = booking;
                synthetic.id = format!("offline-{}", Utc::now().timestamp_millis());
                Ok(CreatedBooking {
                    record: BookingRecord::Synthetic(synthetic),
                    breakdown,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Attaches an attendee to an existing booking.
    pub async fn add_attendee(
        &self,
        booking_id: &str,
        details: AttendeeDetails,
    ) -> ServiceResult<Attendee> {
        debug!(booking_id, name = %details.name, "add_attendee");

        validate_attendee_name(&details.name)?;
        if let Some(email) = &details.email {
            validate_email(email)?;
        }
        if let Some(phone) = &details.phone {
            validate_phone(phone)?;
        }

        self.db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Booking", booking_id))?;

        let attendee = Attendee {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            name: details.name.trim().to_string(),
            email: details.email,
            phone: details.phone,
            is_primary: details.is_primary,
            created_at: Utc::now(),
        };
        self.db.attendees().insert(&attendee).await?;

        info!(booking_id, attendee_id = %attendee.id, "Attendee added");
        Ok(attendee)
    }

    // =========================================================================
    // Payment Order
    // =========================================================================

    /// Opens a payment order at the gateway for a pending booking.
    ///
    /// The booking is re-priced from its stored selection before the gateway
    /// is contacted; a stale stored total is corrected, never charged.
    pub async fn create_payment_order(
        &self,
        booking_id: &str,
        declared_total_paise: Option<i64>,
    ) -> ServiceResult<PaymentRecord> {
        debug!(booking_id, "create_payment_order");

        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Booking", booking_id))?;

        if booking.status == BookingStatus::Confirmed {
            return Err(ServiceError::AlreadyConfirmed {
                booking_id: booking_id.to_string(),
            });
        }
        if let Some(paise) = declared_total_paise {
            validate_declared_amount(paise)?;
        }

        let expansion = expand(&booking.passes)?;
        let breakdown = self.pricing.price_booking(
            &booking.passes,
            &expansion,
            booking.fare_class,
            booking.booking_date,
        )?;
        if breakdown.total.paise() != booking.total_paise {
            warn!(
                booking_id,
                stored = booking.total_paise,
                recomputed = breakdown.total.paise(),
                "Stored total drifted from recomputed total"
            );
        }

        let declared = declared_total_paise.map(Money::from_paise);
        let reconciled = self.pricing.reconcile(breakdown.total, declared)?;
        let amount = reconciled.amount();
        if reconciled.was_corrected() {
            warn!(
                booking_id,
                computed = breakdown.total.paise(),
                declared = amount.paise(),
                "Declared amount outside tolerance, charging declared amount"
            );
        }
        if amount.paise() != booking.total_paise {
            self.db
                .bookings()
                .update_total(booking_id, amount.paise(), breakdown.discount_amount.paise())
                .await?;
        }

        let order = timeout(
            self.collaborator_timeout,
            self.gateway.create_order(amount, "INR", booking_id),
        )
        .await
        .map_err(|_| GatewayError::Timeout)??;

        let payment = PaymentRecord {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            order_id: order.order_id,
            payment_ref: None,
            amount_paise: amount.paise(),
            currency: order.currency,
            status: PaymentStatus::Created,
            created_at: Utc::now(),
        };
        self.db.payments().insert(&payment).await?;
        self.db.bookings().link_payment(booking_id, &payment.id).await?;

        info!(
            booking_id,
            payment_id = %payment.id,
            order_id = %payment.order_id,
            amount = %payment.amount(),
            "Payment order opened"
        );
        Ok(payment)
    }

    // =========================================================================
    // Payment Confirmation and Ticket Issuance
    // =========================================================================

    /// Confirms a payment and issues tickets exactly once.
    ///
    /// Safe to replay: only the caller that wins the `pending → confirmed`
    /// transition creates tickets; every later call returns the same set.
    /// Notification dispatch runs after issuance and never fails the
    /// confirmation; its per-channel results ride back in the outcome.
    pub async fn confirm_payment(
        &self,
        booking_id: &str,
        order_id: &str,
        payment_ref: &str,
    ) -> ServiceResult<ConfirmOutcome> {
        debug!(booking_id, order_id, "confirm_payment");

        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Booking", booking_id))?;
        let payment = self.db.payments().find_by_order(booking_id, order_id).await?;

        let paid_now = self.db.payments().mark_paid(&payment.id, payment_ref).await?;
        if !paid_now {
            debug!(booking_id, payment_id = %payment.id, "Payment already marked paid");
        }

        let newly_confirmed = self.db.bookings().confirm(booking_id).await?;
        let tickets = if newly_confirmed {
            self.issue_tickets(&booking).await?
        } else {
            self.db.tickets().list_for_booking(booking_id).await?
        };

        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Booking", booking_id))?;

        let notifications = self.dispatch(&booking, &tickets).await;

        info!(
            booking_id,
            newly_confirmed,
            tickets = tickets.len(),
            notified = notifications.any_sent(),
            "Payment confirmed"
        );
        Ok(ConfirmOutcome {
            booking,
            tickets,
            newly_confirmed,
            notifications,
        })
    }

    /// Creates one ticket per expanded unit, in expansion order.
    async fn issue_tickets(&self, booking: &Booking) -> ServiceResult<Vec<TicketUnit>> {
        let expansion = expand(&booking.passes)?;
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TICKET_EXPIRY_DAYS);

        let mut tickets = Vec::with_capacity(expansion.unit_count());
        for unit in &expansion.units {
            let ticket_number = format!("TKT-{}", Uuid::new_v4().simple());
            let qr_payload = QrPayload {
                ticket_number: ticket_number.clone(),
                booking_id: booking.id.clone(),
                category: unit.category,
                event_date: booking.booking_date,
            }
            .to_json()?;

            tickets.push(TicketUnit {
                id: Uuid::new_v4().to_string(),
                booking_id: booking.id.clone(),
                ticket_number,
                category: unit.category,
                qr_payload,
                is_used: false,
                used_at: None,
                expires_at,
                created_at: now,
            });
        }

        self.db.tickets().insert_all(&tickets).await?;
        info!(booking_id = %booking.id, count = tickets.len(), "Tickets issued");
        Ok(tickets)
    }

    // =========================================================================
    // Notification Dispatch
    // =========================================================================

    /// Re-sends ticket notifications for a confirmed booking.
    pub async fn resend_notifications(&self, booking_id: &str) -> ServiceResult<NotificationOutcome> {
        debug!(booking_id, "resend_notifications");

        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Booking", booking_id))?;
        if booking.status != BookingStatus::Confirmed {
            return Err(ServiceError::NotConfirmed {
                booking_id: booking_id.to_string(),
            });
        }
        let paid = self
            .db
            .payments()
            .latest_for_booking(booking_id)
            .await?
            .is_some_and(|p| p.status == PaymentStatus::Paid);
        if !paid {
            return Err(ServiceError::NotConfirmed {
                booking_id: booking_id.to_string(),
            });
        }

        let tickets = self.db.tickets().list_for_booking(booking_id).await?;
        Ok(self.dispatch(&booking, &tickets).await)
    }

    /// Best-effort delivery of the ticket document over both channels.
    ///
    /// Never returns an error; every failure is folded into the outcome and
    /// recorded in the message log.
    async fn dispatch(&self, booking: &Booking, tickets: &[TicketUnit]) -> NotificationOutcome {
        let contact = match self.db.attendees().primary_contact(&booking.id).await {
            Ok(Some(attendee)) => attendee,
            Ok(None) => {
                warn!(booking_id = %booking.id, "No attendee on booking, skipping notifications");
                return skipped_outcome("no attendee on booking");
            }
            Err(e) => {
                warn!(booking_id = %booking.id, error = %e, "Contact lookup failed");
                return skipped_outcome("contact lookup failed");
            }
        };

        let bundle = TicketBundle {
            booking: booking.clone(),
            tickets: tickets.to_vec(),
            attendee_name: contact.name.clone(),
            event_name: self.event_name.clone(),
        };
        let pdf = match self.renderer.render_pdf(&bundle) {
            Ok(bytes) => Some(Attachment {
                filename: format!("tickets-{}.pdf", booking.id),
                content: bytes,
            }),
            Err(e) => {
                warn!(booking_id = %booking.id, error = %e, "PDF render failed");
                None
            }
        };

        let email = match &contact.email {
            None => ChannelOutcome::Skipped {
                reason: "no email address".to_string(),
            },
            Some(address) => {
                let outcome = self.send_email(booking, address, pdf.as_ref()).await;
                self.record_dispatch(&booking.id, MessageChannel::Email, address, &outcome)
                    .await;
                outcome
            }
        };

        let whatsapp = match &contact.phone {
            None => ChannelOutcome::Skipped {
                reason: "no phone number".to_string(),
            },
            Some(phone) => {
                let outcome = self.send_whatsapp(booking, phone, pdf.as_ref()).await;
                self.record_dispatch(&booking.id, MessageChannel::Whatsapp, phone, &outcome)
                    .await;
                outcome
            }
        };

        NotificationOutcome {
            email,
            whatsapp,
            pdf_rendered: pdf.is_some(),
        }
    }

    async fn send_email(
        &self,
        booking: &Booking,
        to: &str,
        pdf: Option<&Attachment>,
    ) -> ChannelOutcome {
        let subject = format!("Your {} tickets", self.event_name);
        let body = format!(
            "Booking {} is confirmed for {}. Your tickets are attached.",
            booking.id, booking.booking_date
        );
        let attachments: Vec<Attachment> = pdf.cloned().into_iter().collect();

        match timeout(
            self.collaborator_timeout,
            self.email.send(to, &subject, &body, &attachments),
        )
        .await
        {
            Err(_) => ChannelOutcome::Failed {
                reason: NotifyError::Timeout.to_string(),
            },
            Ok(Err(e)) => ChannelOutcome::Failed {
                reason: e.to_string(),
            },
            Ok(Ok(message_id)) => ChannelOutcome::Sent { message_id },
        }
    }

    async fn send_whatsapp(
        &self,
        booking: &Booking,
        phone: &str,
        pdf: Option<&Attachment>,
    ) -> ChannelOutcome {
        let body = format!(
            "Your {} booking {} is confirmed for {}.",
            self.event_name, booking.id, booking.booking_date
        );

        match timeout(
            self.collaborator_timeout,
            self.messenger.send(phone, &body, pdf),
        )
        .await
        {
            Err(_) => ChannelOutcome::Failed {
                reason: NotifyError::Timeout.to_string(),
            },
            Ok(Err(e)) => ChannelOutcome::Failed {
                reason: e.to_string(),
            },
            Ok(Ok(message_id)) => ChannelOutcome::Sent { message_id },
        }
    }

    /// Writes one dispatch attempt to the audit log. Log failures are
    /// swallowed with a warning; the log must never sink a confirmation.
    async fn record_dispatch(
        &self,
        booking_id: &str,
        channel: MessageChannel,
        recipient: &str,
        outcome: &ChannelOutcome,
    ) {
        use utsav_db::DispatchState;

        let (state, detail) = match outcome {
            ChannelOutcome::Sent { .. } => (DispatchState::Sent, None),
            ChannelOutcome::Failed { reason } => (DispatchState::Failed, Some(reason.as_str())),
            ChannelOutcome::Skipped { .. } => return,
        };

        if let Err(e) = self
            .db
            .message_log()
            .record(booking_id, channel, recipient, state, detail)
            .await
        {
            warn!(booking_id, ?channel, error = %e, "Failed to record dispatch attempt");
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Per-unit price quote for one category on one date.
    pub fn price_quote(
        &self,
        category: FareCategory,
        fare_class: FareClass,
        quantity: u32,
        date: NaiveDate,
    ) -> ServiceResult<UnitPrice> {
        validate_booking_date(date, self.pricing.rates())?;
        if quantity == 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        Ok(self.pricing.price_unit(category, fare_class, quantity, date)?)
    }

    /// Full read-model for one booking.
    pub async fn booking_detail(&self, booking_id: &str) -> ServiceResult<BookingDetail> {
        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Booking", booking_id))?;

        let attendees = self.db.attendees().list_for_booking(booking_id).await?;
        let ticket_count = self.db.tickets().count_for_booking(booking_id).await?;
        let latest_payment = self.db.payments().latest_for_booking(booking_id).await?;

        Ok(BookingDetail {
            booking,
            attendees,
            ticket_count,
            latest_payment,
        })
    }
}

fn skipped_outcome(reason: &str) -> NotificationOutcome {
    NotificationOutcome {
        email: ChannelOutcome::Skipped {
            reason: reason.to_string(),
        },
        whatsapp: ChannelOutcome::Skipped {
            reason: reason.to_string(),
        },
        pdf_rendered: false,
    }
}
