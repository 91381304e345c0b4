//! Shared harness for service integration tests: in-memory SQLite plus mock
//! collaborators with switchable failure modes.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use utsav_core::money::Money;
use utsav_core::rates::RateTable;
use utsav_core::types::{FareClass, PassSelection};
use utsav_db::{Database, DbConfig};
use utsav_service::gateway::{GatewayError, GatewayOrder, PaymentGateway};
use utsav_service::ist::ist_offset;
use utsav_service::lifecycle::{
    AttendeeDetails, BookingService, ConfirmOutcome, CreateBookingRequest,
};
use utsav_service::notify::{Attachment, EmailSender, MessageSender, NotifyError};
use utsav_service::render::{RenderError, TicketBundle, TicketRenderer};

// =============================================================================
// Mock Collaborators
// =============================================================================

pub struct MockGateway {
    pub fail: bool,
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        amount: Money,
        currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        if self.fail {
            return Err(GatewayError::Unavailable("mock gateway down".to_string()));
        }
        Ok(GatewayOrder {
            order_id: format!("order_{}", Uuid::new_v4().simple()),
            amount_paise: amount.paise(),
            currency: currency.to_string(),
        })
    }
}

#[derive(Default)]
pub struct MockEmail {
    pub fail: bool,
    /// (to, subject, attachment count) per delivered email.
    pub sent: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl EmailSender for MockEmail {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        _body: &str,
        attachments: &[Attachment],
    ) -> Result<String, NotifyError> {
        if self.fail {
            return Err(NotifyError::Transport("smtp refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), attachments.len()));
        Ok(format!("email_{}", Uuid::new_v4().simple()))
    }
}

#[derive(Default)]
pub struct MockMessenger {
    pub fail: bool,
    /// (phone, had pdf document) per delivered message.
    pub sent: Mutex<Vec<(String, bool)>>,
}

#[async_trait]
impl MessageSender for MockMessenger {
    async fn send(
        &self,
        phone: &str,
        _body: &str,
        document: Option<&Attachment>,
    ) -> Result<String, NotifyError> {
        if self.fail {
            return Err(NotifyError::Transport("whatsapp api error".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), document.is_some()));
        Ok(format!("wamid_{}", Uuid::new_v4().simple()))
    }
}

pub struct MockRenderer {
    pub fail: bool,
}

impl TicketRenderer for MockRenderer {
    fn render_pdf(&self, _bundle: &TicketBundle) -> Result<Vec<u8>, RenderError> {
        if self.fail {
            return Err(RenderError::Pdf("layout failed".to_string()));
        }
        Ok(b"%PDF-1.4 mock".to_vec())
    }

    fn render_qr(&self, _payload: &str) -> Result<Vec<u8>, RenderError> {
        Ok(b"\x89PNG mock".to_vec())
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub service: BookingService,
    pub db: Database,
    pub email: Arc<MockEmail>,
    pub messenger: Arc<MockMessenger>,
}

#[derive(Default)]
pub struct Failures {
    pub gateway: bool,
    pub email: bool,
    pub whatsapp: bool,
    pub renderer: bool,
}

pub async fn harness() -> Harness {
    harness_with(Failures::default()).await
}

pub async fn harness_with(failures: Failures) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("utsav_service=debug,utsav_db=debug")
        .with_test_writer()
        .try_init();

    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database");

    let email = Arc::new(MockEmail {
        fail: failures.email,
        ..Default::default()
    });
    let messenger = Arc::new(MockMessenger {
        fail: failures.whatsapp,
        ..Default::default()
    });

    let service = BookingService::new(
        db.clone(),
        Arc::new(RateTable::festival_2025()),
        Arc::new(MockGateway {
            fail: failures.gateway,
        }),
        email.clone(),
        messenger.clone(),
        Arc::new(MockRenderer {
            fail: failures.renderer,
        }),
    )
    .with_collaborator_timeout(Duration::from_secs(2));

    Harness {
        service,
        db,
        email,
        messenger,
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// September 2025 festival day.
pub fn sept(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
}

/// Noon IST on the given date, as a UTC instant.
pub fn ist_noon(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(12, 0, 0)
        .unwrap()
        .and_local_timezone(ist_offset())
        .unwrap()
        .with_timezone(&Utc)
}

pub fn single_booking_request(passes: PassSelection, day: u32) -> CreateBookingRequest {
    CreateBookingRequest {
        booking_date: sept(day),
        fare_class: FareClass::Single,
        passes,
        declared_total_paise: None,
    }
}

pub fn primary_attendee() -> AttendeeDetails {
    AttendeeDetails {
        name: "Priya Sharma".to_string(),
        email: Some("priya@example.com".to_string()),
        phone: Some("+91 98765 43210".to_string()),
        is_primary: true,
    }
}

/// Runs the full happy path: create, attach contact, open payment, confirm.
pub async fn confirmed_booking(
    harness: &Harness,
    passes: PassSelection,
    day: u32,
) -> ConfirmOutcome {
    let created = harness
        .service
        .create_booking(single_booking_request(passes, day))
        .await
        .expect("create booking");
    let booking_id = created.record.booking().id.clone();

    harness
        .service
        .add_attendee(&booking_id, primary_attendee())
        .await
        .expect("add attendee");

    let payment = harness
        .service
        .create_payment_order(&booking_id, None)
        .await
        .expect("payment order");

    harness
        .service
        .confirm_payment(&booking_id, &payment.order_id, "pay_mock_ref")
        .await
        .expect("confirm payment")
}
