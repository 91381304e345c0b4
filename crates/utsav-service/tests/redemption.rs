//! Gate redemption integration tests: IST date gating, single-use
//! enforcement under concurrent scans, and scan-log idempotency.

mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::{confirmed_booking, harness, ist_noon, sept};

use utsav_core::types::{FareCategory, PassSelection};
use utsav_service::redemption::{RedemptionError, RedemptionVerifier};

#[tokio::test]
async fn redeem_on_event_day_flips_ticket_once() {
    let h = harness().await;
    let passes = PassSelection::new().with(FareCategory::Female, 1);
    let outcome = confirmed_booking(&h, passes, 27).await;
    let ticket = &outcome.tickets[0];

    let verifier = RedemptionVerifier::new(h.db.clone());
    let redeemed = verifier
        .redeem_at(&ticket.qr_payload, ist_noon(sept(27)))
        .await
        .unwrap();
    assert!(redeemed.is_used);
    assert!(redeemed.used_at.is_some());

    let stored = h
        .db
        .tickets()
        .get_by_number(&ticket.ticket_number)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_used);

    let scans = h
        .db
        .tickets()
        .scan_count_for_booking(&outcome.booking.id)
        .await
        .unwrap();
    assert_eq!(scans, 1);
}

#[tokio::test]
async fn wrong_day_scan_leaves_ticket_reusable() {
    let h = harness().await;
    let passes = PassSelection::new().with(FareCategory::Female, 1);
    let outcome = confirmed_booking(&h, passes, 27).await;
    let ticket = &outcome.tickets[0];
    let verifier = RedemptionVerifier::new(h.db.clone());

    let err = verifier
        .redeem_at(&ticket.qr_payload, ist_noon(sept(28)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RedemptionError::WrongDate {
            event_date,
            scan_date,
            ..
        } if event_date == sept(27) && scan_date == sept(28)
    ));

    // Untouched by the refused scan; the correct day still works
    let stored = h
        .db
        .tickets()
        .get_by_number(&ticket.ticket_number)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_used);

    verifier
        .redeem_at(&ticket.qr_payload, ist_noon(sept(27)))
        .await
        .unwrap();
}

#[tokio::test]
async fn second_scan_reports_already_used() {
    let h = harness().await;
    let passes = PassSelection::new().with(FareCategory::Female, 1);
    let outcome = confirmed_booking(&h, passes, 27).await;
    let ticket = &outcome.tickets[0];
    let verifier = RedemptionVerifier::new(h.db.clone());

    let scan_time = ist_noon(sept(27));
    verifier
        .redeem_at(&ticket.qr_payload, scan_time)
        .await
        .unwrap();

    let err = verifier
        .redeem_at(&ticket.qr_payload, scan_time + Duration::minutes(5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RedemptionError::AlreadyUsed { used_at: Some(_), .. }
    ));

    // Retried scans never add log rows
    let scans = h
        .db
        .tickets()
        .scan_count_for_booking(&outcome.booking.id)
        .await
        .unwrap();
    assert_eq!(scans, 1);
}

#[tokio::test]
async fn concurrent_scans_exactly_one_wins() {
    let h = harness().await;
    let passes = PassSelection::new().with(FareCategory::Female, 1);
    let outcome = confirmed_booking(&h, passes, 27).await;
    let ticket = outcome.tickets[0].clone();
    let verifier = RedemptionVerifier::new(h.db.clone());

    let scan_time = ist_noon(sept(27));
    let (a, b) = tokio::join!(
        verifier.redeem_at(&ticket.qr_payload, scan_time),
        verifier.redeem_at(&ticket.qr_payload, scan_time),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn unknown_ticket_is_not_found() {
    let h = harness().await;
    let verifier = RedemptionVerifier::new(h.db.clone());

    let err = verifier
        .redeem_at("TKT-does-not-exist", ist_noon(sept(27)))
        .await
        .unwrap_err();
    assert!(matches!(err, RedemptionError::NotFound { .. }));
}

#[tokio::test]
async fn verify_previews_without_redeeming() {
    let h = harness().await;
    let passes = PassSelection::new().with(FareCategory::Female, 1);
    let outcome = confirmed_booking(&h, passes, 27).await;
    let ticket = &outcome.tickets[0];
    let verifier = RedemptionVerifier::new(h.db.clone());

    let verified = verifier
        .verify(&ticket.ticket_number, ist_noon(sept(27)))
        .await
        .unwrap();
    assert_eq!(verified.ticket.ticket_number, ticket.ticket_number);
    assert_eq!(verified.booking.id, outcome.booking.id);

    let stored = h
        .db
        .tickets()
        .get_by_number(&ticket.ticket_number)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_used);
}

#[tokio::test]
async fn bare_ticket_number_scan_is_accepted() {
    let h = harness().await;
    let passes = PassSelection::new().with(FareCategory::Female, 1);
    let outcome = confirmed_booking(&h, passes, 27).await;
    let ticket = &outcome.tickets[0];
    let verifier = RedemptionVerifier::new(h.db.clone());

    let redeemed = verifier
        .redeem_at(&ticket.ticket_number, ist_noon(sept(27)))
        .await
        .unwrap();
    assert!(redeemed.is_used);
}

#[tokio::test]
async fn ist_midnight_counts_as_the_new_day() {
    let h = harness().await;
    let passes = PassSelection::new().with(FareCategory::Female, 1);
    let outcome = confirmed_booking(&h, passes, 27).await;
    let ticket = &outcome.tickets[0];
    let verifier = RedemptionVerifier::new(h.db.clone());

    // 2025-09-26 19:00 UTC is 2025-09-27 00:30 IST
    let just_after_midnight = Utc.with_ymd_and_hms(2025, 9, 26, 19, 0, 0).unwrap();
    let redeemed = verifier
        .redeem_at(&ticket.qr_payload, just_after_midnight)
        .await
        .unwrap();
    assert!(redeemed.is_used);
}

#[tokio::test]
async fn expired_ticket_is_refused() {
    let h = harness().await;
    let passes = PassSelection::new().with(FareCategory::Female, 1);
    let outcome = confirmed_booking(&h, passes, 27).await;
    let ticket = &outcome.tickets[0];
    let verifier = RedemptionVerifier::new(h.db.clone());

    // Same calendar day a year later: past the 30-day expiry
    let late = NaiveDate::from_ymd_opt(2026, 9, 27)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc();
    let err = verifier
        .redeem_at(&ticket.qr_payload, late)
        .await
        .unwrap_err();
    assert!(matches!(err, RedemptionError::Expired { .. }));
}
