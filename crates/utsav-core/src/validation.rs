//! # Validation Module
//!
//! Input validation for booking requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                       │
//! │  ├── Type checks, category/fare-class name parsing                      │
//! │  └── Legacy alias resolution (kid, family4)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                        │
//! │  ├── Selection rules (empty, stag male, solo kids)                      │
//! │  ├── Calendar rules (festival window, closed dates)                     │
//! │  └── Contact fields for attendees                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / UNIQUE constraints                                      │
//! │  └── Foreign key constraints                                            │
//! │                                                                         │
//! │  All checks here run BEFORE expansion, pricing, or any persistence.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::rates::RateTable;
use crate::types::{FareCategory, PassSelection};
use crate::MAX_PASSES_PER_BOOKING;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Pass Selection Rules
// =============================================================================

/// Validates a pass selection against the door policies.
///
/// ## Rules
/// - At least one positive quantity
/// - The only selected category must not be exactly `male` (stag rule)
/// - The only selected category must not be exactly `kids` (adults must
///   accompany)
/// - Total pass count capped per booking
///
/// Runs on the ORIGINAL selection, never on expanded output: `{couple: 1}`
/// expands into a lone-male-plus-female sequence that would confuse any
/// post-expansion check.
///
/// ## Example
/// ```rust
/// use utsav_core::types::{FareCategory, PassSelection};
/// use utsav_core::validation::validate_selection;
///
/// let only_male = PassSelection::new().with(FareCategory::Male, 3);
/// assert!(validate_selection(&only_male).is_err());
///
/// let mixed = PassSelection::new()
///     .with(FareCategory::Male, 3)
///     .with(FareCategory::Female, 1);
/// assert!(validate_selection(&mixed).is_ok());
/// ```
pub fn validate_selection(selection: &PassSelection) -> ValidationResult<()> {
    if selection.is_empty() {
        return Err(ValidationError::EmptySelection);
    }

    let categories: Vec<FareCategory> = selection.categories().collect();

    if categories == [FareCategory::Male] {
        return Err(ValidationError::StagMale);
    }

    if categories == [FareCategory::Kids] {
        return Err(ValidationError::UnaccompaniedKids);
    }

    if selection.pass_count() > MAX_PASSES_PER_BOOKING {
        return Err(ValidationError::TooMany {
            field: "passes".to_string(),
            max: MAX_PASSES_PER_BOOKING,
        });
    }

    Ok(())
}

// =============================================================================
// Calendar Rules
// =============================================================================

/// Validates a booking date against the festival calendar.
///
/// ## Rules
/// - Date must fall inside the festival window
/// - Date must not be a closed date
pub fn validate_booking_date(date: NaiveDate, rates: &RateTable) -> ValidationResult<()> {
    if !rates.is_within_festival(date) {
        let (start, end) = rates.festival_window();
        return Err(ValidationError::OutsideFestivalWindow { date, start, end });
    }

    if rates.is_closed(date) {
        return Err(ValidationError::DateClosed { date });
    }

    Ok(())
}

// =============================================================================
// Contact Fields
// =============================================================================

/// Validates an attendee name.
///
/// ## Rules
/// - Must not be empty
/// - Maximum 100 characters
pub fn validate_attendee_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must be at most 100 characters".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address. Deliverability is the transport's problem;
/// this only rejects obviously malformed input before it reaches storage.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    });

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(())
}

/// Validates a phone number for WhatsApp dispatch.
///
/// ## Rules
/// - 10 to 15 digits after stripping separators and a leading `+`
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let digits: String = phone
        .trim()
        .trim_start_matches('+')
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) || !(10..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be 10 to 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a client-declared amount in paise.
pub fn validate_declared_amount(paise: i64) -> ValidationResult<()> {
    if paise <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "declared amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
