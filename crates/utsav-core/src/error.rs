//! # Error Types
//!
//! Domain-specific error types for utsav-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  utsav-core errors (this file)                                          │
//! │  ├── CoreError        - Pricing / domain failures                       │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  utsav-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  utsav-service errors (separate crate)                                  │
//! │  ├── ServiceError     - Lifecycle orchestration failures                │
//! │  └── RedemptionError  - Gate-scan failures                              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (category, fare class, amounts)
//! 3. Errors are enum variants, never String
//! 4. A rate-table gap is a configuration DEFECT, never silently priced at 0

use thiserror::Error;

use crate::types::{FareCategory, FareClass};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Rate table has no base entry for this fare class + category.
    ///
    /// ## When This Occurs
    /// - A new category was added without extending the rate table
    /// - A rate table was constructed by hand for tests and left a gap
    ///
    /// This is a configuration defect. Pricing MUST refuse to continue:
    /// defaulting to zero would produce free tickets.
    #[error("No rate configured for {fare_class} {category}")]
    UnknownRate {
        fare_class: FareClass,
        category: FareCategory,
    },

    /// Booking total computed to zero with no special offer in effect.
    ///
    /// A free booking is only legitimate when a promotional override
    /// explicitly priced it at zero and carries a label saying so.
    #[error("Computed total is zero with no active offer")]
    ZeroTotalWithoutOffer,

    /// Declared amount diverges from the computed total beyond tolerance
    /// and falls outside the accepted correction bound.
    #[error(
        "Declared amount {declared_paise} paise does not reconcile with computed {computed_paise} paise"
    )]
    Reconciliation {
        computed_paise: i64,
        declared_paise: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when client input doesn't meet requirements.
/// Used for early validation before expansion and pricing run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Pass selection has no positive quantity in any category.
    #[error("At least one pass must be selected")]
    EmptySelection,

    /// Male-only entry is not sold.
    ///
    /// A selection whose only entries are male passes is rejected at the
    /// door policy level, before any pricing happens.
    #[error("Male-only bookings are not permitted")]
    StagMale,

    /// Kids cannot attend unaccompanied.
    #[error("Kids passes require at least one accompanying adult pass")]
    UnaccompaniedKids,

    /// Booking date falls outside the festival window.
    #[error("Date {date} is outside the festival window {start} to {end}")]
    OutsideFestivalWindow {
        date: chrono::NaiveDate,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Booking date is inside the festival window but not bookable.
    #[error("The festival is closed on {date}")]
    DateClosed { date: chrono::NaiveDate },

    /// Unknown pass category name from the client.
    #[error("Unknown pass category '{value}'")]
    InvalidCategory { value: String },

    /// Unknown fare class name from the client.
    #[error("Unknown fare class '{value}'")]
    InvalidFareClass { value: String },

    /// Quantity must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Quantity exceeds the per-booking cap.
    #[error("{field} must be at most {max}")]
    TooMany { field: String, max: u32 },

    /// Invalid format (e.g. malformed date, malformed QR payload).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownRate {
            fare_class: FareClass::Single,
            category: FareCategory::Couple,
        };
        assert_eq!(err.to_string(), "No rate configured for single couple");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::StagMale;
        assert_eq!(err.to_string(), "Male-only bookings are not permitted");

        let err = ValidationError::TooMany {
            field: "female".to_string(),
            max: 50,
        };
        assert_eq!(err.to_string(), "female must be at most 50");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::EmptySelection;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
