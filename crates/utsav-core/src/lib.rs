//! # utsav-core: Pure Business Logic for Utsav Ticketing
//!
//! This crate is the **heart** of the ticketing backend. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Utsav Ticketing Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              utsav-service (Orchestration Layer)                │   │
//! │  │   booking lifecycle ── redemption ── notification dispatch      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ utsav-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   rates   │  │  passes   │  │   │
//! │  │   │  Booking  │  │   Money   │  │ RateTable │  │  expand   │  │   │
//! │  │   │TicketUnit │  │  (paise)  │  │ RateQuote │  │ Expansion │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐                                 │   │
//! │  │   │  pricing  │  │ validation│                                 │   │
//! │  │   │  Engine   │  │   rules   │                                 │   │
//! │  │   └───────────┘  └───────────┘                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    utsav-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Booking, TicketUnit, PassSelection, etc.)
//! - [`money`] - Money type with integer paise arithmetic (no floating point!)
//! - [`rates`] - Immutable rate table with exact-date / window / base resolution
//! - [`passes`] - Deterministic composite-pass expansion
//! - [`pricing`] - Booking pricing, bulk discounting, amount reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output.
//!    Booking creation and payment confirmation both run expansion and pricing
//!    independently and MUST agree.
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in paise (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use utsav_core::passes::expand;
//! use utsav_core::types::{FareCategory, PassSelection};
//!
//! // One couple pass becomes one male and one female gate entry
//! let selection = PassSelection::new()
//!     .with(FareCategory::Couple, 1)
//!     .with(FareCategory::Kids, 1);
//!
//! let expansion = expand(&selection).unwrap();
//! let cats: Vec<_> = expansion.units.iter().map(|u| u.category).collect();
//! assert_eq!(cats, vec![FareCategory::Male, FareCategory::Female, FareCategory::Kids]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod passes;
pub mod pricing;
pub mod rates;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use utsav_core::Money` instead of
// `use utsav_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use passes::{expand, Expansion};
pub use pricing::{PassAudit, PriceBreakdown, PriceLine, PricingEngine, Reconciled, UnitPrice};
pub use rates::{RateQuote, RateTable};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Direct male/female unit count at which the flat bulk rate kicks in.
///
/// ## Business Reason
/// Group bookings of six or more adults get the flat rate. Only passes
/// bought directly as `male`/`female` count; couple and family passes carry
/// their own package pricing.
pub const BULK_DISCOUNT_THRESHOLD: u32 = 6;

/// Flat per-adult rate (in rupees) once the bulk threshold is reached.
pub const BULK_FLAT_RATE_RUPEES: i64 = 350;

/// Reconciliation tolerance between declared and computed amounts, in paise.
///
/// Clients compute totals in floating point; one paisa absorbs their
/// rounding noise without opening the door to real mismatches.
pub const RECONCILE_TOLERANCE_PAISE: i64 = 1;

/// Lower edge (in rupees) of the accepted declared-amount correction bound.
pub const DECLARED_SANE_MIN_RUPEES: i64 = 99;

/// Upper edge (in rupees) of the accepted declared-amount correction bound.
pub const DECLARED_SANE_MAX_RUPEES: i64 = 10_000;

/// Maximum passes in a single booking.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10).
pub const MAX_PASSES_PER_BOOKING: u32 = 100;

/// Days a ticket stays listed as valid after issuance.
pub const TICKET_EXPIRY_DAYS: i64 = 30;
