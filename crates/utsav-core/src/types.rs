//! # Domain Types
//!
//! Core domain types used throughout Utsav Ticketing.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Booking      │   │   TicketUnit    │   │ PaymentRecord   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  booking_date   │   │  ticket_number  │   │  booking_id(FK) │       │
//! │  │  status         │   │  category       │   │  order_id       │       │
//! │  │  total_paise    │   │  is_used        │   │  amount_paise   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  FareCategory   │   │   FareClass     │   │  BookingStatus  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Male  Female   │   │  Single         │   │  Pending        │       │
//! │  │  Kids  Couple   │   │  Season         │   │  Confirmed      │       │
//! │  │  Family         │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering Is Load-Bearing
//! `FareCategory` derives `Ord` in declaration order, which IS the canonical
//! expansion order (male, female, kids, then composites). Pass selections are
//! `BTreeMap`s keyed by category, so iteration order (and with it the
//! expanded unit sequence and ticket numbering) is identical on every call.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Fare Category
// =============================================================================

/// A pass/ticket category as sold at the counter.
///
/// `Male`, `Female` and `Kids` are *elementary*: one pass is one gate entry.
/// `Couple` and `Family` are *composite*: they expand into elementary units
/// (couple → 1 male + 1 female, family → 2 male + 2 female) before pricing
/// and ticket issuance.
///
/// Declaration order is the canonical expansion order; do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum FareCategory {
    Male,
    Female,
    Kids,
    Couple,
    Family,
}

impl FareCategory {
    /// Whether this category maps 1:1 to a gate entry.
    #[inline]
    pub const fn is_elementary(&self) -> bool {
        matches!(self, FareCategory::Male | FareCategory::Female | FareCategory::Kids)
    }

    /// Whether this category is a composite pass that expands.
    #[inline]
    pub const fn is_composite(&self) -> bool {
        !self.is_elementary()
    }

    /// Lowercase wire/database name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FareCategory::Male => "male",
            FareCategory::Female => "female",
            FareCategory::Kids => "kids",
            FareCategory::Couple => "couple",
            FareCategory::Family => "family",
        }
    }

    /// All categories, in canonical order.
    pub const ALL: [FareCategory; 5] = [
        FareCategory::Male,
        FareCategory::Female,
        FareCategory::Kids,
        FareCategory::Couple,
        FareCategory::Family,
    ];
}

impl fmt::Display for FareCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses counter names including the legacy aliases still sent by older
/// clients (`kid` for kids, `family4` for the 4-member family pass).
impl FromStr for FareCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(FareCategory::Male),
            "female" => Ok(FareCategory::Female),
            "kids" | "kid" => Ok(FareCategory::Kids),
            "couple" => Ok(FareCategory::Couple),
            "family" | "family4" => Ok(FareCategory::Family),
            other => Err(ValidationError::InvalidCategory {
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Fare Class
// =============================================================================

/// Which rate-table partition a booking consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum FareClass {
    /// One event day. Promotional windows and date specials apply here only.
    Single,
    /// All festival days on one ticket.
    Season,
}

impl FareClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FareClass::Single => "single",
            FareClass::Season => "season",
        }
    }
}

impl fmt::Display for FareClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FareClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(FareClass::Single),
            "season" => Ok(FareClass::Season),
            other => Err(ValidationError::InvalidFareClass {
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Pass Selection
// =============================================================================

/// What the client asked for: category → positive quantity.
///
/// Backed by a `BTreeMap` so that iteration order is the canonical category
/// order regardless of how the client serialized its JSON object. This is
/// what makes `expand()` deterministic across the two times it runs
/// (booking creation and payment confirmation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassSelection(BTreeMap<FareCategory, u32>);

impl PassSelection {
    pub fn new() -> Self {
        PassSelection(BTreeMap::new())
    }

    /// Builder-style insert; zero quantities are dropped rather than stored.
    pub fn with(mut self, category: FareCategory, quantity: u32) -> Self {
        self.set(category, quantity);
        self
    }

    pub fn set(&mut self, category: FareCategory, quantity: u32) {
        if quantity == 0 {
            self.0.remove(&category);
        } else {
            self.0.insert(category, quantity);
        }
    }

    pub fn quantity(&self, category: FareCategory) -> u32 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    /// Entries with a positive quantity, in canonical category order.
    pub fn entries(&self) -> impl Iterator<Item = (FareCategory, u32)> + '_ {
        self.0.iter().map(|(c, q)| (*c, *q))
    }

    /// Categories with a positive quantity, in canonical order.
    pub fn categories(&self) -> impl Iterator<Item = FareCategory> + '_ {
        self.0.keys().copied()
    }

    /// True when no category has a positive quantity.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of passes as sold (a couple counts as 1 here, not 2).
    pub fn pass_count(&self) -> u32 {
        self.0.values().sum()
    }

    /// Builds a selection from counter names, resolving legacy aliases.
    ///
    /// Quantities for aliased names accumulate (`kid: 1, kids: 1` → kids: 2).
    pub fn from_named<'a, I>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut selection = PassSelection::new();
        for (name, qty) in entries {
            if qty == 0 {
                continue;
            }
            let category = FareCategory::from_str(name)?;
            let current = selection.quantity(category);
            selection.set(category, current + qty);
        }
        Ok(selection)
    }
}

// =============================================================================
// Expanded Units
// =============================================================================

/// Where an expanded unit came from.
///
/// Bulk-discount eligibility depends on this: only units bought directly as
/// `male`/`female` passes count toward (or receive) the bulk rate.
/// Declaration order is the tie-break order within a category block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSource {
    /// Sold directly as an elementary pass.
    Direct,
    /// Produced by expanding a couple pass.
    Couple,
    /// Produced by expanding a family pass.
    Family,
}

/// One elementary ticket slot produced by pass expansion.
///
/// Unit #i's category must be reproducible identically between booking
/// creation and payment confirmation; ticket numbering depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedUnit {
    pub category: FareCategory,
    pub source: UnitSource,
}

impl ExpandedUnit {
    pub const fn new(category: FareCategory, source: UnitSource) -> Self {
        ExpandedUnit { category, source }
    }
}

// =============================================================================
// Booking Status
// =============================================================================

/// The booking state machine: `pending → confirmed` (terminal).
///
/// The transition happens exactly once, as an atomic conditional update in
/// storage; ticket units exist only for confirmed bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

// =============================================================================
// Booking
// =============================================================================

/// The persistent booking aggregate.
///
/// Owns its ticket units (created together at confirmation, never
/// independently). The original pass selection is stored so that
/// confirmation can re-expand it and arrive at the identical unit sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier (UUID v4; `offline-` prefixed when synthetic).
    pub id: String,
    /// The event day this booking is for (festival start day for season).
    pub booking_date: NaiveDate,
    pub fare_class: FareClass,
    pub status: BookingStatus,
    /// The original client selection, before composite expansion.
    pub passes: PassSelection,
    /// Server-computed total, in paise.
    pub total_paise: i64,
    /// Discount included in the total, in paise.
    pub discount_paise: i64,
    /// Reference to the payment row once an order is opened.
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_paise(self.discount_paise)
    }
}

/// A booking as returned by booking creation.
///
/// `Synthetic` is the degraded-mode result used when storage is
/// unreachable: the caller gets a complete, priced booking it can show the
/// customer, but the record is NOT durable and must be reconciled once the
/// database comes back. The tag forces downstream code to handle that case
/// explicitly instead of checking a stringly-typed flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BookingRecord {
    Persisted(Booking),
    Synthetic(Booking),
}

impl BookingRecord {
    pub fn booking(&self) -> &Booking {
        match self {
            BookingRecord::Persisted(b) | BookingRecord::Synthetic(b) => b,
        }
    }

    pub fn into_booking(self) -> Booking {
        match self {
            BookingRecord::Persisted(b) | BookingRecord::Synthetic(b) => b,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, BookingRecord::Synthetic(_))
    }
}

// =============================================================================
// Ticket Unit
// =============================================================================

/// One gate entry, created at payment confirmation.
///
/// The count per booking is fixed at first successful confirmation and
/// never grows; `is_used` flips false → true exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TicketUnit {
    pub id: String,
    pub booking_id: String,
    /// Opaque token embedded in the QR code. Unique across all bookings.
    pub ticket_number: String,
    pub category: FareCategory,
    /// JSON payload rendered into the QR image; parsed back at the gate.
    pub qr_payload: String,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

/// Payment lifecycle: an order is `created` at the gateway, then marked
/// `paid` when confirmation arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Paid,
}

/// A payment order linked to a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentRecord {
    pub id: String,
    pub booking_id: String,
    /// Gateway order id returned by `create_order`.
    pub order_id: String,
    /// Gateway payment reference, set at confirmation.
    pub payment_ref: Option<String>,
    pub amount_paise: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

// =============================================================================
// Attendee
// =============================================================================

/// A person attached to a booking.
///
/// Booking creation does not require one, but notification dispatch needs a
/// primary contact (first attendee wins when none is flagged primary).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Attendee {
    pub id: String,
    pub booking_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_aliases() {
        assert_eq!("kid".parse::<FareCategory>().unwrap(), FareCategory::Kids);
        assert_eq!("family4".parse::<FareCategory>().unwrap(), FareCategory::Family);
        assert_eq!(" Female ".parse::<FareCategory>().unwrap(), FareCategory::Female);
        assert!("vip".parse::<FareCategory>().is_err());
    }

    #[test]
    fn test_canonical_order() {
        let mut cats = vec![FareCategory::Kids, FareCategory::Female, FareCategory::Male];
        cats.sort();
        assert_eq!(
            cats,
            vec![FareCategory::Male, FareCategory::Female, FareCategory::Kids]
        );
    }

    #[test]
    fn test_selection_iterates_in_canonical_order() {
        // Insertion order must not leak into iteration order
        let selection = PassSelection::new()
            .with(FareCategory::Kids, 1)
            .with(FareCategory::Male, 2)
            .with(FareCategory::Female, 3);

        let cats: Vec<_> = selection.categories().collect();
        assert_eq!(
            cats,
            vec![FareCategory::Male, FareCategory::Female, FareCategory::Kids]
        );
    }

    #[test]
    fn test_selection_drops_zero_quantities() {
        let selection = PassSelection::new()
            .with(FareCategory::Female, 2)
            .with(FareCategory::Male, 0);
        assert_eq!(selection.quantity(FareCategory::Male), 0);
        assert_eq!(selection.pass_count(), 2);
        assert_eq!(selection.categories().count(), 1);
    }

    #[test]
    fn test_from_named_accumulates_aliases() {
        let selection =
            PassSelection::from_named([("kid", 1), ("kids", 1), ("couple", 2)]).unwrap();
        assert_eq!(selection.quantity(FareCategory::Kids), 2);
        assert_eq!(selection.quantity(FareCategory::Couple), 2);
    }

    #[test]
    fn test_booking_record_tagging() {
        let booking = Booking {
            id: "offline-1700000000".to_string(),
            booking_date: NaiveDate::from_ymd_opt(2025, 9, 26).unwrap(),
            fare_class: FareClass::Single,
            status: BookingStatus::Pending,
            passes: PassSelection::new().with(FareCategory::Female, 1),
            total_paise: 39900,
            discount_paise: 0,
            payment_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let record = BookingRecord::Synthetic(booking);
        assert!(record.is_synthetic());
        assert_eq!(record.booking().total(), Money::from_rupees(399));
    }
}
