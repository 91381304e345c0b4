//! # Rate Table
//!
//! Date-keyed price lookup for (fare class × category).
//!
//! ## Resolution Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve(fare_class, category, date)                                    │
//! │                                                                         │
//! │  1. Exact-date special   (single fare class only, category present)     │
//! │  2. Promotional window   (single fare class only, date within range,    │
//! │                           category present)                             │
//! │  3. Base rate            (always present, or UnknownRate)               │
//! │                                                                         │
//! │  Overrides may omit categories. An omitted category falls back to       │
//! │  the NEXT strategy, never to zero.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table is immutable configuration, built once at startup and shared
//! freely across concurrent requests. New promotions are added declaratively
//! with `with_exact_date` / `with_window`, not by editing resolution code.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{FareCategory, FareClass};

// =============================================================================
// Rate Quote
// =============================================================================

/// The outcome of one rate resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuote {
    /// Per-unit price for the category on the date.
    pub price: Money,
    /// Name of the promotion that produced this price; `None` for base.
    pub offer_label: Option<String>,
    /// True when an exact-date special won. Bulk discounting is skipped
    /// for single-fare bookings on such dates.
    pub exact_date: bool,
}

// =============================================================================
// Overrides
// =============================================================================

#[derive(Debug, Clone)]
enum OverrideSpan {
    ExactDate(NaiveDate),
    Window { start: NaiveDate, end: NaiveDate },
}

impl OverrideSpan {
    fn applies_on(&self, date: NaiveDate) -> bool {
        match self {
            OverrideSpan::ExactDate(d) => *d == date,
            OverrideSpan::Window { start, end } => date >= *start && date <= *end,
        }
    }

    fn is_exact(&self) -> bool {
        matches!(self, OverrideSpan::ExactDate(_))
    }
}

/// One named promotion: a date span plus the categories it discounts.
#[derive(Debug, Clone)]
struct RateOverride {
    label: String,
    span: OverrideSpan,
    rates: BTreeMap<FareCategory, Money>,
}

// =============================================================================
// Rate Table
// =============================================================================

/// Immutable pricing configuration.
///
/// Also carries the bookable calendar: the festival window and any closed
/// dates inside it, so date validation and pricing read the same config.
#[derive(Debug, Clone)]
pub struct RateTable {
    base: BTreeMap<(FareClass, FareCategory), Money>,
    overrides: Vec<RateOverride>,
    festival_start: NaiveDate,
    festival_end: NaiveDate,
    closed_dates: BTreeSet<NaiveDate>,
}

impl RateTable {
    /// Empty table for the given festival window. Base rates must be added
    /// before the table is usable.
    pub fn new(festival_start: NaiveDate, festival_end: NaiveDate) -> Self {
        RateTable {
            base: BTreeMap::new(),
            overrides: Vec::new(),
            festival_start,
            festival_end,
            closed_dates: BTreeSet::new(),
        }
    }

    pub fn with_base(mut self, fare_class: FareClass, category: FareCategory, price: Money) -> Self {
        self.base.insert((fare_class, category), price);
        self
    }

    /// Adds a named exact-date special. Applies to `single` fare only.
    pub fn with_exact_date(
        mut self,
        date: NaiveDate,
        label: &str,
        rates: &[(FareCategory, Money)],
    ) -> Self {
        self.overrides.push(RateOverride {
            label: label.to_string(),
            span: OverrideSpan::ExactDate(date),
            rates: rates.iter().copied().collect(),
        });
        self
    }

    /// Adds a named promotional window. Applies to `single` fare only.
    pub fn with_window(
        mut self,
        start: NaiveDate,
        end: NaiveDate,
        label: &str,
        rates: &[(FareCategory, Money)],
    ) -> Self {
        self.overrides.push(RateOverride {
            label: label.to_string(),
            span: OverrideSpan::Window { start, end },
            rates: rates.iter().copied().collect(),
        });
        self
    }

    /// Marks a date inside the festival window as not bookable.
    pub fn with_closed_date(mut self, date: NaiveDate) -> Self {
        self.closed_dates.insert(date);
        self
    }

    // =========================================================================
    // Calendar
    // =========================================================================

    pub fn festival_window(&self) -> (NaiveDate, NaiveDate) {
        (self.festival_start, self.festival_end)
    }

    pub fn is_within_festival(&self, date: NaiveDate) -> bool {
        date >= self.festival_start && date <= self.festival_end
    }

    pub fn is_closed(&self, date: NaiveDate) -> bool {
        self.closed_dates.contains(&date)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolves the per-unit price for a category on a date.
    ///
    /// Exact-date specials beat windows beat base. Overrides never apply to
    /// season fares. A missing base entry is a configuration defect and
    /// errors out rather than pricing at zero.
    pub fn resolve(
        &self,
        fare_class: FareClass,
        category: FareCategory,
        date: NaiveDate,
    ) -> CoreResult<RateQuote> {
        if fare_class == FareClass::Single {
            // Two passes over one declaration-ordered list keeps the
            // priority rule out of the override definitions themselves.
            for exact_only in [true, false] {
                for ov in &self.overrides {
                    if ov.span.is_exact() != exact_only || !ov.span.applies_on(date) {
                        continue;
                    }
                    if let Some(price) = ov.rates.get(&category) {
                        return Ok(RateQuote {
                            price: *price,
                            offer_label: Some(ov.label.clone()),
                            exact_date: exact_only,
                        });
                    }
                }
            }
        }

        let price = self
            .base
            .get(&(fare_class, category))
            .copied()
            .ok_or(CoreError::UnknownRate {
                fare_class,
                category,
            })?;

        Ok(RateQuote {
            price,
            offer_label: None,
            exact_date: false,
        })
    }

    /// The base-table rate, ignoring all overrides. Pricing uses this as
    /// the reference point when reporting discount amounts.
    pub fn base_rate(&self, fare_class: FareClass, category: FareCategory) -> CoreResult<Money> {
        self.base
            .get(&(fare_class, category))
            .copied()
            .ok_or(CoreError::UnknownRate {
                fare_class,
                category,
            })
    }

    /// True when an exact-date special is in effect for any category on
    /// this date. Bulk discounting stands down on such dates.
    pub fn has_exact_date_special(&self, date: NaiveDate) -> bool {
        self.overrides
            .iter()
            .any(|ov| ov.span.is_exact() && ov.span.applies_on(date))
    }

    // =========================================================================
    // Production Configuration
    // =========================================================================

    /// The Malang Raas Dandiya 2025 table.
    ///
    /// Eight bookable days (2025-09-23 through 2025-09-30, with the 25th
    /// closed), the women's ₹1 special on opening day, and the two Dhamaka
    /// windows.
    pub fn festival_2025() -> Self {
        let d = |m: u32, day: u32| {
            // Static calendar data, checked by the constructor tests below
            NaiveDate::from_ymd_opt(2025, m, day).expect("valid festival date")
        };

        RateTable::new(d(9, 23), d(9, 30))
            .with_closed_date(d(9, 25))
            // Single-day base rates
            .with_base(FareClass::Single, FareCategory::Female, Money::from_rupees(399))
            .with_base(FareClass::Single, FareCategory::Male, Money::from_rupees(499))
            .with_base(FareClass::Single, FareCategory::Couple, Money::from_rupees(699))
            .with_base(FareClass::Single, FareCategory::Family, Money::from_rupees(1300))
            .with_base(FareClass::Single, FareCategory::Kids, Money::from_rupees(99))
            // Season base rates
            .with_base(FareClass::Season, FareCategory::Female, Money::from_rupees(2499))
            .with_base(FareClass::Season, FareCategory::Male, Money::from_rupees(2999))
            .with_base(FareClass::Season, FareCategory::Couple, Money::from_rupees(3499))
            .with_base(FareClass::Season, FareCategory::Family, Money::from_rupees(5999))
            .with_base(FareClass::Season, FareCategory::Kids, Money::from_rupees(999))
            // Opening-day women's special
            .with_exact_date(
                d(9, 23),
                "Women's Special",
                &[(FareCategory::Female, Money::from_rupees(1))],
            )
            // Dhamaka windows
            .with_window(
                d(9, 27),
                d(9, 28),
                "Dhamaka 27-28",
                &[
                    (FareCategory::Female, Money::from_rupees(249)),
                    (FareCategory::Male, Money::from_rupees(299)),
                    (FareCategory::Couple, Money::from_rupees(399)),
                ],
            )
            .with_window(
                d(9, 29),
                d(9, 30),
                "Dhamaka 29-30",
                &[
                    (FareCategory::Female, Money::from_rupees(299)),
                    (FareCategory::Male, Money::from_rupees(399)),
                    (FareCategory::Couple, Money::from_rupees(499)),
                ],
            )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_base_rates() {
        let table = RateTable::festival_2025();

        let quote = table
            .resolve(FareClass::Single, FareCategory::Female, date(9, 24))
            .unwrap();
        assert_eq!(quote.price, Money::from_rupees(399));
        assert_eq!(quote.offer_label, None);
        assert!(!quote.exact_date);

        let quote = table
            .resolve(FareClass::Season, FareCategory::Family, date(9, 24))
            .unwrap();
        assert_eq!(quote.price, Money::from_rupees(5999));
    }

    #[test]
    fn test_exact_date_beats_window_and_base() {
        let table = RateTable::festival_2025();

        let quote = table
            .resolve(FareClass::Single, FareCategory::Female, date(9, 23))
            .unwrap();
        assert_eq!(quote.price, Money::from_rupees(1));
        assert_eq!(quote.offer_label.as_deref(), Some("Women's Special"));
        assert!(quote.exact_date);
    }

    #[test]
    fn test_window_rates() {
        let table = RateTable::festival_2025();

        let quote = table
            .resolve(FareClass::Single, FareCategory::Male, date(9, 27))
            .unwrap();
        assert_eq!(quote.price, Money::from_rupees(299));
        assert_eq!(quote.offer_label.as_deref(), Some("Dhamaka 27-28"));
        assert!(!quote.exact_date);

        let quote = table
            .resolve(FareClass::Single, FareCategory::Male, date(9, 29))
            .unwrap();
        assert_eq!(quote.price, Money::from_rupees(399));
        assert_eq!(quote.offer_label.as_deref(), Some("Dhamaka 29-30"));
    }

    #[test]
    fn test_omitted_category_falls_back_to_base() {
        let table = RateTable::festival_2025();

        // Women's Special only covers female; male on the same day is base
        let quote = table
            .resolve(FareClass::Single, FareCategory::Male, date(9, 23))
            .unwrap();
        assert_eq!(quote.price, Money::from_rupees(499));
        assert_eq!(quote.offer_label, None);

        // Dhamaka windows omit kids
        let quote = table
            .resolve(FareClass::Single, FareCategory::Kids, date(9, 27))
            .unwrap();
        assert_eq!(quote.price, Money::from_rupees(99));
        assert_eq!(quote.offer_label, None);
    }

    #[test]
    fn test_overrides_never_apply_to_season() {
        let table = RateTable::festival_2025();

        let quote = table
            .resolve(FareClass::Season, FareCategory::Female, date(9, 23))
            .unwrap();
        assert_eq!(quote.price, Money::from_rupees(2499));
        assert_eq!(quote.offer_label, None);
    }

    #[test]
    fn test_unknown_rate_is_an_error_not_zero() {
        let table = RateTable::new(date(9, 23), date(9, 30))
            .with_base(FareClass::Single, FareCategory::Female, Money::from_rupees(399));

        let err = table
            .resolve(FareClass::Single, FareCategory::Male, date(9, 24))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownRate { .. }));
    }

    #[test]
    fn test_calendar() {
        let table = RateTable::festival_2025();

        assert!(table.is_within_festival(date(9, 23)));
        assert!(table.is_within_festival(date(9, 30)));
        assert!(!table.is_within_festival(date(9, 22)));
        assert!(!table.is_within_festival(date(10, 1)));

        assert!(table.is_closed(date(9, 25)));
        assert!(!table.is_closed(date(9, 26)));
    }

    #[test]
    fn test_exact_date_special_flag() {
        let table = RateTable::festival_2025();
        assert!(table.has_exact_date_special(date(9, 23)));
        assert!(!table.has_exact_date_special(date(9, 27)));
    }
}
