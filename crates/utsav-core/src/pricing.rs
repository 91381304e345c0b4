//! # Pricing Engine
//!
//! Turns a validated pass selection into an authoritative price breakdown.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PassSelection ──► expand() ──► Expansion (units + bulk_eligible)       │
//! │       │                              │                                  │
//! │       ▼                              ▼                                  │
//! │  per-pass rate lookup         bulk_eligible >= 6 ?                      │
//! │  (exact date > window > base)        │                                  │
//! │       │                              ▼                                  │
//! │       │              flat ₹350 for DIRECT male/female lines            │
//! │       │              (skipped when an exact-date special is live)       │
//! │       ▼                              │                                  │
//! │  PriceBreakdown: lines + total + discount ◄──────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same engine runs at booking creation and again at payment
//! confirmation; both runs must land on the identical total. Everything here
//! is pure arithmetic over `Money` and the immutable rate table.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::passes::Expansion;
use crate::rates::RateTable;
use crate::types::{FareCategory, FareClass, PassSelection};
use crate::{
    BULK_DISCOUNT_THRESHOLD, BULK_FLAT_RATE_RUPEES, DECLARED_SANE_MAX_RUPEES,
    DECLARED_SANE_MIN_RUPEES, RECONCILE_TOLERANCE_PAISE,
};

// =============================================================================
// Price Breakdown
// =============================================================================

/// One priced line of a booking, per pass category as sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLine {
    pub category: FareCategory,
    pub count: u32,
    /// Base-table rate for the category, before any promotion or bulk rate.
    pub base_unit: Money,
    /// The rate actually charged per pass.
    pub final_unit: Money,
    pub subtotal: Money,
    /// Name of the promotion that set `final_unit`, if any.
    pub offer_label: Option<String>,
}

/// The authoritative priced view of a booking.
///
/// Persisted into the booking's audit blob so that later reads can see
/// exactly how the stored total was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub lines: Vec<PriceLine>,
    /// Sum of all line subtotals. Never negative; zero only under a named
    /// promotion.
    pub total: Money,
    pub discount_amount: Money,
    pub discount_applied: bool,
    /// First named promotion that touched the booking, if any.
    pub offer_label: Option<String>,
}

/// Audit record persisted alongside a booking.
///
/// Captures the original selection, the expanded per-category counts, and
/// the full breakdown, so a stored total can always be traced back to the
/// inputs that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassAudit {
    pub passes: PassSelection,
    pub expanded_counts: Vec<(FareCategory, u32)>,
    pub breakdown: PriceBreakdown,
}

/// Per-unit pricing answer for a single category, used by quote lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPrice {
    pub base_unit: Money,
    pub final_unit: Money,
    pub discount_applied: bool,
    /// Total saved across `quantity` units.
    pub discount_amount: Money,
    pub offer_label: Option<String>,
}

// =============================================================================
// Reconciliation
// =============================================================================

/// The outcome of reconciling a client-declared amount against the
/// server-computed total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Server total stands (no declaration, or declaration within tolerance).
    Computed(Money),
    /// Declared amount accepted in place of the computed one.
    ///
    /// Historical compromise for client-side rounding bugs; callers must
    /// log both amounts and persist this fact.
    Corrected { declared: Money, computed: Money },
}

impl Reconciled {
    /// The amount to charge and persist.
    pub fn amount(&self) -> Money {
        match self {
            Reconciled::Computed(m) => *m,
            Reconciled::Corrected { declared, .. } => *declared,
        }
    }

    pub fn was_corrected(&self) -> bool {
        matches!(self, Reconciled::Corrected { .. })
    }
}

// =============================================================================
// Pricing Engine
// =============================================================================

/// Stateless calculator over an immutable rate table.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    rates: Arc<RateTable>,
}

impl PricingEngine {
    pub fn new(rates: Arc<RateTable>) -> Self {
        PricingEngine { rates }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    fn bulk_flat_rate() -> Money {
        Money::from_rupees(BULK_FLAT_RATE_RUPEES)
    }

    /// Whether the flat bulk rate is in force for this booking.
    ///
    /// Requires the single fare class, no live exact-date special, and at
    /// least [`BULK_DISCOUNT_THRESHOLD`] direct male/female units.
    fn bulk_active(&self, fare_class: FareClass, date: NaiveDate, bulk_eligible: u32) -> bool {
        fare_class == FareClass::Single
            && bulk_eligible >= BULK_DISCOUNT_THRESHOLD
            && !self.rates.has_exact_date_special(date)
    }

    // =========================================================================
    // Per-Unit Pricing
    // =========================================================================

    /// Prices `quantity` passes of one category, as a quote.
    ///
    /// The bulk rule is evaluated as if all `quantity` passes were bought
    /// directly, which is exactly the situation for a single-category quote.
    pub fn price_unit(
        &self,
        category: FareCategory,
        fare_class: FareClass,
        quantity: u32,
        date: NaiveDate,
    ) -> CoreResult<UnitPrice> {
        let base_unit = self.rates.base_rate(fare_class, category)?;
        let quote = self.rates.resolve(fare_class, category, date)?;

        let bulk_eligible = if category.is_elementary() && category != FareCategory::Kids {
            quantity
        } else {
            0
        };

        let final_unit = if self.bulk_active(fare_class, date, bulk_eligible) {
            quote.price.min_of(Self::bulk_flat_rate())
        } else {
            quote.price
        };

        let discount_amount = (base_unit - final_unit).multiply_quantity(quantity as i64);
        Ok(UnitPrice {
            base_unit,
            final_unit,
            discount_applied: discount_amount.is_positive(),
            discount_amount,
            offer_label: quote.offer_label,
        })
    }

    // =========================================================================
    // Booking Pricing
    // =========================================================================

    /// Prices a whole booking from its original selection and expansion.
    ///
    /// Lines follow the selection (a couple pass is one line at the couple
    /// rate, not two adult lines); the expansion contributes the
    /// bulk-eligibility count. Deterministic: identical inputs always
    /// reproduce the identical breakdown.
    pub fn price_booking(
        &self,
        selection: &PassSelection,
        expansion: &Expansion,
        fare_class: FareClass,
        date: NaiveDate,
    ) -> CoreResult<PriceBreakdown> {
        let bulk = self.bulk_active(fare_class, date, expansion.bulk_eligible);

        let mut lines = Vec::new();
        let mut total = Money::zero();
        let mut discount_amount = Money::zero();
        let mut offer_label: Option<String> = None;

        for (category, count) in selection.entries() {
            let base_unit = self.rates.base_rate(fare_class, category)?;
            let quote = self.rates.resolve(fare_class, category, date)?;

            let bulk_applies = bulk
                && matches!(category, FareCategory::Male | FareCategory::Female);
            let final_unit = if bulk_applies {
                quote.price.min_of(Self::bulk_flat_rate())
            } else {
                quote.price
            };

            let subtotal = final_unit * count;
            total += subtotal;
            discount_amount += (base_unit - final_unit).multiply_quantity(count as i64);

            if offer_label.is_none() {
                offer_label = quote.offer_label.clone();
            }

            lines.push(PriceLine {
                category,
                count,
                base_unit,
                final_unit,
                subtotal,
                offer_label: quote.offer_label,
            });
        }

        if total.is_zero() && offer_label.is_none() {
            return Err(CoreError::ZeroTotalWithoutOffer);
        }

        Ok(PriceBreakdown {
            lines,
            total,
            discount_applied: discount_amount.is_positive(),
            discount_amount,
            offer_label,
        })
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Reconciles a client-declared amount against the computed total.
    ///
    /// Within one paisa the computed total stands. Outside tolerance the
    /// request fails, UNLESS the declared amount sits inside the sane bound
    /// (₹99 to ₹10,000), in which case the declared amount wins and is
    /// reported as `Corrected` for the caller to log and persist.
    pub fn reconcile(&self, computed: Money, declared: Option<Money>) -> CoreResult<Reconciled> {
        let declared = match declared {
            None => return Ok(Reconciled::Computed(computed)),
            Some(d) => d,
        };

        if computed.abs_diff(declared) <= Money::from_paise(RECONCILE_TOLERANCE_PAISE) {
            return Ok(Reconciled::Computed(computed));
        }

        let sane_min = Money::from_rupees(DECLARED_SANE_MIN_RUPEES);
        let sane_max = Money::from_rupees(DECLARED_SANE_MAX_RUPEES);
        if declared >= sane_min && declared <= sane_max {
            return Ok(Reconciled::Corrected { declared, computed });
        }

        Err(CoreError::Reconciliation {
            computed_paise: computed.paise(),
            declared_paise: declared.paise(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::expand;

    fn engine() -> PricingEngine {
        PricingEngine::new(Arc::new(RateTable::festival_2025()))
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn priced(selection: &PassSelection, fare_class: FareClass, on: NaiveDate) -> PriceBreakdown {
        let expansion = expand(selection).unwrap();
        engine()
            .price_booking(selection, &expansion, fare_class, on)
            .unwrap()
    }

    #[test]
    fn test_promo_female_single_rupee() {
        let selection = PassSelection::new().with(FareCategory::Female, 1);
        let breakdown = priced(&selection, FareClass::Single, date(9, 23));

        assert_eq!(breakdown.total, Money::from_rupees(1));
        assert_eq!(breakdown.offer_label.as_deref(), Some("Women's Special"));
    }

    #[test]
    fn test_bulk_six_females() {
        let selection = PassSelection::new().with(FareCategory::Female, 6);
        let breakdown = priced(&selection, FareClass::Single, date(9, 24));

        assert_eq!(breakdown.total, Money::from_rupees(2100));
        assert!(breakdown.discount_applied);
        assert_eq!(breakdown.discount_amount, Money::from_rupees(294));
        assert_eq!(breakdown.lines.len(), 1);
        assert_eq!(breakdown.lines[0].final_unit, Money::from_rupees(350));
        assert_eq!(breakdown.lines[0].base_unit, Money::from_rupees(399));
    }

    #[test]
    fn test_three_couples_get_no_bulk_rate() {
        // 6 expanded adults, 0 bulk-eligible: couple-derived units never
        // count toward or receive the flat rate
        let selection = PassSelection::new().with(FareCategory::Couple, 3);
        let breakdown = priced(&selection, FareClass::Single, date(9, 24));

        assert_eq!(breakdown.total, Money::from_rupees(2097));
        assert!(!breakdown.discount_applied);
        assert_eq!(breakdown.discount_amount, Money::zero());
    }

    #[test]
    fn test_bulk_applies_only_to_direct_adult_lines() {
        let selection = PassSelection::new()
            .with(FareCategory::Female, 6)
            .with(FareCategory::Couple, 1)
            .with(FareCategory::Kids, 1);
        let breakdown = priced(&selection, FareClass::Single, date(9, 24));

        // female 6 × 350 + couple 699 + kids 99
        assert_eq!(breakdown.total, Money::from_rupees(2100 + 699 + 99));
        assert_eq!(breakdown.discount_amount, Money::from_rupees(294));

        let couple_line = breakdown
            .lines
            .iter()
            .find(|l| l.category == FareCategory::Couple)
            .unwrap();
        assert_eq!(couple_line.final_unit, Money::from_rupees(699));
    }

    #[test]
    fn test_exact_date_special_suppresses_bulk() {
        let selection = PassSelection::new().with(FareCategory::Female, 6);
        let breakdown = priced(&selection, FareClass::Single, date(9, 23));

        // ₹1 each under the special, not ₹350 under the bulk rate
        assert_eq!(breakdown.total, Money::from_rupees(6));
        assert_eq!(breakdown.lines[0].final_unit, Money::from_rupees(1));
    }

    #[test]
    fn test_bulk_never_raises_a_window_price() {
        // Dhamaka female rate 249 is below the flat 350; bulk must not
        // push the price up
        let selection = PassSelection::new().with(FareCategory::Female, 6);
        let breakdown = priced(&selection, FareClass::Single, date(9, 27));

        assert_eq!(breakdown.lines[0].final_unit, Money::from_rupees(249));
        assert_eq!(breakdown.total, Money::from_rupees(1494));
    }

    #[test]
    fn test_season_ignores_promotions_and_bulk() {
        let selection = PassSelection::new().with(FareCategory::Female, 6);
        let breakdown = priced(&selection, FareClass::Season, date(9, 27));

        assert_eq!(breakdown.total, Money::from_rupees(2499 * 6));
        assert!(!breakdown.discount_applied);
    }

    #[test]
    fn test_total_equals_sum_of_lines() {
        let selection = PassSelection::new()
            .with(FareCategory::Female, 2)
            .with(FareCategory::Couple, 1)
            .with(FareCategory::Family, 1)
            .with(FareCategory::Kids, 3);
        let breakdown = priced(&selection, FareClass::Single, date(9, 26));

        let line_sum: Money = breakdown.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(breakdown.total, line_sum);
        assert!(breakdown.total.is_positive());
    }

    #[test]
    fn test_pricing_is_deterministic() {
        let selection = PassSelection::new()
            .with(FareCategory::Female, 7)
            .with(FareCategory::Couple, 2);

        let first = priced(&selection, FareClass::Single, date(9, 28));
        let second = priced(&selection, FareClass::Single, date(9, 28));
        assert_eq!(first, second);
    }

    #[test]
    fn test_price_unit_quote() {
        let quote = engine()
            .price_unit(FareCategory::Female, FareClass::Single, 6, date(9, 24))
            .unwrap();
        assert_eq!(quote.final_unit, Money::from_rupees(350));
        assert!(quote.discount_applied);
        assert_eq!(quote.discount_amount, Money::from_rupees(294));

        let quote = engine()
            .price_unit(FareCategory::Couple, FareClass::Single, 6, date(9, 24))
            .unwrap();
        assert_eq!(quote.final_unit, Money::from_rupees(699));
        assert!(!quote.discount_applied);
    }

    #[test]
    fn test_zero_total_requires_named_offer() {
        let d = date(9, 24);
        let free_table = RateTable::new(date(9, 23), date(9, 30))
            .with_base(FareClass::Single, FareCategory::Female, Money::zero());
        let engine = PricingEngine::new(Arc::new(free_table));

        let selection = PassSelection::new().with(FareCategory::Female, 1);
        let expansion = expand(&selection).unwrap();
        let err = engine
            .price_booking(&selection, &expansion, FareClass::Single, d)
            .unwrap_err();
        assert!(matches!(err, CoreError::ZeroTotalWithoutOffer));

        // The same zero price under a named promotion is legitimate
        let promo_table = RateTable::new(date(9, 23), date(9, 30))
            .with_base(FareClass::Single, FareCategory::Female, Money::from_rupees(399))
            .with_exact_date(d, "Free Entry", &[(FareCategory::Female, Money::zero())]);
        let engine = PricingEngine::new(Arc::new(promo_table));
        let breakdown = engine
            .price_booking(&selection, &expansion, FareClass::Single, d)
            .unwrap();
        assert!(breakdown.total.is_zero());
        assert_eq!(breakdown.offer_label.as_deref(), Some("Free Entry"));
    }

    #[test]
    fn test_reconcile_within_tolerance() {
        let engine = engine();
        let computed = Money::from_rupees(2100);

        let r = engine.reconcile(computed, None).unwrap();
        assert_eq!(r.amount(), computed);
        assert!(!r.was_corrected());

        let r = engine
            .reconcile(computed, Some(Money::from_paise(210001)))
            .unwrap();
        assert_eq!(r.amount(), computed);
    }

    #[test]
    fn test_reconcile_sane_bound_correction() {
        let engine = engine();
        let computed = Money::from_rupees(2100);
        let declared = Money::from_rupees(1994);

        let r = engine.reconcile(computed, Some(declared)).unwrap();
        assert!(r.was_corrected());
        assert_eq!(r.amount(), declared);
    }

    #[test]
    fn test_reconcile_rejects_outside_sane_bound() {
        let engine = engine();
        let computed = Money::from_rupees(2100);

        let err = engine
            .reconcile(computed, Some(Money::from_rupees(5)))
            .unwrap_err();
        assert!(matches!(err, CoreError::Reconciliation { .. }));

        let err = engine
            .reconcile(computed, Some(Money::from_rupees(99_999)))
            .unwrap_err();
        assert!(matches!(err, CoreError::Reconciliation { .. }));
    }
}
