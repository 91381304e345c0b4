//! # Pass Expander
//!
//! Converts a client pass selection into the ordered list of elementary
//! ticket slots that pricing and issuance operate on.
//!
//! ## Expansion Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  couple × 1  →  1 male + 1 female                                       │
//! │  family × 1  →  2 male + 2 female                                       │
//! │  male/female/kids × n  →  n units, unchanged                            │
//! │                                                                         │
//! │  Output order (ALWAYS, regardless of input key order):                  │
//! │    male block   : direct, couple-derived, family-derived                │
//! │    female block : direct, couple-derived, family-derived                │
//! │    kids block   : direct                                                │
//! │                                                                         │
//! │  {couple: 2, kids: 1, male: 1}                                          │
//! │    → [male(direct), male(couple), male(couple),                         │
//! │       female(couple), female(couple), kids(direct)]                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Is Load-Bearing
//! Booking creation and payment confirmation both expand the stored
//! selection independently. Unit #i's category decides ticket #i's
//! category, so two calls with the same input MUST produce byte-identical
//! sequences. Grouped canonical ordering (not input insertion order) is
//! what guarantees this.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{ExpandedUnit, FareCategory, PassSelection, UnitSource};
use crate::validation::validate_selection;

// =============================================================================
// Expansion Result
// =============================================================================

/// The expanded unit sequence plus bulk-discount bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    /// Elementary units in canonical grouped order.
    pub units: Vec<ExpandedUnit>,
    /// Units whose ORIGINAL pass was bought directly as male or female.
    /// Couple/family-derived units never count here.
    pub bulk_eligible: u32,
}

impl Expansion {
    /// Total gate entries this booking will issue.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Expanded counts per category, for the audit blob.
    pub fn counts(&self) -> Vec<(FareCategory, u32)> {
        let mut out: Vec<(FareCategory, u32)> = Vec::new();
        for unit in &self.units {
            match out.iter_mut().find(|(c, _)| *c == unit.category) {
                Some((_, n)) => *n += 1,
                None => out.push((unit.category, 1)),
            }
        }
        out
    }
}

// =============================================================================
// Expansion
// =============================================================================

/// Expands a validated pass selection into elementary units.
///
/// Selection rules (empty, stag male, solo kids) are enforced here, on the
/// original selection, before any expansion happens.
pub fn expand(selection: &PassSelection) -> Result<Expansion, ValidationError> {
    validate_selection(selection)?;

    let direct_male = selection.quantity(FareCategory::Male);
    let direct_female = selection.quantity(FareCategory::Female);
    let direct_kids = selection.quantity(FareCategory::Kids);
    let couples = selection.quantity(FareCategory::Couple);
    let families = selection.quantity(FareCategory::Family);

    let total = direct_male + direct_female + direct_kids + couples * 2 + families * 4;
    let mut units = Vec::with_capacity(total as usize);

    let push = |units: &mut Vec<ExpandedUnit>, category, source, count: u32| {
        for _ in 0..count {
            units.push(ExpandedUnit::new(category, source));
        }
    };

    // Male block
    push(&mut units, FareCategory::Male, UnitSource::Direct, direct_male);
    push(&mut units, FareCategory::Male, UnitSource::Couple, couples);
    push(&mut units, FareCategory::Male, UnitSource::Family, families * 2);

    // Female block
    push(&mut units, FareCategory::Female, UnitSource::Direct, direct_female);
    push(&mut units, FareCategory::Female, UnitSource::Couple, couples);
    push(&mut units, FareCategory::Female, UnitSource::Family, families * 2);

    // Kids block
    push(&mut units, FareCategory::Kids, UnitSource::Direct, direct_kids);

    Ok(Expansion {
        units,
        bulk_eligible: direct_male + direct_female,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_couple_expansion() {
        let selection = PassSelection::new().with(FareCategory::Couple, 2);
        let expansion = expand(&selection).unwrap();

        assert_eq!(expansion.unit_count(), 4);
        assert_eq!(
            expansion.units,
            vec![
                ExpandedUnit::new(FareCategory::Male, UnitSource::Couple),
                ExpandedUnit::new(FareCategory::Male, UnitSource::Couple),
                ExpandedUnit::new(FareCategory::Female, UnitSource::Couple),
                ExpandedUnit::new(FareCategory::Female, UnitSource::Couple),
            ]
        );
        assert_eq!(expansion.bulk_eligible, 0);
    }

    #[test]
    fn test_family_expansion() {
        let selection = PassSelection::new().with(FareCategory::Family, 1);
        let expansion = expand(&selection).unwrap();

        assert_eq!(expansion.unit_count(), 4);
        let males = expansion
            .units
            .iter()
            .filter(|u| u.category == FareCategory::Male)
            .count();
        let females = expansion
            .units
            .iter()
            .filter(|u| u.category == FareCategory::Female)
            .count();
        assert_eq!(males, 2);
        assert_eq!(females, 2);
        assert!(expansion.units.iter().all(|u| u.source == UnitSource::Family));
    }

    #[test]
    fn test_couple_plus_kids_order() {
        let selection = PassSelection::new()
            .with(FareCategory::Kids, 1)
            .with(FareCategory::Couple, 1);
        let expansion = expand(&selection).unwrap();

        let cats: Vec<_> = expansion.units.iter().map(|u| u.category).collect();
        assert_eq!(
            cats,
            vec![FareCategory::Male, FareCategory::Female, FareCategory::Kids]
        );
    }

    #[test]
    fn test_grouped_order_with_mixed_sources() {
        let selection = PassSelection::new()
            .with(FareCategory::Male, 1)
            .with(FareCategory::Couple, 1)
            .with(FareCategory::Family, 1);
        let expansion = expand(&selection).unwrap();

        // Male block first (direct, couple, family×2), then female block
        let expected = vec![
            ExpandedUnit::new(FareCategory::Male, UnitSource::Direct),
            ExpandedUnit::new(FareCategory::Male, UnitSource::Couple),
            ExpandedUnit::new(FareCategory::Male, UnitSource::Family),
            ExpandedUnit::new(FareCategory::Male, UnitSource::Family),
            ExpandedUnit::new(FareCategory::Female, UnitSource::Couple),
            ExpandedUnit::new(FareCategory::Female, UnitSource::Family),
            ExpandedUnit::new(FareCategory::Female, UnitSource::Family),
        ];
        assert_eq!(expansion.units, expected);
    }

    #[test]
    fn test_determinism_across_invocations() {
        let selection = PassSelection::new()
            .with(FareCategory::Female, 3)
            .with(FareCategory::Couple, 2)
            .with(FareCategory::Kids, 1)
            .with(FareCategory::Family, 1);

        let first = expand(&selection).unwrap();
        let second = expand(&selection).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bulk_eligible_counts_direct_only() {
        // 6 expanded adults, but none bought directly as male/female
        let selection = PassSelection::new().with(FareCategory::Couple, 3);
        let expansion = expand(&selection).unwrap();
        assert_eq!(expansion.unit_count(), 6);
        assert_eq!(expansion.bulk_eligible, 0);

        let selection = PassSelection::new()
            .with(FareCategory::Female, 4)
            .with(FareCategory::Male, 2);
        let expansion = expand(&selection).unwrap();
        assert_eq!(expansion.bulk_eligible, 6);
    }

    #[test]
    fn test_validation_runs_before_expansion() {
        let only_male = PassSelection::new().with(FareCategory::Male, 2);
        assert!(expand(&only_male).is_err());

        assert!(expand(&PassSelection::new()).is_err());
    }

    #[test]
    fn test_expanded_counts_for_audit() {
        let selection = PassSelection::new()
            .with(FareCategory::Couple, 1)
            .with(FareCategory::Kids, 2);
        let expansion = expand(&selection).unwrap();

        assert_eq!(
            expansion.counts(),
            vec![
                (FareCategory::Male, 1),
                (FareCategory::Female, 1),
                (FareCategory::Kids, 2),
            ]
        );
    }
}
