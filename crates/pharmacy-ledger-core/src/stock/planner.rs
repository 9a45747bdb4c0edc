//! Reservation, restoration and reconciliation rules.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::LineItem;

use super::{StockError, StockLevels, StockPlan, StockResult};

/// Sum quantities per medicine ID. Duplicate lines for one medicine collapse.
pub fn aggregate(items: &[LineItem]) -> BTreeMap<&str, u64> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for item in items {
        *totals.entry(item.medicine_id.as_str()).or_default() += u64::from(item.quantity);
    }
    totals
}

/// Plan the deduction for a new record.
///
/// Fails on the first medicine (by ID) that is missing or short; nothing is
/// planned in that case.
pub fn plan_reservation<L: StockLevels + ?Sized>(
    items: &[LineItem],
    levels: &L,
) -> StockResult<StockPlan> {
    let mut plan = StockPlan::default();
    for (medicine_id, requested) in aggregate(items) {
        let available = available(levels, medicine_id)?;
        ensure_available(medicine_id, requested, available)?;
        plan.push(medicine_id, -to_delta(requested));
    }
    Ok(plan)
}

/// Plan the restoration for a deleted record.
///
/// Restoration cannot fail on quantity; medicines that no longer exist are
/// listed in [`StockPlan::skipped`].
pub fn plan_restoration<L: StockLevels + ?Sized>(items: &[LineItem], levels: &L) -> StockPlan {
    let mut plan = StockPlan::default();
    for (medicine_id, quantity) in aggregate(items) {
        if levels.units(medicine_id).is_some() {
            plan.push(medicine_id, to_delta(quantity));
        } else {
            plan.skipped.push(medicine_id.to_string());
        }
    }
    plan
}

/// Plan the net stock change for an edited record.
///
/// Only medicines whose aggregate quantity changed are adjusted. A changed
/// quantity is checked against stock after the old quantity is given back,
/// so lowering a quantity always succeeds.
pub fn plan_reconciliation<L: StockLevels + ?Sized>(
    old_items: &[LineItem],
    new_items: &[LineItem],
    levels: &L,
) -> StockResult<StockPlan> {
    let old = aggregate(old_items);
    let new = aggregate(new_items);
    let ids: BTreeSet<&str> = old.keys().chain(new.keys()).copied().collect();

    let mut plan = StockPlan::default();
    for medicine_id in ids {
        let old_qty = old.get(medicine_id).copied().unwrap_or(0);
        let new_qty = new.get(medicine_id).copied().unwrap_or(0);
        if old_qty == new_qty {
            continue;
        }

        if new_qty == 0 {
            // Removed from the record
            if levels.units(medicine_id).is_some() {
                plan.push(medicine_id, to_delta(old_qty));
            } else {
                plan.skipped.push(medicine_id.to_string());
            }
            continue;
        }

        // Added or changed: the new quantity must fit in current + old
        let available = available(levels, medicine_id)? + old_qty;
        ensure_available(medicine_id, new_qty, available)?;
        plan.push(medicine_id, to_delta(old_qty) - to_delta(new_qty));
    }
    Ok(plan)
}

fn available<L: StockLevels + ?Sized>(levels: &L, medicine_id: &str) -> StockResult<u64> {
    levels
        .units(medicine_id)
        .map(u64::from)
        .ok_or_else(|| StockError::MedicineNotFound(medicine_id.to_string()))
}

fn ensure_available(medicine_id: &str, requested: u64, available: u64) -> StockResult<()> {
    if requested > available {
        return Err(StockError::InsufficientStock {
            medicine_id: medicine_id.to_string(),
            requested,
            available,
        });
    }
    Ok(())
}

fn to_delta(quantity: u64) -> i64 {
    // Quantities are sums of u32 line quantities and never approach i64::MAX
    i64::try_from(quantity).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::fixtures::{line, medicine};
    use crate::models::Medicine;

    fn levels(meds: &[&Medicine]) -> HashMap<String, u32> {
        meds.iter().map(|m| (m.id.clone(), m.total_units)).collect()
    }

    #[test]
    fn test_aggregate_sums_duplicates() {
        let a = medicine("A", 10, 30);
        let b = medicine("B", 10, 30);
        let items = vec![line(&a, 5), line(&b, 1), line(&a, 20)];
        let totals = aggregate(&items);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[a.id.as_str()], 25);
        assert_eq!(totals[b.id.as_str()], 1);
    }

    #[test]
    fn test_reservation_aggregates_before_checking() {
        let a = medicine("A", 10, 30);
        let plan = plan_reservation(&[line(&a, 5), line(&a, 20)], &levels(&[&a])).unwrap();
        assert_eq!(plan.adjustments.len(), 1);
        assert_eq!(plan.delta_for(&a.id), -25);
    }

    #[test]
    fn test_reservation_rejects_aggregate_oversell() {
        let a = medicine("A", 10, 30);
        // Each line fits alone, the sum does not
        let err = plan_reservation(&[line(&a, 20), line(&a, 20)], &levels(&[&a])).unwrap_err();
        assert_eq!(
            err,
            StockError::InsufficientStock {
                medicine_id: a.id.clone(),
                requested: 40,
                available: 30,
            }
        );
    }

    #[test]
    fn test_reservation_exact_stock_allowed() {
        let a = medicine("A", 10, 30);
        let plan = plan_reservation(&[line(&a, 30)], &levels(&[&a])).unwrap();
        assert_eq!(plan.delta_for(&a.id), -30);
    }

    #[test]
    fn test_reservation_missing_medicine() {
        let a = medicine("A", 10, 30);
        let err = plan_reservation(&[line(&a, 1)], &HashMap::<String, u32>::new()).unwrap_err();
        assert_eq!(err, StockError::MedicineNotFound(a.id.clone()));
    }

    #[test]
    fn test_reservation_empty_record() {
        let plan = plan_reservation(&[], &HashMap::<String, u32>::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_restoration_skips_missing() {
        let a = medicine("A", 10, 5);
        let gone = medicine("Gone", 10, 0);
        let plan = plan_restoration(&[line(&a, 5), line(&gone, 3), line(&a, 20)], &levels(&[&a]));
        assert_eq!(plan.delta_for(&a.id), 25);
        assert_eq!(plan.skipped, vec![gone.id.clone()]);
    }

    #[test]
    fn test_reconciliation_diff() {
        // old [{A,5}] -> new [{A,8},{B,2}]
        let a = medicine("A", 10, 10);
        let b = medicine("B", 10, 4);
        let plan = plan_reconciliation(
            &[line(&a, 5)],
            &[line(&a, 8), line(&b, 2)],
            &levels(&[&a, &b]),
        )
        .unwrap();
        assert_eq!(plan.delta_for(&a.id), -3);
        assert_eq!(plan.delta_for(&b.id), -2);
    }

    #[test]
    fn test_reconciliation_fails_whole_edit() {
        let a = medicine("A", 10, 10);
        let b = medicine("B", 10, 1);
        let err = plan_reconciliation(
            &[line(&a, 5)],
            &[line(&a, 8), line(&b, 2)],
            &levels(&[&a, &b]),
        )
        .unwrap_err();
        assert!(matches!(err, StockError::InsufficientStock { ref medicine_id, requested: 2, available: 1 } if *medicine_id == b.id));
    }

    #[test]
    fn test_reconciliation_checks_against_restored_stock() {
        // 5 already reserved, 2 left on the shelf: raising to 7 is fine, 8 is not
        let a = medicine("A", 10, 2);
        let plan = plan_reconciliation(&[line(&a, 5)], &[line(&a, 7)], &levels(&[&a])).unwrap();
        assert_eq!(plan.delta_for(&a.id), -2);

        let err = plan_reconciliation(&[line(&a, 5)], &[line(&a, 8)], &levels(&[&a])).unwrap_err();
        assert!(matches!(err, StockError::InsufficientStock { requested: 8, available: 7, .. }));
    }

    #[test]
    fn test_reconciliation_decrease_and_removal() {
        let a = medicine("A", 10, 0);
        let b = medicine("B", 10, 0);
        let plan = plan_reconciliation(
            &[line(&a, 5), line(&b, 3)],
            &[line(&a, 1)],
            &levels(&[&a, &b]),
        )
        .unwrap();
        assert_eq!(plan.delta_for(&a.id), 4);
        assert_eq!(plan.delta_for(&b.id), 3);
    }

    #[test]
    fn test_reconciliation_unchanged_is_untouched() {
        let a = medicine("A", 10, 0);
        // Same aggregate quantity, split differently across lines
        let plan = plan_reconciliation(
            &[line(&a, 5)],
            &[line(&a, 2), line(&a, 3)],
            &levels(&[&a]),
        )
        .unwrap();
        assert!(plan.is_empty());
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_reconciliation_unchanged_missing_medicine_is_ignored() {
        let gone = medicine("Gone", 10, 0);
        let plan = plan_reconciliation(&[line(&gone, 2)], &[line(&gone, 2)], &HashMap::<String, u32>::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_reconciliation_removed_missing_medicine_is_skipped() {
        let gone = medicine("Gone", 10, 0);
        let plan = plan_reconciliation(&[line(&gone, 2)], &[], &HashMap::<String, u32>::new()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.skipped, vec![gone.id.clone()]);
    }

    #[test]
    fn test_reconciliation_changed_missing_medicine_fails() {
        let gone = medicine("Gone", 10, 0);
        let err = plan_reconciliation(&[line(&gone, 2)], &[line(&gone, 1)], &HashMap::<String, u32>::new()).unwrap_err();
        assert_eq!(err, StockError::MedicineNotFound(gone.id.clone()));
    }
}
