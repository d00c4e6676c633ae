//! Inventory ledger tests
//!
//! Tests for the stock arithmetic shared by every ledger mutation path:
//! - non-negativity under arbitrary add/remove/set sequences
//! - all-or-nothing debits (no partial removal)
//! - missing-entry debits classified as not-found, not insufficiency
//! - failed operations leaving the ledger untouched

use proptest::prelude::*;
use std::collections::HashMap;

use shared::{checked_add, checked_remove, checked_set, ensure_positive, StockError};

/// One requested ledger mutation, before validation
#[derive(Debug, Clone, Copy)]
enum StockOp {
    Add(i64),
    Remove(i64),
    Set(i64),
}

/// Failures of the model ledger. A debit against a missing entry is its own
/// failure class, matching the service's not-found classification rather
/// than an insufficiency at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedgerError {
    MissingEntry,
    Stock(StockError),
}

impl From<StockError> for LedgerError {
    fn from(err: StockError) -> Self {
        LedgerError::Stock(err)
    }
}

/// A model ledger keyed by product index, mirroring the per-entry SQL
/// semantics of the inventory service: invalid or insufficient requests are
/// rejected whole, valid ones apply exactly.
fn apply(ledger: &mut HashMap<u8, i64>, product: u8, op: StockOp) -> Result<i64, LedgerError> {
    let current = ledger.get(&product).copied();
    let next = match op {
        StockOp::Add(qty) => checked_add(current.unwrap_or(0), qty)?,
        StockOp::Remove(qty) => {
            ensure_positive(qty)?;
            match current {
                None => return Err(LedgerError::MissingEntry),
                Some(have) => checked_remove(have, qty)?,
            }
        }
        StockOp::Set(qty) => checked_set(qty)?,
    };
    ledger.insert(product, next);
    Ok(next)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_add_creates_entry_lazily() {
        let mut ledger = HashMap::new();
        assert_eq!(apply(&mut ledger, 1, StockOp::Add(5)), Ok(5));
        assert_eq!(apply(&mut ledger, 1, StockOp::Add(3)), Ok(8));
        assert_eq!(ledger[&1], 8);
    }

    #[test]
    fn test_remove_from_missing_entry_is_not_found() {
        let mut ledger = HashMap::new();
        assert_eq!(
            apply(&mut ledger, 1, StockOp::Remove(1)),
            Err(LedgerError::MissingEntry)
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_remove_refuses_partial_debit() {
        let mut ledger = HashMap::from([(1, 3)]);
        assert_eq!(
            apply(&mut ledger, 1, StockOp::Remove(5)),
            Err(LedgerError::Stock(StockError::Insufficient {
                available: 3,
                requested: 5
            }))
        );
        // Nothing was taken.
        assert_eq!(ledger[&1], 3);
    }

    #[test]
    fn test_remove_to_exactly_zero() {
        let mut ledger = HashMap::from([(1, 5)]);
        assert_eq!(apply(&mut ledger, 1, StockOp::Remove(5)), Ok(0));
        assert_eq!(ledger[&1], 0);
    }

    #[test]
    fn test_set_overwrites_absolutely() {
        let mut ledger = HashMap::from([(1, 100)]);
        assert_eq!(apply(&mut ledger, 1, StockOp::Set(7)), Ok(7));
        assert_eq!(apply(&mut ledger, 1, StockOp::Set(0)), Ok(0));
        assert_eq!(
            apply(&mut ledger, 1, StockOp::Set(-1)),
            Err(LedgerError::Stock(StockError::NegativeQuantity))
        );
        assert_eq!(ledger[&1], 0);
    }

    #[test]
    fn test_non_positive_deltas_rejected() {
        assert_eq!(ensure_positive(0), Err(StockError::NonPositiveQuantity));
        assert_eq!(ensure_positive(-7), Err(StockError::NonPositiveQuantity));
        assert_eq!(ensure_positive(1), Ok(1));

        let mut ledger = HashMap::from([(1, 5)]);
        assert_eq!(
            apply(&mut ledger, 1, StockOp::Add(0)),
            Err(LedgerError::Stock(StockError::NonPositiveQuantity))
        );
        assert_eq!(
            apply(&mut ledger, 1, StockOp::Remove(-2)),
            Err(LedgerError::Stock(StockError::NonPositiveQuantity))
        );
        assert_eq!(ledger[&1], 5);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn op_strategy() -> impl Strategy<Value = StockOp> {
        prop_oneof![
            (-5i64..50).prop_map(StockOp::Add),
            (-5i64..50).prop_map(StockOp::Remove),
            (-5i64..50).prop_map(StockOp::Set),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Quantities never go negative, no matter the operation sequence.
        #[test]
        fn prop_ledger_never_negative(
            ops in prop::collection::vec((0u8..4, op_strategy()), 1..40)
        ) {
            let mut ledger = HashMap::new();
            for (product, op) in ops {
                let _ = apply(&mut ledger, product, op);
                for (&product, &quantity) in &ledger {
                    prop_assert!(quantity >= 0, "product {} went negative", product);
                }
            }
        }

        /// A rejected operation leaves the ledger exactly as it was.
        #[test]
        fn prop_failed_ops_change_nothing(
            setup in prop::collection::vec((0u8..4, 1i64..50), 0..10),
            product in 0u8..4,
            op in op_strategy()
        ) {
            let mut ledger = HashMap::new();
            for (product, qty) in setup {
                let _ = apply(&mut ledger, product, StockOp::Add(qty));
            }

            let before = ledger.clone();
            if apply(&mut ledger, product, op).is_err() {
                prop_assert_eq!(ledger, before);
            }
        }

        /// A successful debit takes exactly the requested quantity.
        #[test]
        fn prop_remove_is_exact(initial in 0i64..100, qty in 1i64..100) {
            match checked_remove(initial, qty) {
                Ok(next) => {
                    prop_assert!(initial >= qty);
                    prop_assert_eq!(next, initial - qty);
                }
                Err(StockError::Insufficient { available, requested }) => {
                    prop_assert!(initial < qty);
                    prop_assert_eq!(available, initial);
                    prop_assert_eq!(requested, qty);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
