//! Order workflow tests
//!
//! Tests for the fulfillment state machine and the ship-time debit:
//! - transition closure: every observed status path is a prefix of
//!   pending→confirmed→shipped→completed or pending→cancelled
//! - ship atomicity: a mid-loop debit failure restores every touched
//!   ledger entry and the order stays confirmed
//! - one order per quotation: a second materialization is rejected and
//!   creates nothing
//! - scenario walks of the full workflow at the state-machine level

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use shared::{
    checked_add, checked_remove, OrderStatus, OrderTransitionError, QuotationStatus, StockError,
    UserRole,
};

/// The two legal status paths through the state machine.
const FULFILLMENT_PATH: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Shipped,
    OrderStatus::Completed,
];
const CANCEL_PATH: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Cancelled];

fn is_prefix(history: &[OrderStatus], path: &[OrderStatus]) -> bool {
    history.len() <= path.len() && history.iter().zip(path).all(|(a, b)| a == b)
}

/// Model of the ship-time debit loop: debit each line in order, and on any
/// failure re-credit the already-applied debits in reverse before returning
/// the error. Mirrors the compensation the order service performs against
/// the inventory service.
fn ship_debits(
    ledger: &mut HashMap<u8, i64>,
    lines: &[(u8, i64)],
) -> Result<(), StockError> {
    let mut debited: Vec<(u8, i64)> = Vec::new();
    for &(product, qty) in lines {
        let current = ledger.get(&product).copied().unwrap_or(0);
        match checked_remove(current, qty) {
            Ok(next) => {
                ledger.insert(product, next);
                debited.push((product, qty));
            }
            Err(err) => {
                for &(product, qty) in debited.iter().rev() {
                    let current = ledger.get(&product).copied().unwrap_or(0);
                    if let Ok(restored) = checked_add(current, qty) {
                        ledger.insert(product, restored);
                    }
                }
                return Err(err);
            }
        }
    }
    Ok(())
}

/// Model of order materialization: the quotation must be ACCEPTED and must
/// not already have an order. Mirrors the order service's in-transaction
/// checks backed by the unique quotation_id column.
fn materialize_order(
    orders: &mut HashSet<u8>,
    quotation_id: u8,
    quotation_status: QuotationStatus,
) -> Result<(), &'static str> {
    if quotation_status != QuotationStatus::Accepted {
        return Err("can only create order for accepted quotations");
    }
    if orders.contains(&quotation_id) {
        return Err("order already exists for this quotation");
    }
    orders.insert(quotation_id);
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Happy path: supplier confirms and ships, admin completes; the ship
    /// step debits every line.
    #[test]
    fn test_happy_path_walk() {
        let mut ledger = HashMap::from([(1, 10), (2, 6)]);
        let lines = [(1u8, 4i64), (2, 6)];
        let mut status = OrderStatus::Pending;

        status
            .transition(OrderStatus::Confirmed, UserRole::Supplier)
            .unwrap();
        status = OrderStatus::Confirmed;

        status
            .transition(OrderStatus::Shipped, UserRole::Supplier)
            .unwrap();
        ship_debits(&mut ledger, &lines).unwrap();
        status = OrderStatus::Shipped;

        status
            .transition(OrderStatus::Completed, UserRole::Admin)
            .unwrap();
        status = OrderStatus::Completed;

        assert!(status.is_terminal());
        assert_eq!(ledger[&1], 6);
        assert_eq!(ledger[&2], 0);
    }

    /// A failed second-line debit restores the first line's stock.
    #[test]
    fn test_ship_failure_compensates_in_reverse() {
        let mut ledger = HashMap::from([(1, 10), (2, 3)]);
        let lines = [(1u8, 4i64), (2, 5)];

        let result = ship_debits(&mut ledger, &lines);
        assert_eq!(
            result,
            Err(StockError::Insufficient {
                available: 3,
                requested: 5
            })
        );
        // Both entries are back at their pre-attempt quantities.
        assert_eq!(ledger[&1], 10);
        assert_eq!(ledger[&2], 3);
    }

    /// A failed ship leaves the order CONFIRMED: the status write only
    /// happens after every debit lands.
    #[test]
    fn test_failed_ship_leaves_order_confirmed() {
        let mut ledger = HashMap::from([(1, 2)]);
        let status = OrderStatus::Confirmed;

        // The edge itself is legal for the supplier...
        assert!(status
            .transition(OrderStatus::Shipped, UserRole::Supplier)
            .is_ok());
        // ...but the debit fails, so the caller must not persist the flip.
        assert!(ship_debits(&mut ledger, &[(1, 5)]).is_err());
        assert_eq!(status, OrderStatus::Confirmed);
        assert_eq!(ledger[&1], 2);
    }

    /// A second materialization against the same quotation is rejected and
    /// the order set is unchanged.
    #[test]
    fn test_second_materialization_rejected() {
        let mut orders = HashSet::new();

        assert!(materialize_order(&mut orders, 1, QuotationStatus::Accepted).is_ok());
        assert_eq!(
            materialize_order(&mut orders, 1, QuotationStatus::Accepted),
            Err("order already exists for this quotation")
        );
        assert_eq!(orders.len(), 1);
    }

    /// Only an accepted quotation can back an order.
    #[test]
    fn test_materialization_requires_accepted_quotation() {
        let mut orders = HashSet::new();

        for status in [QuotationStatus::Pending, QuotationStatus::Declined] {
            assert_eq!(
                materialize_order(&mut orders, 1, status),
                Err("can only create order for accepted quotations")
            );
        }
        assert!(orders.is_empty());
    }

    #[test]
    fn test_unknown_edges_rejected_for_everyone() {
        for role in [UserRole::Admin, UserRole::Supplier] {
            assert_eq!(
                OrderStatus::Pending.transition(OrderStatus::Shipped, role),
                Err(OrderTransitionError::UnknownEdge {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Shipped,
                })
            );
            assert_eq!(
                OrderStatus::Confirmed.transition(OrderStatus::Cancelled, role),
                Err(OrderTransitionError::UnknownEdge {
                    from: OrderStatus::Confirmed,
                    to: OrderStatus::Cancelled,
                })
            );
        }
    }

    #[test]
    fn test_role_mismatch_on_known_edge_is_not_permitted() {
        assert!(matches!(
            OrderStatus::Shipped.transition(OrderStatus::Completed, UserRole::Supplier),
            Err(OrderTransitionError::NotPermitted { .. })
        ));
        assert!(matches!(
            OrderStatus::Pending.transition(OrderStatus::Confirmed, UserRole::Admin),
            Err(OrderTransitionError::NotPermitted { .. })
        ));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    fn role_strategy() -> impl Strategy<Value = UserRole> {
        prop_oneof![Just(UserRole::Admin), Just(UserRole::Supplier)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        /// Whatever transitions are requested, the observed status history
        /// is a prefix of one of the two legal paths.
        #[test]
        fn prop_transition_closure(
            requests in prop::collection::vec((status_strategy(), role_strategy()), 0..20)
        ) {
            let mut status = OrderStatus::Pending;
            let mut history = vec![status];

            for (target, role) in requests {
                if status.transition(target, role).is_ok() {
                    status = target;
                    history.push(status);
                }
            }

            prop_assert!(
                is_prefix(&history, &FULFILLMENT_PATH) || is_prefix(&history, &CANCEL_PATH),
                "illegal history {:?}",
                history
            );
        }

        /// Terminal statuses admit no further transition.
        #[test]
        fn prop_terminal_statuses_absorb(
            target in status_strategy(),
            role in role_strategy()
        ) {
            for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
                prop_assert!(terminal.transition(target, role).is_err());
            }
        }

        /// However many materialization attempts arrive, each quotation
        /// backs at most one order, and only accepted quotations back any.
        #[test]
        fn prop_at_most_one_order_per_quotation(
            attempts in prop::collection::vec(
                (0u8..6, prop::sample::select(vec![
                    QuotationStatus::Pending,
                    QuotationStatus::Accepted,
                    QuotationStatus::Declined,
                ])),
                1..30
            )
        ) {
            let mut orders = HashSet::new();
            let mut successes: HashMap<u8, u32> = HashMap::new();

            for (quotation_id, status) in attempts {
                if materialize_order(&mut orders, quotation_id, status).is_ok() {
                    *successes.entry(quotation_id).or_insert(0) += 1;
                }
            }

            prop_assert_eq!(orders.len(), successes.len());
            for (quotation_id, count) in successes {
                prop_assert_eq!(count, 1, "quotation {} backed {} orders", quotation_id, count);
            }
        }

        /// Ship debits either apply in full or leave the ledger untouched.
        #[test]
        fn prop_ship_debit_all_or_nothing(
            stock in prop::collection::vec((0u8..4, 0i64..30), 1..6),
            lines in prop::collection::vec((0u8..4, 1i64..30), 1..6)
        ) {
            let mut ledger: HashMap<u8, i64> = HashMap::new();
            for (product, qty) in stock {
                *ledger.entry(product).or_insert(0) += qty;
            }
            let before = ledger.clone();

            match ship_debits(&mut ledger, &lines) {
                Ok(()) => {
                    // Every line was debited exactly once.
                    let mut expected = before.clone();
                    for (product, qty) in &lines {
                        *expected.entry(*product).or_insert(0) -= qty;
                    }
                    prop_assert_eq!(&ledger, &expected);
                    prop_assert!(ledger.values().all(|&q| q >= 0));
                }
                Err(_) => prop_assert_eq!(&ledger, &before),
            }
        }
    }
}
