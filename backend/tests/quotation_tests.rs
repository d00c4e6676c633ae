//! Quotation workflow tests
//!
//! Tests for the quotation lifecycle and line validation:
//! - terminality: a decided quotation never changes again
//! - line totals are price snapshots times quantity
//! - proposal input validation rules

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{
    validate_line_qty, validate_unit_price, QuotationDecision, QuotationLine, QuotationStateError,
    QuotationStatus,
};

/// Model of proposal-time line validation: every line must be well formed
/// and covered by the supplier's current stock, and the first offending line
/// sinks the whole proposal.
fn validate_proposal(
    stock: &std::collections::HashMap<u8, i64>,
    lines: &[(u8, i64, Decimal)],
) -> Result<(), String> {
    if lines.is_empty() {
        return Err("lines required".to_string());
    }
    for (product, qty, price) in lines {
        validate_line_qty(*qty).map_err(str::to_string)?;
        validate_unit_price(*price).map_err(str::to_string)?;
        match stock.get(product) {
            None => return Err(format!("product {} not in inventory", product)),
            Some(available) if available < qty => {
                return Err(format!("insufficient quantity for product {}", product))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_pending_accepts_and_declines() {
        assert_eq!(
            QuotationStatus::Pending.decide(QuotationDecision::Accept),
            Ok(QuotationStatus::Accepted)
        );
        assert_eq!(
            QuotationStatus::Pending.decide(QuotationDecision::Decline),
            Ok(QuotationStatus::Declined)
        );
    }

    #[test]
    fn test_decided_quotation_is_immutable() {
        for terminal in [QuotationStatus::Accepted, QuotationStatus::Declined] {
            assert!(terminal.is_terminal());
            for decision in [QuotationDecision::Accept, QuotationDecision::Decline] {
                assert_eq!(
                    terminal.decide(decision),
                    Err(QuotationStateError::AlreadyDecided(terminal))
                );
            }
        }
    }

    #[test]
    fn test_statuses_round_trip_as_lowercase_strings() {
        for status in [
            QuotationStatus::Pending,
            QuotationStatus::Accepted,
            QuotationStatus::Declined,
        ] {
            assert_eq!(QuotationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QuotationStatus::parse("ACCEPTED"), None);
        assert_eq!(QuotationStatus::parse("unknown"), None);
    }

    #[test]
    fn test_line_validation_rules() {
        assert!(validate_line_qty(1).is_ok());
        assert!(validate_line_qty(0).is_err());
        assert!(validate_line_qty(-4).is_err());

        assert!(validate_unit_price(Decimal::ZERO).is_ok());
        assert!(validate_unit_price(Decimal::new(999, 2)).is_ok());
        assert!(validate_unit_price(Decimal::new(-1, 2)).is_err());
    }

    /// Asking for more than the supplier holds rejects the whole proposal;
    /// nothing would be persisted.
    #[test]
    fn test_over_ask_proposal_rejected() {
        let stock = HashMap::from([(1, 5)]);
        let price = Decimal::new(1000, 2);

        assert!(validate_proposal(&stock, &[(1, 3, price)]).is_ok());
        assert!(validate_proposal(&stock, &[(1, 10, price)]).is_err());
        // One bad line sinks a proposal with otherwise valid lines.
        assert!(validate_proposal(&stock, &[(1, 2, price), (2, 1, price)]).is_err());
        assert!(validate_proposal(&stock, &[]).is_err());
    }

    #[test]
    fn test_line_total_is_snapshot_price_times_qty() {
        let line = QuotationLine {
            id: Uuid::nil(),
            quotation_id: Uuid::nil(),
            product_id: Uuid::nil(),
            qty: 12,
            unit_price: Decimal::new(250, 2), // 2.50
        };
        assert_eq!(line.total(), Decimal::new(3000, 2)); // 30.00
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn decision_strategy() -> impl Strategy<Value = QuotationDecision> {
        prop_oneof![
            Just(QuotationDecision::Accept),
            Just(QuotationDecision::Decline),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Exactly the first decision in any sequence lands; the rest are
        /// rejected and the status never changes again.
        #[test]
        fn prop_first_decision_wins(
            decisions in prop::collection::vec(decision_strategy(), 1..10)
        ) {
            let mut status = QuotationStatus::Pending;
            let mut applied = 0;

            for decision in &decisions {
                match status.decide(*decision) {
                    Ok(next) => {
                        status = next;
                        applied += 1;
                    }
                    Err(QuotationStateError::AlreadyDecided(current)) => {
                        prop_assert_eq!(current, status);
                    }
                }
            }

            prop_assert_eq!(applied, 1);
            prop_assert_eq!(status, decisions[0].target_status());
            prop_assert!(status.is_terminal());
        }

        /// Line totals scale linearly with quantity.
        #[test]
        fn prop_line_total_scales_with_qty(qty in 1i64..10_000, cents in 0i64..100_000) {
            let unit_price = Decimal::new(cents, 2);
            let line = QuotationLine {
                id: Uuid::nil(),
                quotation_id: Uuid::nil(),
                product_id: Uuid::nil(),
                qty,
                unit_price,
            };
            prop_assert_eq!(line.total(), unit_price * Decimal::from(qty));
        }
    }
}
