//! Inventory ledger models and stock arithmetic
//!
//! The ledger holds one entry per (supplier, product) pair with a quantity
//! that must never go negative. The arithmetic lives here as pure functions
//! so every mutation path (and the ship-time debit loop) shares one set of
//! guards; the persistence layer repeats the non-negativity check in SQL to
//! stay safe under concurrent debits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A ledger entry: stock of one product held by one supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Violations of the ledger's stock rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("quantity must be positive")]
    NonPositiveQuantity,
    #[error("quantity cannot be negative")]
    NegativeQuantity,
    #[error("insufficient stock: {available} available, {requested} requested")]
    Insufficient { available: i64, requested: i64 },
}

/// Validate a delta quantity for add/remove operations.
pub fn ensure_positive(qty: i64) -> Result<i64, StockError> {
    if qty <= 0 {
        return Err(StockError::NonPositiveQuantity);
    }
    Ok(qty)
}

/// New quantity after adding `qty` to `current`. `qty` must be positive.
pub fn checked_add(current: i64, qty: i64) -> Result<i64, StockError> {
    ensure_positive(qty)?;
    Ok(current.saturating_add(qty))
}

/// New quantity after removing `qty` from `current`. Refuses partial debits:
/// either the full quantity is available or nothing is taken.
pub fn checked_remove(current: i64, qty: i64) -> Result<i64, StockError> {
    ensure_positive(qty)?;
    if current < qty {
        return Err(StockError::Insufficient {
            available: current,
            requested: qty,
        });
    }
    Ok(current - qty)
}

/// Validate an absolute quantity for a set-stock operation.
pub fn checked_set(qty: i64) -> Result<i64, StockError> {
    if qty < 0 {
        return Err(StockError::NegativeQuantity);
    }
    Ok(qty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_non_positive() {
        assert_eq!(checked_add(5, 0), Err(StockError::NonPositiveQuantity));
        assert_eq!(checked_add(5, -3), Err(StockError::NonPositiveQuantity));
        assert_eq!(checked_add(5, 3), Ok(8));
    }

    #[test]
    fn remove_refuses_partial_debit() {
        assert_eq!(
            checked_remove(2, 5),
            Err(StockError::Insufficient {
                available: 2,
                requested: 5
            })
        );
        assert_eq!(checked_remove(5, 5), Ok(0));
        assert_eq!(checked_remove(5, 2), Ok(3));
    }

    #[test]
    fn set_rejects_negative() {
        assert_eq!(checked_set(-1), Err(StockError::NegativeQuantity));
        assert_eq!(checked_set(0), Ok(0));
        assert_eq!(checked_set(42), Ok(42));
    }
}
