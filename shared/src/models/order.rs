//! Order models and the fulfillment state machine
//!
//! An order is materialized from an ACCEPTED quotation (at most one order per
//! quotation) and walks PENDING → CONFIRMED → SHIPPED → COMPLETED, or
//! PENDING → CANCELLED. Every legal edge is enumerated in one table keyed by
//! (current status, target status, actor role) so the whole lifecycle is
//! checkable without reading branch order in request handlers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::UserRole;

/// A fulfillment order derived from an accepted quotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on an order, copied by value from the quotation line at
/// materialization time. The price is locked in; it is never re-read from
/// the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub qty: i64,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.qty)
    }
}

/// Lifecycle state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "shipped" => Some(OrderStatus::Shipped),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Resolve a requested status change against the transition table.
    ///
    /// An edge absent from the table is an `UnknownEdge` regardless of who
    /// asks; an edge that exists but belongs to the other role is
    /// `NotPermitted`. Ownership (a supplier may only touch orders derived
    /// from their own quotations) is checked by the caller, which knows the
    /// order's supplier.
    pub fn transition(
        self,
        to: OrderStatus,
        role: UserRole,
    ) -> Result<OrderTransition, OrderTransitionError> {
        let permit = |allowed: UserRole, action: OrderTransition| {
            if role == allowed {
                Ok(action)
            } else {
                Err(OrderTransitionError::NotPermitted {
                    role,
                    from: self,
                    to,
                })
            }
        };

        match (self, to) {
            // Either role may cancel while the order is still pending.
            (OrderStatus::Pending, OrderStatus::Cancelled) => Ok(OrderTransition::Cancel),
            (OrderStatus::Pending, OrderStatus::Confirmed) => {
                permit(UserRole::Supplier, OrderTransition::Confirm)
            }
            (OrderStatus::Confirmed, OrderStatus::Shipped) => {
                permit(UserRole::Supplier, OrderTransition::Ship)
            }
            (OrderStatus::Shipped, OrderStatus::Completed) => {
                permit(UserRole::Admin, OrderTransition::Complete)
            }
            (from, to) => Err(OrderTransitionError::UnknownEdge { from, to }),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A legal state-machine action resolved from the transition table
///
/// `Ship` carries the side-effect obligation: the caller must debit the
/// supplier's ledger for every order line, atomically, before the status
/// may become SHIPPED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    Cancel,
    Confirm,
    Ship,
    Complete,
}

/// Rejected order status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderTransitionError {
    #[error("no transition from {from} to {to}")]
    UnknownEdge { from: OrderStatus, to: OrderStatus },
    #[error("{role} may not move an order from {from} to {to}")]
    NotPermitted {
        role: UserRole,
        from: OrderStatus,
        to: OrderStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed_edges() -> Vec<(OrderStatus, OrderStatus, UserRole, OrderTransition)> {
        use OrderStatus::*;
        use OrderTransition::*;
        vec![
            (Pending, Cancelled, UserRole::Admin, Cancel),
            (Pending, Cancelled, UserRole::Supplier, Cancel),
            (Pending, Confirmed, UserRole::Supplier, Confirm),
            (Confirmed, Shipped, UserRole::Supplier, Ship),
            (Shipped, Completed, UserRole::Admin, Complete),
        ]
    }

    #[test]
    fn table_admits_exactly_the_documented_edges() {
        let allowed = allowed_edges();
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                for role in [UserRole::Admin, UserRole::Supplier] {
                    let expected = allowed
                        .iter()
                        .find(|(f, t, r, _)| (*f, *t, *r) == (from, to, role))
                        .map(|(_, _, _, action)| *action);
                    assert_eq!(
                        from.transition(to, role).ok(),
                        expected,
                        "({from}, {to}, {role})"
                    );
                }
            }
        }
    }

    #[test]
    fn admin_cannot_confirm_or_ship() {
        assert_eq!(
            OrderStatus::Pending.transition(OrderStatus::Confirmed, UserRole::Admin),
            Err(OrderTransitionError::NotPermitted {
                role: UserRole::Admin,
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed,
            })
        );
        assert_eq!(
            OrderStatus::Confirmed.transition(OrderStatus::Shipped, UserRole::Admin),
            Err(OrderTransitionError::NotPermitted {
                role: UserRole::Admin,
                from: OrderStatus::Confirmed,
                to: OrderStatus::Shipped,
            })
        );
    }

    #[test]
    fn supplier_cannot_complete() {
        assert_eq!(
            OrderStatus::Shipped.transition(OrderStatus::Completed, UserRole::Supplier),
            Err(OrderTransitionError::NotPermitted {
                role: UserRole::Supplier,
                from: OrderStatus::Shipped,
                to: OrderStatus::Completed,
            })
        );
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in OrderStatus::ALL {
                for role in [UserRole::Admin, UserRole::Supplier] {
                    assert!(from.transition(to, role).is_err(), "({from}, {to}, {role})");
                }
            }
        }
    }

    #[test]
    fn cancelling_is_only_possible_while_pending() {
        for from in [OrderStatus::Confirmed, OrderStatus::Shipped, OrderStatus::Completed] {
            for role in [UserRole::Admin, UserRole::Supplier] {
                assert_eq!(
                    from.transition(OrderStatus::Cancelled, role),
                    Err(OrderTransitionError::UnknownEdge {
                        from,
                        to: OrderStatus::Cancelled,
                    })
                );
            }
        }
    }
}
