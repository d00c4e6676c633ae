//! Quotation models and lifecycle
//!
//! A quotation is a priced proposal of line items against one supplier's
//! inventory. It starts PENDING and moves exactly once to ACCEPTED or
//! DECLINED; both are terminal. Line prices are snapshots taken at proposal
//! time, never live catalog lookups.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A quotation issued by an admin against a supplier's inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotation {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub supplier_id: Uuid,
    pub status: QuotationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on a quotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationLine {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub product_id: Uuid,
    pub qty: i64,
    /// Unit price snapshot taken when the line was written
    pub unit_price: Decimal,
}

impl QuotationLine {
    /// Line total: quantity times the snapshotted unit price.
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.qty)
    }
}

/// Lifecycle state of a quotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Pending,
    Accepted,
    Declined,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Accepted => "accepted",
            QuotationStatus::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(QuotationStatus::Pending),
            "accepted" => Some(QuotationStatus::Accepted),
            "declined" => Some(QuotationStatus::Declined),
            _ => None,
        }
    }

    /// ACCEPTED and DECLINED admit no further status or line changes.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QuotationStatus::Pending)
    }

    /// Apply a supplier/admin decision. Only a PENDING quotation can be
    /// decided; deciding twice is rejected.
    pub fn decide(self, decision: QuotationDecision) -> Result<QuotationStatus, QuotationStateError> {
        match self {
            QuotationStatus::Pending => Ok(decision.target_status()),
            other => Err(QuotationStateError::AlreadyDecided(other)),
        }
    }
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision on a pending quotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationDecision {
    Accept,
    Decline,
}

impl QuotationDecision {
    pub fn target_status(self) -> QuotationStatus {
        match self {
            QuotationDecision::Accept => QuotationStatus::Accepted,
            QuotationDecision::Decline => QuotationStatus::Declined,
        }
    }
}

/// Rejected quotation state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuotationStateError {
    #[error("quotation is already {0}")]
    AlreadyDecided(QuotationStatus),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_decided_either_way() {
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
    fn decided_quotations_are_terminal() {
        for status in [QuotationStatus::Accepted, QuotationStatus::Declined] {
            assert!(status.is_terminal());
            for decision in [QuotationDecision::Accept, QuotationDecision::Decline] {
                assert_eq!(
                    status.decide(decision),
                    Err(QuotationStateError::AlreadyDecided(status))
                );
            }
        }
    }

    #[test]
    fn line_total_is_qty_times_price() {
        let line = QuotationLine {
            id: Uuid::nil(),
            quotation_id: Uuid::nil(),
            product_id: Uuid::nil(),
            qty: 3,
            unit_price: Decimal::new(1050, 2), // 10.50
        };
        assert_eq!(line.total(), Decimal::new(3150, 2));
    }
}
