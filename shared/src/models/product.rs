//! Product catalog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product, referenced by identity from inventory entries and
/// quotation/order lines. Deletion is forbidden while any line references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    /// Unique manufacturer part number
    pub part_number: String,
    pub category: Option<String>,
    /// Path to the product image, relative to the upload root
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
