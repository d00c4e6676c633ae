//! Inventory ledger service
//!
//! One entry per (supplier, product) pair, created lazily on first stock
//! addition or explicit set. Every mutation is a self-contained unit: there
//! is no batch API, and callers that need atomicity across several debits
//! (order shipment) compensate on partial failure. Debits are issued as
//! conditional updates so a concurrent debit can never drive the quantity
//! negative even though the availability check runs first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{checked_remove, checked_set, ensure_positive, InventoryEntry, Product};

/// Inventory service for managing per-supplier stock levels
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Row for inventory entry queries
#[derive(Debug, Clone, FromRow)]
struct EntryRow {
    id: Uuid,
    supplier_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EntryRow> for InventoryEntry {
    fn from(row: EntryRow) -> Self {
        InventoryEntry {
            id: row.id,
            supplier_id: row.supplier_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row for listing entries joined with their product
#[derive(Debug, FromRow)]
struct EntryWithProductRow {
    id: Uuid,
    supplier_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_name: String,
    product_description: Option<String>,
    product_manufacturer: Option<String>,
    product_part_number: String,
    product_category: Option<String>,
    product_image: Option<String>,
    product_created_at: DateTime<Utc>,
    product_updated_at: DateTime<Utc>,
}

/// An inventory entry with its product embedded, as listed to clients
#[derive(Debug, Clone, Serialize)]
pub struct EntryWithProduct {
    #[serde(flatten)]
    pub entry: InventoryEntry,
    pub product: Product,
}

impl From<EntryWithProductRow> for EntryWithProduct {
    fn from(row: EntryWithProductRow) -> Self {
        EntryWithProduct {
            entry: InventoryEntry {
                id: row.id,
                supplier_id: row.supplier_id,
                product_id: row.product_id,
                quantity: row.quantity,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            product: Product {
                id: row.product_id,
                name: row.product_name,
                description: row.product_description,
                manufacturer: row.product_manufacturer,
                part_number: row.product_part_number,
                category: row.product_category,
                image: row.product_image,
                created_at: row.product_created_at,
                updated_at: row.product_updated_at,
            },
        }
    }
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Add stock for a product, creating the entry on first addition.
    pub async fn add_stock(
        &self,
        supplier_id: Uuid,
        product_id: Uuid,
        qty: i64,
    ) -> AppResult<InventoryEntry> {
        ensure_positive(qty)?;
        self.ensure_product_exists(product_id).await?;

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO inventory_entries (supplier_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (supplier_id, product_id)
            DO UPDATE SET quantity = inventory_entries.quantity + EXCLUDED.quantity,
                          updated_at = now()
            RETURNING id, supplier_id, product_id, quantity, created_at, updated_at
            "#,
        )
        .bind(supplier_id)
        .bind(product_id)
        .bind(qty)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(%supplier_id, %product_id, qty, new_quantity = row.quantity, "stock added");
        Ok(row.into())
    }

    /// Remove stock for a product. Refuses partial debits: the entry must
    /// exist and hold at least `qty`, otherwise nothing changes.
    pub async fn remove_stock(
        &self,
        supplier_id: Uuid,
        product_id: Uuid,
        qty: i64,
    ) -> AppResult<InventoryEntry> {
        ensure_positive(qty)?;

        // Conditional debit: the WHERE clause keeps the quantity non-negative
        // even when another debit lands between our read and write.
        let updated = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE inventory_entries
            SET quantity = quantity - $3, updated_at = now()
            WHERE supplier_id = $1 AND product_id = $2 AND quantity >= $3
            RETURNING id, supplier_id, product_id, quantity, created_at, updated_at
            "#,
        )
        .bind(supplier_id)
        .bind(product_id)
        .bind(qty)
        .fetch_optional(&self.db)
        .await?;

        if let Some(row) = updated {
            tracing::info!(%supplier_id, %product_id, qty, new_quantity = row.quantity, "stock removed");
            return Ok(row.into());
        }

        // The debit did not apply: classify the failure.
        let existing = self.find_entry(supplier_id, product_id).await?;
        match existing {
            None => Err(AppError::NotFound(format!(
                "Inventory entry for product {}",
                product_id
            ))),
            Some(entry) => match checked_remove(entry.quantity, qty) {
                Err(err) => Err(err.into()),
                // Stock was refilled between our attempt and the re-read.
                Ok(_) => Err(AppError::Conflict(
                    "Concurrent inventory update, please retry".to_string(),
                )),
            },
        }
    }

    /// Set the absolute stock level, creating the entry if absent.
    pub async fn set_stock(
        &self,
        supplier_id: Uuid,
        product_id: Uuid,
        qty: i64,
    ) -> AppResult<InventoryEntry> {
        checked_set(qty)?;
        self.ensure_product_exists(product_id).await?;

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO inventory_entries (supplier_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (supplier_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = now()
            RETURNING id, supplier_id, product_id, quantity, created_at, updated_at
            "#,
        )
        .bind(supplier_id)
        .bind(product_id)
        .bind(qty)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(%supplier_id, %product_id, quantity = qty, "stock set");
        Ok(row.into())
    }

    /// All inventory entries for a supplier, with product details embedded.
    pub async fn get_entries(&self, supplier_id: Uuid) -> AppResult<Vec<EntryWithProduct>> {
        let rows = sqlx::query_as::<_, EntryWithProductRow>(
            r#"
            SELECT e.id, e.supplier_id, e.product_id, e.quantity, e.created_at, e.updated_at,
                   p.name AS product_name,
                   p.description AS product_description,
                   p.manufacturer AS product_manufacturer,
                   p.part_number AS product_part_number,
                   p.category AS product_category,
                   p.image AS product_image,
                   p.created_at AS product_created_at,
                   p.updated_at AS product_updated_at
            FROM inventory_entries e
            JOIN products p ON p.id = e.product_id
            WHERE e.supplier_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(EntryWithProduct::from).collect())
    }

    /// Current quantity for a (supplier, product) pair, if an entry exists.
    pub async fn find_entry(
        &self,
        supplier_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<InventoryEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, supplier_id, product_id, quantity, created_at, updated_at
            FROM inventory_entries
            WHERE supplier_id = $1 AND product_id = $2
            "#,
        )
        .bind(supplier_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(InventoryEntry::from))
    }

    async fn ensure_product_exists(&self, product_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::NotFound(format!("Product {}", product_id)));
        }
        Ok(())
    }
}
