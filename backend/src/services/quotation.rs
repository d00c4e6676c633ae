//! Quotation workflow service
//!
//! Proposals are validated against the target supplier's ledger before
//! anything persists: every line must name an existing product with enough
//! stock on hand. The check is point-in-time only — stock is not reserved,
//! so two proposals can both pass and later race on the debit at shipment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::order::{create_from_quotation, OrderService, OrderWithLines};
use shared::{
    validate_line_qty, validate_unit_price, Product, Quotation, QuotationDecision, QuotationLine,
    QuotationStatus, UserRole,
};

/// Quotation service
#[derive(Clone)]
pub struct QuotationService {
    db: PgPool,
    /// Admin credited with supplier self-quotations, injected from config.
    system_admin_id: Uuid,
}

/// Row for quotation queries
#[derive(Debug, Clone, FromRow)]
struct QuotationRow {
    id: Uuid,
    admin_id: Uuid,
    supplier_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QuotationRow {
    fn into_quotation(self) -> AppResult<Quotation> {
        let status = parse_status(&self.status)?;
        Ok(Quotation {
            id: self.id,
            admin_id: self.admin_id,
            supplier_id: self.supplier_id,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row for line queries joined with the product
#[derive(Debug, FromRow)]
struct LineWithProductRow {
    id: Uuid,
    quotation_id: Uuid,
    product_id: Uuid,
    qty: i64,
    unit_price: Decimal,
    product_name: String,
    product_description: Option<String>,
    product_manufacturer: Option<String>,
    product_part_number: String,
    product_category: Option<String>,
    product_image: Option<String>,
    product_created_at: DateTime<Utc>,
    product_updated_at: DateTime<Utc>,
}

/// A quotation line as presented to clients, product embedded
#[derive(Debug, Clone, Serialize)]
pub struct QuotationLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product: Product,
    pub qty: i64,
    pub unit_price: Decimal,
    pub total: Decimal,
}

impl From<LineWithProductRow> for QuotationLineView {
    fn from(row: LineWithProductRow) -> Self {
        let line = QuotationLine {
            id: row.id,
            quotation_id: row.quotation_id,
            product_id: row.product_id,
            qty: row.qty,
            unit_price: row.unit_price,
        };
        QuotationLineView {
            id: line.id,
            product_id: line.product_id,
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
            qty: line.qty,
            unit_price: line.unit_price,
            total: line.total(),
        }
    }
}

/// A quotation with its lines, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct QuotationWithLines {
    #[serde(flatten)]
    pub quotation: Quotation,
    pub lines: Vec<QuotationLineView>,
}

/// Input line for propose/revise
#[derive(Debug, Clone, Deserialize)]
pub struct QuotationLineInput {
    pub product_id: Uuid,
    pub qty: i64,
    pub price: Decimal,
}

/// Input for proposing a quotation
#[derive(Debug, Deserialize)]
pub struct ProposeQuotationInput {
    /// Required for admin proposals; ignored for supplier self-quotations.
    pub supplier_id: Option<Uuid>,
    pub lines: Vec<QuotationLineInput>,
}

/// Input for replacing a quotation's lines
#[derive(Debug, Deserialize)]
pub struct ReviseLinesInput {
    pub lines: Vec<QuotationLineInput>,
}

/// Input for the supplier's accept/decline decision
#[derive(Debug, Deserialize)]
pub struct DecideInput {
    pub decision: QuotationDecision,
}

impl QuotationService {
    /// Create a new QuotationService instance
    pub fn new(db: PgPool, system_admin_id: Uuid) -> Self {
        Self {
            db,
            system_admin_id,
        }
    }

    /// Propose a new quotation. Suppliers self-target and authorship falls
    /// to the configured system admin; admins must name the supplier.
    pub async fn propose(
        &self,
        actor_id: Uuid,
        actor_role: UserRole,
        input: ProposeQuotationInput,
    ) -> AppResult<QuotationWithLines> {
        if input.lines.is_empty() {
            return Err(AppError::validation_field(
                "lines",
                "Quotation lines are required",
            ));
        }

        let (admin_id, supplier_id) = match actor_role {
            UserRole::Supplier => (self.system_admin_id, actor_id),
            UserRole::Admin => {
                let supplier_id = input.supplier_id.ok_or_else(|| {
                    AppError::validation_field("supplier_id", "supplier_id is required")
                })?;
                self.ensure_supplier(supplier_id).await?;
                (actor_id, supplier_id)
            }
        };

        // Validate every line before anything persists: all-or-nothing.
        self.validate_lines(supplier_id, &input.lines).await?;

        let mut tx = self.db.begin().await?;

        let quotation_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO quotations (admin_id, supplier_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(admin_id)
        .bind(supplier_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_lines(&mut tx, quotation_id, &input.lines).await?;

        tx.commit().await?;

        tracing::info!(%quotation_id, %admin_id, %supplier_id, lines = input.lines.len(), "quotation proposed");
        self.fetch_with_lines(quotation_id).await
    }

    /// Replace the entire line collection of a pending quotation. Only the
    /// issuing admin may do this.
    pub async fn revise_lines(
        &self,
        actor_id: Uuid,
        actor_role: UserRole,
        quotation_id: Uuid,
        input: ReviseLinesInput,
    ) -> AppResult<QuotationWithLines> {
        let quotation = self.fetch(quotation_id).await?;

        if actor_role != UserRole::Admin || actor_id != quotation.admin_id {
            return Err(AppError::Forbidden(
                "Only the issuing admin may revise quotation lines".to_string(),
            ));
        }
        if quotation.status != QuotationStatus::Pending {
            return Err(AppError::Conflict(
                "Can only revise pending quotations".to_string(),
            ));
        }
        if input.lines.is_empty() {
            return Err(AppError::validation_field(
                "lines",
                "Quotation lines are required",
            ));
        }

        self.validate_lines(quotation.supplier_id, &input.lines)
            .await?;

        let mut tx = self.db.begin().await?;

        // Status re-checked inside the transaction: a concurrent decision
        // must not be overwritten.
        let still_pending = sqlx::query(
            "UPDATE quotations SET updated_at = now() WHERE id = $1 AND status = 'pending'",
        )
        .bind(quotation_id)
        .execute(&mut *tx)
        .await?;

        if still_pending.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Can only revise pending quotations".to_string(),
            ));
        }

        sqlx::query("DELETE FROM quotation_lines WHERE quotation_id = $1")
            .bind(quotation_id)
            .execute(&mut *tx)
            .await?;

        insert_lines(&mut tx, quotation_id, &input.lines).await?;

        tx.commit().await?;

        tracing::info!(%quotation_id, lines = input.lines.len(), "quotation lines revised");
        self.fetch_with_lines(quotation_id).await
    }

    /// Supplier decision on a pending quotation: accept or decline. Either
    /// way the quotation becomes terminal.
    pub async fn decide(
        &self,
        actor_id: Uuid,
        actor_role: UserRole,
        quotation_id: Uuid,
        decision: QuotationDecision,
    ) -> AppResult<QuotationWithLines> {
        let quotation = self.fetch(quotation_id).await?;

        if actor_role != UserRole::Supplier || actor_id != quotation.supplier_id {
            return Err(AppError::Forbidden(
                "Only the target supplier may decide this quotation".to_string(),
            ));
        }

        let next = quotation.status.decide(decision)?;
        self.apply_decision(quotation_id, next).await?;

        tracing::info!(%quotation_id, status = %next, "quotation decided by supplier");
        self.fetch_with_lines(quotation_id).await
    }

    /// Admin acceptance that also materializes the order, atomically with
    /// the status change.
    pub async fn approve(
        &self,
        actor_role: UserRole,
        quotation_id: Uuid,
    ) -> AppResult<OrderWithLines> {
        require_admin(actor_role)?;
        let quotation = self.fetch(quotation_id).await?;

        if quotation.status != QuotationStatus::Pending {
            return Err(AppError::Conflict(
                "Can only approve pending quotations".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            "UPDATE quotations SET status = 'accepted', updated_at = now() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(quotation_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Can only approve pending quotations".to_string(),
            ));
        }

        let order = create_from_quotation(&mut tx, quotation_id).await?;

        tx.commit().await?;

        tracing::info!(%quotation_id, order_id = %order.id, "quotation approved, order materialized");
        OrderService::new(self.db.clone())
            .fetch_with_lines(order.id)
            .await
    }

    /// Admin rejection of a pending quotation.
    pub async fn reject(
        &self,
        actor_role: UserRole,
        quotation_id: Uuid,
    ) -> AppResult<QuotationWithLines> {
        require_admin(actor_role)?;
        let quotation = self.fetch(quotation_id).await?;

        if quotation.status != QuotationStatus::Pending {
            return Err(AppError::Conflict(
                "Can only reject pending quotations".to_string(),
            ));
        }

        self.apply_decision(quotation_id, QuotationStatus::Declined)
            .await?;

        tracing::info!(%quotation_id, "quotation rejected by admin");
        self.fetch_with_lines(quotation_id).await
    }

    /// Delete a quotation. Refused once an order references it; the lines
    /// go with it (cascade).
    pub async fn remove(&self, actor_role: UserRole, quotation_id: Uuid) -> AppResult<()> {
        require_admin(actor_role)?;

        let has_order = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE quotation_id = $1)",
        )
        .bind(quotation_id)
        .fetch_one(&self.db)
        .await?;

        if has_order {
            return Err(AppError::Conflict(
                "Cannot delete quotation with associated orders".to_string(),
            ));
        }

        let deleted = sqlx::query("DELETE FROM quotations WHERE id = $1")
            .bind(quotation_id)
            .execute(&self.db)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Quotation".to_string()));
        }

        tracing::info!(%quotation_id, "quotation deleted");
        Ok(())
    }

    /// List quotations: admins see all, suppliers see their own.
    pub async fn list(
        &self,
        actor_id: Uuid,
        actor_role: UserRole,
    ) -> AppResult<Vec<QuotationWithLines>> {
        let rows = match actor_role {
            UserRole::Admin => {
                sqlx::query_as::<_, QuotationRow>(
                    "SELECT id, admin_id, supplier_id, status, created_at, updated_at \
                     FROM quotations ORDER BY created_at DESC",
                )
                .fetch_all(&self.db)
                .await?
            }
            UserRole::Supplier => {
                sqlx::query_as::<_, QuotationRow>(
                    "SELECT id, admin_id, supplier_id, status, created_at, updated_at \
                     FROM quotations WHERE supplier_id = $1 ORDER BY created_at DESC",
                )
                .bind(actor_id)
                .fetch_all(&self.db)
                .await?
            }
        };

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let quotation = row.into_quotation()?;
            let lines = self.fetch_lines(quotation.id).await?;
            result.push(QuotationWithLines { quotation, lines });
        }
        Ok(result)
    }

    /// Get one quotation; suppliers may only see their own.
    pub async fn get(
        &self,
        actor_id: Uuid,
        actor_role: UserRole,
        quotation_id: Uuid,
    ) -> AppResult<QuotationWithLines> {
        let quotation = self.fetch(quotation_id).await?;

        if actor_role == UserRole::Supplier && quotation.supplier_id != actor_id {
            return Err(AppError::Forbidden(
                "Suppliers may only view their own quotations".to_string(),
            ));
        }

        let lines = self.fetch_lines(quotation.id).await?;
        Ok(QuotationWithLines { quotation, lines })
    }

    async fn fetch(&self, quotation_id: Uuid) -> AppResult<Quotation> {
        sqlx::query_as::<_, QuotationRow>(
            "SELECT id, admin_id, supplier_id, status, created_at, updated_at \
             FROM quotations WHERE id = $1",
        )
        .bind(quotation_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Quotation".to_string()))?
        .into_quotation()
    }

    async fn fetch_with_lines(&self, quotation_id: Uuid) -> AppResult<QuotationWithLines> {
        let quotation = self.fetch(quotation_id).await?;
        let lines = self.fetch_lines(quotation_id).await?;
        Ok(QuotationWithLines { quotation, lines })
    }

    async fn fetch_lines(&self, quotation_id: Uuid) -> AppResult<Vec<QuotationLineView>> {
        let rows = sqlx::query_as::<_, LineWithProductRow>(
            r#"
            SELECT l.id, l.quotation_id, l.product_id, l.qty, l.unit_price,
                   p.name AS product_name,
                   p.description AS product_description,
                   p.manufacturer AS product_manufacturer,
                   p.part_number AS product_part_number,
                   p.category AS product_category,
                   p.image AS product_image,
                   p.created_at AS product_created_at,
                   p.updated_at AS product_updated_at
            FROM quotation_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.quotation_id = $1
            ORDER BY l.line_no
            "#,
        )
        .bind(quotation_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(QuotationLineView::from).collect())
    }

    /// Terminal status write, guarded so only a pending quotation changes.
    async fn apply_decision(&self, quotation_id: Uuid, next: QuotationStatus) -> AppResult<()> {
        let updated = sqlx::query(
            "UPDATE quotations SET status = $2, updated_at = now() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(quotation_id)
        .bind(next.as_str())
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Quotation has already been decided".to_string(),
            ));
        }
        Ok(())
    }

    /// Check each proposed line against the catalog and the supplier's
    /// ledger. Point-in-time availability check only; nothing is reserved.
    async fn validate_lines(
        &self,
        supplier_id: Uuid,
        lines: &[QuotationLineInput],
    ) -> AppResult<()> {
        for line in lines {
            validate_line_qty(line.qty).map_err(|e| AppError::validation_field("qty", e))?;
            validate_unit_price(line.price).map_err(|e| AppError::validation_field("price", e))?;

            let product_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
            )
            .bind(line.product_id)
            .fetch_one(&self.db)
            .await?;

            if !product_exists {
                return Err(AppError::NotFound(format!("Product {}", line.product_id)));
            }

            let available = sqlx::query_scalar::<_, i64>(
                "SELECT quantity FROM inventory_entries WHERE supplier_id = $1 AND product_id = $2",
            )
            .bind(supplier_id)
            .bind(line.product_id)
            .fetch_optional(&self.db)
            .await?;

            match available {
                None => {
                    return Err(AppError::validation(format!(
                        "Product {} not found in supplier inventory",
                        line.product_id
                    )))
                }
                Some(quantity) if quantity < line.qty => {
                    return Err(AppError::validation(format!(
                        "Insufficient quantity for product {} in inventory",
                        line.product_id
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    async fn ensure_supplier(&self, supplier_id: Uuid) -> AppResult<()> {
        let is_supplier = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND role = 'supplier')",
        )
        .bind(supplier_id)
        .fetch_one(&self.db)
        .await?;

        if !is_supplier {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        Ok(())
    }
}

async fn insert_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    quotation_id: Uuid,
    lines: &[QuotationLineInput],
) -> AppResult<()> {
    for (line_no, line) in lines.iter().enumerate() {
        sqlx::query(
            "INSERT INTO quotation_lines (quotation_id, product_id, line_no, qty, unit_price) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(quotation_id)
        .bind(line.product_id)
        .bind(line_no as i32)
        .bind(line.qty)
        .bind(line.price)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn parse_status(s: &str) -> AppResult<QuotationStatus> {
    QuotationStatus::parse(s)
        .ok_or_else(|| AppError::Internal(format!("Unknown quotation status '{}' in database", s)))
}

fn require_admin(role: UserRole) -> AppResult<()> {
    if role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only admins may perform this action".to_string(),
        ));
    }
    Ok(())
}
