//! Order workflow service
//!
//! Orders are materialized from accepted quotations (one per quotation) and
//! advance through the transition table in `shared::models::order`. The
//! CONFIRMED→SHIPPED edge is the only multi-entry ledger mutation in the
//! system: each line is debited with the single-entry ledger API, and on any
//! failure the debits already applied are compensated in reverse before the
//! error surfaces, leaving the order CONFIRMED and the ledger untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::inventory::InventoryService;
use shared::{
    Order, OrderLine, OrderStatus, OrderTransition, Product, Quotation, QuotationStatus, UserRole,
};

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Row for order queries
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: Uuid,
    quotation_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> AppResult<Order> {
        let status = parse_status(&self.status)?;
        Ok(Order {
            id: self.id,
            quotation_id: self.quotation_id,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row for the source quotation of an order
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
        let status = QuotationStatus::parse(&self.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown quotation status '{}' in database", self.status))
        })?;
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

/// Row for order lines without product details (ship debits)
#[derive(Debug, FromRow)]
struct OrderLineRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    qty: i64,
    unit_price: Decimal,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            qty: row.qty,
            unit_price: row.unit_price,
        }
    }
}

/// Row for order lines joined with the product
#[derive(Debug, FromRow)]
struct LineWithProductRow {
    id: Uuid,
    order_id: Uuid,
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

/// An order line as presented to clients, product embedded
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product: Product,
    pub qty: i64,
    pub unit_price: Decimal,
    pub total: Decimal,
}

impl From<LineWithProductRow> for OrderLineView {
    fn from(row: LineWithProductRow) -> Self {
        let line = OrderLine {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            qty: row.qty,
            unit_price: row.unit_price,
        };
        OrderLineView {
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

/// An order with its source quotation and lines, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub quotation: Quotation,
    pub lines: Vec<OrderLineView>,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Materialize an order from an accepted quotation. Admin only.
    pub async fn materialize(
        &self,
        actor_role: UserRole,
        quotation_id: Uuid,
    ) -> AppResult<OrderWithLines> {
        require_admin(actor_role)?;

        let mut tx = self.db.begin().await?;
        let order = create_from_quotation(&mut tx, quotation_id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, %quotation_id, "order materialized");
        self.fetch_with_lines(order.id).await
    }

    /// Apply a status transition requested by `actor`.
    ///
    /// The edge is resolved against the shared transition table; ownership
    /// is checked here because only the persistence layer knows which
    /// supplier the order belongs to.
    pub async fn transition(
        &self,
        actor_id: Uuid,
        actor_role: UserRole,
        order_id: Uuid,
        target: OrderStatus,
    ) -> AppResult<OrderWithLines> {
        let order = self.fetch(order_id).await?;
        let quotation = self.fetch_quotation(order.quotation_id).await?;

        if actor_role == UserRole::Supplier && quotation.supplier_id != actor_id {
            return Err(AppError::Forbidden(
                "Suppliers may only manage their own orders".to_string(),
            ));
        }

        let action = order.status.transition(target, actor_role)?;

        match action {
            OrderTransition::Ship => {
                self.ship(&order, quotation.supplier_id).await?;
            }
            OrderTransition::Cancel | OrderTransition::Confirm | OrderTransition::Complete => {
                self.apply_status(order.id, order.status, target).await?;
            }
        }

        tracing::info!(%order_id, from = %order.status, to = %target, actor = %actor_role, "order transitioned");
        self.fetch_with_lines(order_id).await
    }

    /// Delete an order. Admin only, and only while it is still pending.
    pub async fn remove(&self, actor_role: UserRole, order_id: Uuid) -> AppResult<()> {
        require_admin(actor_role)?;

        let order = self.fetch(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(AppError::Conflict(
                "Can only delete pending orders".to_string(),
            ));
        }

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.db)
            .await?;

        tracing::info!(%order_id, "order deleted");
        Ok(())
    }

    /// List orders: admins see all, suppliers see their own.
    pub async fn list(
        &self,
        actor_id: Uuid,
        actor_role: UserRole,
    ) -> AppResult<Vec<OrderWithLines>> {
        let rows = match actor_role {
            UserRole::Admin => {
                sqlx::query_as::<_, OrderRow>(
                    "SELECT id, quotation_id, status, created_at, updated_at \
                     FROM orders ORDER BY created_at DESC",
                )
                .fetch_all(&self.db)
                .await?
            }
            UserRole::Supplier => {
                sqlx::query_as::<_, OrderRow>(
                    r#"
                    SELECT o.id, o.quotation_id, o.status, o.created_at, o.updated_at
                    FROM orders o
                    JOIN quotations q ON q.id = o.quotation_id
                    WHERE q.supplier_id = $1
                    ORDER BY o.created_at DESC
                    "#,
                )
                .bind(actor_id)
                .fetch_all(&self.db)
                .await?
            }
        };

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let order = row.into_order()?;
            result.push(self.assemble(order).await?);
        }
        Ok(result)
    }

    /// Get one order; suppliers may only see their own.
    pub async fn get(
        &self,
        actor_id: Uuid,
        actor_role: UserRole,
        order_id: Uuid,
    ) -> AppResult<OrderWithLines> {
        let order = self.fetch(order_id).await?;
        let quotation = self.fetch_quotation(order.quotation_id).await?;

        if actor_role == UserRole::Supplier && quotation.supplier_id != actor_id {
            return Err(AppError::Forbidden(
                "Suppliers may only view their own orders".to_string(),
            ));
        }

        let lines = self.fetch_line_views(order.id).await?;
        Ok(OrderWithLines {
            order,
            quotation,
            lines,
        })
    }

    pub(crate) async fn fetch_with_lines(&self, order_id: Uuid) -> AppResult<OrderWithLines> {
        let order = self.fetch(order_id).await?;
        self.assemble(order).await
    }

    /// Debit every order line from the supplier's ledger, then flip the
    /// status to SHIPPED. The ledger API is single-entry, so atomicity
    /// across lines is achieved by compensation: any failure re-credits the
    /// debits already applied, in reverse order, and the order stays
    /// CONFIRMED.
    async fn ship(&self, order: &Order, supplier_id: Uuid) -> AppResult<()> {
        let lines = self.fetch_lines(order.id).await?;
        let inventory = InventoryService::new(self.db.clone());

        let mut debited: Vec<&OrderLine> = Vec::new();
        for line in &lines {
            match inventory
                .remove_stock(supplier_id, line.product_id, line.qty)
                .await
            {
                Ok(_) => debited.push(line),
                Err(err) => {
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %line.product_id,
                        qty = line.qty,
                        error = %err,
                        "ship debit failed, compensating applied debits"
                    );
                    compensate_debits(&inventory, supplier_id, &debited).await;
                    return Err(err);
                }
            }
        }

        // All debits applied; the guarded update keeps a concurrent
        // transition from producing a shipped order with double debits.
        match self
            .apply_status(order.id, OrderStatus::Confirmed, OrderStatus::Shipped)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => {
                compensate_debits(&inventory, supplier_id, &debited).await;
                Err(err)
            }
        }
    }

    /// Guarded status write: only applies if the order is still in
    /// `expected`, so racing transitions collapse to one winner.
    async fn apply_status(
        &self,
        order_id: Uuid,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> AppResult<()> {
        let updated = sqlx::query(
            "UPDATE orders SET status = $3, updated_at = now() WHERE id = $1 AND status = $2",
        )
        .bind(order_id)
        .bind(expected.as_str())
        .bind(target.as_str())
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Order status changed concurrently".to_string(),
            ));
        }
        Ok(())
    }

    async fn assemble(&self, order: Order) -> AppResult<OrderWithLines> {
        let quotation = self.fetch_quotation(order.quotation_id).await?;
        let lines = self.fetch_line_views(order.id).await?;
        Ok(OrderWithLines {
            order,
            quotation,
            lines,
        })
    }

    async fn fetch(&self, order_id: Uuid) -> AppResult<Order> {
        sqlx::query_as::<_, OrderRow>(
            "SELECT id, quotation_id, status, created_at, updated_at FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?
        .into_order()
    }

    async fn fetch_quotation(&self, quotation_id: Uuid) -> AppResult<Quotation> {
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

    async fn fetch_lines(&self, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            "SELECT id, order_id, product_id, qty, unit_price \
             FROM order_lines WHERE order_id = $1 ORDER BY line_no",
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    async fn fetch_line_views(&self, order_id: Uuid) -> AppResult<Vec<OrderLineView>> {
        let rows = sqlx::query_as::<_, LineWithProductRow>(
            r#"
            SELECT l.id, l.order_id, l.product_id, l.qty, l.unit_price,
                   p.name AS product_name,
                   p.description AS product_description,
                   p.manufacturer AS product_manufacturer,
                   p.part_number AS product_part_number,
                   p.category AS product_category,
                   p.image AS product_image,
                   p.created_at AS product_created_at,
                   p.updated_at AS product_updated_at
            FROM order_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.order_id = $1
            ORDER BY l.line_no
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(OrderLineView::from).collect())
    }
}

/// Re-credit already-applied debits in reverse order. Compensation failures
/// are logged and skipped so the remaining entries are still restored.
async fn compensate_debits(
    inventory: &InventoryService,
    supplier_id: Uuid,
    debited: &[&OrderLine],
) {
    for line in debited.iter().rev() {
        if let Err(err) = inventory
            .add_stock(supplier_id, line.product_id, line.qty)
            .await
        {
            tracing::error!(
                %supplier_id,
                product_id = %line.product_id,
                qty = line.qty,
                error = %err,
                "failed to compensate ledger debit"
            );
        }
    }
}

/// Insert the order and copy the quotation's lines, inside the caller's
/// transaction. The quotation must be ACCEPTED and must not already have an
/// order; both checks run here so quotation approval and direct
/// materialization share one enforcement point.
pub(crate) async fn create_from_quotation(
    tx: &mut Transaction<'_, Postgres>,
    quotation_id: Uuid,
) -> AppResult<Order> {
    let status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM quotations WHERE id = $1 FOR UPDATE",
    )
    .bind(quotation_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Quotation".to_string()))?;

    if QuotationStatus::parse(&status) != Some(QuotationStatus::Accepted) {
        return Err(AppError::Conflict(
            "Can only create order for accepted quotations".to_string(),
        ));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM orders WHERE quotation_id = $1)",
    )
    .bind(quotation_id)
    .fetch_one(&mut **tx)
    .await?;

    if exists {
        return Err(AppError::Conflict(
            "Order already exists for this quotation".to_string(),
        ));
    }

    let row = sqlx::query_as::<_, OrderRow>(
        "INSERT INTO orders (quotation_id) VALUES ($1) \
         RETURNING id, quotation_id, status, created_at, updated_at",
    )
    .bind(quotation_id)
    .fetch_one(&mut **tx)
    .await?;

    // Copy lines by value: the prices on the order are locked to the
    // quotation snapshot from here on.
    sqlx::query(
        "INSERT INTO order_lines (order_id, product_id, line_no, qty, unit_price) \
         SELECT $1, product_id, line_no, qty, unit_price \
         FROM quotation_lines WHERE quotation_id = $2",
    )
    .bind(row.id)
    .bind(quotation_id)
    .execute(&mut **tx)
    .await?;

    row.into_order()
}

fn parse_status(s: &str) -> AppResult<OrderStatus> {
    OrderStatus::parse(s)
        .ok_or_else(|| AppError::Internal(format!("Unknown order status '{}' in database", s)))
}

fn require_admin(role: UserRole) -> AppResult<()> {
    if role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only admins may perform this action".to_string(),
        ));
    }
    Ok(())
}
