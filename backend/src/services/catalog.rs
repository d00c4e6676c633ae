//! Product catalog service
//!
//! Products are referenced by identity from ledger entries and from
//! quotation/order lines. A referenced product cannot be deleted; that is
//! how line-item snapshots stay resolvable for the life of the workflow.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    validate_name, validate_part_number, PaginatedResponse, Pagination, PaginationMeta, Product,
    UserRole,
};

/// Catalog service for managing product records
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Row for product queries
#[derive(Debug, Clone, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    manufacturer: Option<String>,
    part_number: String,
    category: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            manufacturer: row.manufacturer,
            part_number: row.part_number,
            category: row.category,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub part_number: String,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub part_number: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product. Admin only; part numbers are unique.
    pub async fn create_product(
        &self,
        actor_role: UserRole,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        require_admin(actor_role)?;
        validate_name(&input.name).map_err(|e| AppError::validation_field("name", e))?;
        validate_part_number(&input.part_number)
            .map_err(|e| AppError::validation_field("part_number", e))?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE part_number = $1)",
        )
        .bind(&input.part_number)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::Conflict("Part number already exists".to_string()));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, description, manufacturer, part_number, category, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, manufacturer, part_number, category, image,
                      created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.manufacturer)
        .bind(&input.part_number)
        .bind(&input.category)
        .bind(&input.image)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(product_id = %row.id, part_number = %row.part_number, "product created");
        Ok(row.into())
    }

    /// Update a product's display attributes. Admin only.
    pub async fn update_product(
        &self,
        actor_role: UserRole,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        require_admin(actor_role)?;

        if let Some(name) = &input.name {
            validate_name(name).map_err(|e| AppError::validation_field("name", e))?;
        }

        // Only check part_number uniqueness if it is being changed.
        if let Some(part_number) = &input.part_number {
            validate_part_number(part_number)
                .map_err(|e| AppError::validation_field("part_number", e))?;

            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE part_number = $1 AND id <> $2)",
            )
            .bind(part_number)
            .bind(product_id)
            .fetch_one(&self.db)
            .await?;

            if taken {
                return Err(AppError::Conflict("Part number already exists".to_string()));
            }
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                manufacturer = COALESCE($4, manufacturer),
                part_number = COALESCE($5, part_number),
                category = COALESCE($6, category),
                image = COALESCE($7, image),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, manufacturer, part_number, category, image,
                      created_at, updated_at
            "#,
        )
        .bind(product_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.manufacturer)
        .bind(&input.part_number)
        .bind(&input.category)
        .bind(&input.image)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// List products, paginated.
    pub async fn list_products(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Product>> {
        let total_items =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
                .fetch_one(&self.db)
                .await?;

        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, description, manufacturer, part_number, category, image,
                   created_at, updated_at
            FROM products
            ORDER BY name
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(pagination.per_page))
        .bind(i64::from(pagination.offset()))
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Product::from).collect(),
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Get a single product.
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, description, manufacturer, part_number, category, image,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Delete a product. Admin only; refused while any quotation or order
    /// line still references it. Orphan inventory entries go with it.
    pub async fn delete_product(&self, actor_role: UserRole, product_id: Uuid) -> AppResult<()> {
        require_admin(actor_role)?;

        let referenced = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT (SELECT COUNT(*) FROM quotation_lines WHERE product_id = $1)
                 + (SELECT COUNT(*) FROM order_lines WHERE product_id = $1)
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if referenced > 0 {
            return Err(AppError::Conflict(
                "Cannot delete product referenced by quotations or orders".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM inventory_entries WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        tx.commit().await?;

        tracing::info!(%product_id, "product deleted");
        Ok(())
    }
}

fn require_admin(role: UserRole) -> AppResult<()> {
    if role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only admins may manage the product catalog".to_string(),
        ));
    }
    Ok(())
}
