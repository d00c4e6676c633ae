//! HTTP handlers for the inventory ledger
//!
//! All endpoints operate on the calling user's own ledger; the supplier id
//! comes from the token, never from the payload.

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{EntryWithProduct, InventoryService};
use crate::AppState;
use shared::InventoryEntry;

/// Input for the stock adjustment endpoints
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Add stock for a product
pub async fn add_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<InventoryEntry>> {
    let service = InventoryService::new(state.db);
    let entry = service
        .add_stock(current_user.0.user_id, input.product_id, input.quantity)
        .await?;
    Ok(Json(entry))
}

/// Remove stock for a product
pub async fn remove_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<InventoryEntry>> {
    let service = InventoryService::new(state.db);
    let entry = service
        .remove_stock(current_user.0.user_id, input.product_id, input.quantity)
        .await?;
    Ok(Json(entry))
}

/// Set the absolute stock level for a product
pub async fn set_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<InventoryEntry>> {
    let service = InventoryService::new(state.db);
    let entry = service
        .set_stock(current_user.0.user_id, input.product_id, input.quantity)
        .await?;
    Ok(Json(entry))
}

/// List the caller's inventory entries with product details
pub async fn list_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<EntryWithProduct>>> {
    let service = InventoryService::new(state.db);
    let entries = service.get_entries(current_user.0.user_id).await?;
    Ok(Json(entries))
}
