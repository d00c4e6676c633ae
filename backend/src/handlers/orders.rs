//! HTTP handlers for the order workflow

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::{OrderService, OrderWithLines};
use crate::AppState;
use shared::{ApiMessage, OrderStatus};

/// Input for materializing an order directly
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub quotation_id: Uuid,
}

/// Input for a status transition
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusInput {
    pub status: OrderStatus,
}

/// Materialize an order from an accepted quotation (admin)
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<OrderWithLines>)> {
    let service = OrderService::new(state.db);
    let order = service
        .materialize(current_user.0.role, input.quotation_id)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Request a status transition
pub async fn update_order_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderStatusInput>,
) -> AppResult<Json<OrderWithLines>> {
    let service = OrderService::new(state.db);
    let order = service
        .transition(
            current_user.0.user_id,
            current_user.0.role,
            order_id,
            input.status,
        )
        .await?;
    Ok(Json(order))
}

/// Delete a pending order (admin)
pub async fn delete_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiMessage>> {
    let service = OrderService::new(state.db);
    service.remove(current_user.0.role, order_id).await?;
    Ok(Json(ApiMessage::new("Order deleted")))
}

/// List orders visible to the caller
pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<OrderWithLines>>> {
    let service = OrderService::new(state.db);
    let orders = service
        .list(current_user.0.user_id, current_user.0.role)
        .await?;
    Ok(Json(orders))
}

/// Get one order
pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithLines>> {
    let service = OrderService::new(state.db);
    let order = service
        .get(current_user.0.user_id, current_user.0.role, order_id)
        .await?;
    Ok(Json(order))
}
