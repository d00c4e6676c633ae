//! HTTP handlers for admin user management

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::UserService;
use crate::AppState;
use shared::User;

/// List supplier accounts (admin)
pub async fn list_suppliers(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    let service = UserService::new(state.db);
    let suppliers = service.list_suppliers(current_user.0.role).await?;
    Ok(Json(suppliers))
}

/// Block a supplier account (admin)
pub async fn block_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let service = UserService::new(state.db);
    let user = service
        .block_user(current_user.0.role, current_user.0.user_id, user_id)
        .await?;
    Ok(Json(user))
}

/// Lift a block (admin)
pub async fn unblock_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let service = UserService::new(state.db);
    let user = service.unblock_user(current_user.0.role, user_id).await?;
    Ok(Json(user))
}
