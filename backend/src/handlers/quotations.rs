//! HTTP handlers for the quotation workflow

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::OrderWithLines;
use crate::services::quotation::{
    DecideInput, ProposeQuotationInput, QuotationService, QuotationWithLines, ReviseLinesInput,
};
use crate::AppState;
use shared::ApiMessage;

/// Propose a quotation
pub async fn propose_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ProposeQuotationInput>,
) -> AppResult<(StatusCode, Json<QuotationWithLines>)> {
    let service = QuotationService::new(state.db, state.config.workflow.system_admin_id);
    let quotation = service
        .propose(current_user.0.user_id, current_user.0.role, input)
        .await?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

/// Replace the lines of a pending quotation (issuing admin)
pub async fn revise_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
    Json(input): Json<ReviseLinesInput>,
) -> AppResult<Json<QuotationWithLines>> {
    let service = QuotationService::new(state.db, state.config.workflow.system_admin_id);
    let quotation = service
        .revise_lines(current_user.0.user_id, current_user.0.role, quotation_id, input)
        .await?;
    Ok(Json(quotation))
}

/// Supplier accept/decline decision
pub async fn decide_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
    Json(input): Json<DecideInput>,
) -> AppResult<Json<QuotationWithLines>> {
    let service = QuotationService::new(state.db, state.config.workflow.system_admin_id);
    let quotation = service
        .decide(
            current_user.0.user_id,
            current_user.0.role,
            quotation_id,
            input.decision,
        )
        .await?;
    Ok(Json(quotation))
}

/// Admin approval; materializes the order
pub async fn approve_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<OrderWithLines>)> {
    let service = QuotationService::new(state.db, state.config.workflow.system_admin_id);
    let order = service.approve(current_user.0.role, quotation_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Admin rejection
pub async fn reject_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
) -> AppResult<Json<QuotationWithLines>> {
    let service = QuotationService::new(state.db, state.config.workflow.system_admin_id);
    let quotation = service.reject(current_user.0.role, quotation_id).await?;
    Ok(Json(quotation))
}

/// Delete a quotation (admin; refused once an order exists)
pub async fn delete_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
) -> AppResult<Json<ApiMessage>> {
    let service = QuotationService::new(state.db, state.config.workflow.system_admin_id);
    service.remove(current_user.0.role, quotation_id).await?;
    Ok(Json(ApiMessage::new("Quotation deleted")))
}

/// List quotations visible to the caller
pub async fn list_quotations(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<QuotationWithLines>>> {
    let service = QuotationService::new(state.db, state.config.workflow.system_admin_id);
    let quotations = service
        .list(current_user.0.user_id, current_user.0.role)
        .await?;
    Ok(Json(quotations))
}

/// Get one quotation
pub async fn get_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
) -> AppResult<Json<QuotationWithLines>> {
    let service = QuotationService::new(state.db, state.config.workflow.system_admin_id);
    let quotation = service
        .get(current_user.0.user_id, current_user.0.role, quotation_id)
        .await?;
    Ok(Json(quotation))
}
