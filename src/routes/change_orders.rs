//! Change order routes
//!
//! Status only moves through `/transition`, which enforces the approval
//! workflow. Decided change orders (approved, rejected, implemented) are frozen.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, MessageResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::cost;
use crate::db::{MAX_STORED_AMOUNT, MAX_STORED_QUANTITY};
use crate::domain::{
    ChangeOrderLineItem, ChangeOrderResponse, ChangeOrderStatus, CreateChangeOrderRequest,
    TransitionChangeOrderRequest, UpdateChangeOrderRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::services::records;

/// Query string for listing. `#[serde(flatten)]` cannot parse numbers out of
/// a query string, so the pagination fields are inline.
#[derive(Debug, Deserialize, Default)]
pub struct ChangeOrderQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<ChangeOrderStatus>,
}

impl ChangeOrderQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

fn validate_title(title: &str) -> ApiResult<()> {
    if title.trim().is_empty() {
        return Err(ApiError::bad_request("Change order title is required"));
    }
    Ok(())
}

fn validate_amount(original_contract_amount: f64) -> ApiResult<()> {
    if original_contract_amount < 0.0 {
        return Err(ApiError::bad_request(
            "Original contract amount cannot be negative",
        ));
    }
    if original_contract_amount > MAX_STORED_AMOUNT {
        return Err(ApiError::bad_request(format!(
            "Original contract amount cannot exceed {}",
            MAX_STORED_AMOUNT
        )));
    }
    Ok(())
}

fn validate_line_items(items: &[ChangeOrderLineItem]) -> ApiResult<()> {
    for (index, item) in items.iter().enumerate() {
        if item.quantity < 0.0 || item.unit_rate < 0.0 {
            return Err(ApiError::bad_request(format!(
                "Line item {} must have a non-negative quantity and unit rate",
                index + 1
            )));
        }
        if item.quantity > MAX_STORED_QUANTITY || item.unit_rate > MAX_STORED_QUANTITY {
            return Err(ApiError::bad_request(format!(
                "Line item {} quantity and unit rate cannot exceed {}",
                index + 1,
                MAX_STORED_QUANTITY
            )));
        }
        if item.total_cost() > MAX_STORED_AMOUNT {
            return Err(ApiError::bad_request(format!(
                "Line item {} total cannot exceed {}",
                index + 1,
                MAX_STORED_AMOUNT
            )));
        }
    }
    Ok(())
}

/// The stored change order and revised contract amounts must fit their columns too.
fn validate_totals(original_contract_amount: f64, items: &[ChangeOrderLineItem]) -> ApiResult<()> {
    let impact = cost::assess_change_order(items, original_contract_amount, 0);
    if impact.revised_contract_amount > MAX_STORED_AMOUNT {
        return Err(ApiError::bad_request(format!(
            "Revised contract amount cannot exceed {}",
            MAX_STORED_AMOUNT
        )));
    }
    Ok(())
}

/// Check a requested status change against the workflow.
fn check_transition(from: ChangeOrderStatus, to: ChangeOrderStatus) -> ApiResult<()> {
    if from.can_transition_to(to) {
        return Ok(());
    }

    let allowed: Vec<&str> = from.allowed_transitions().iter().map(|s| s.as_str()).collect();
    let allowed = if allowed.is_empty() {
        "none".to_string()
    } else {
        allowed.join(", ")
    };

    Err(ApiError::conflict(format!(
        "Cannot move change order from {} to {} (allowed: {})",
        from, to, allowed
    )))
}

/// GET /projects/:project_id/change-orders
///
/// List change orders for a project, newest number first, optionally by status.
pub async fn list_change_orders(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<ChangeOrderQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = query.pagination();
    let page = records::list_change_orders(
        &state.db,
        project_id,
        query.status,
        pagination.limit(),
        pagination.offset(),
    )
    .await?;

    let data: Vec<ChangeOrderResponse> = page.items.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, &pagination, page.total.max(0) as u64))
}

/// GET /projects/:project_id/change-orders/:change_order_id
pub async fn get_change_order(
    State(state): State<Arc<AppState>>,
    Path((project_id, change_order_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let change_order = records::fetch_change_order(&state.db, project_id, change_order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Change order not found"))?;

    Ok(Json(DataResponse::new(ChangeOrderResponse::from(change_order))))
}

/// POST /projects/:project_id/change-orders
///
/// Create a draft change order with the next sequential number.
pub async fn create_change_order(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateChangeOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_title(&req.title)?;
    validate_amount(req.original_contract_amount)?;
    validate_line_items(&req.line_items)?;
    validate_totals(req.original_contract_amount, &req.line_items)?;

    let change_order = records::insert_change_order(&state.db, project_id, &req).await?;
    let response = ChangeOrderResponse::from(change_order);

    tracing::info!(
        project_id = %project_id,
        change_order_id = %response.id,
        number = response.number,
        amount = response.impact.change_order_amount,
        severity = ?response.impact.severity,
        "Change order created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// PUT /projects/:project_id/change-orders/:change_order_id
///
/// Edit a change order that has not been decided yet.
pub async fn update_change_order(
    State(state): State<Arc<AppState>>,
    Path((project_id, change_order_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateChangeOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    if let Some(amount) = req.original_contract_amount {
        validate_amount(amount)?;
    }
    if let Some(items) = &req.line_items {
        validate_line_items(items)?;
    }

    let mut change_order = records::fetch_change_order(&state.db, project_id, change_order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Change order not found"))?;
    if !change_order.status.is_editable() {
        return Err(ApiError::conflict(format!(
            "Change order is {} and can no longer be edited",
            change_order.status
        )));
    }

    change_order.apply_update(req);
    validate_totals(change_order.original_contract_amount, &change_order.line_items)?;
    let saved = records::save_change_order(&state.db, &change_order)
        .await?
        .ok_or_else(|| ApiError::conflict("Change order was decided while being edited"))?;

    tracing::info!(
        project_id = %project_id,
        change_order_id = %change_order_id,
        "Change order updated"
    );

    Ok(Json(DataResponse::new(ChangeOrderResponse::from(saved))))
}

/// POST /projects/:project_id/change-orders/:change_order_id/transition
///
/// Move a change order one step through the approval workflow.
pub async fn transition_change_order(
    State(state): State<Arc<AppState>>,
    Path((project_id, change_order_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<TransitionChangeOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let current = records::fetch_change_order(&state.db, project_id, change_order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Change order not found"))?;

    check_transition(current.status, req.status)?;

    let updated = records::transition_change_order(
        &state.db,
        project_id,
        change_order_id,
        current.status,
        req.status,
    )
    .await?
    .ok_or_else(|| ApiError::conflict("Change order status changed concurrently"))?;

    tracing::info!(
        project_id = %project_id,
        change_order_id = %change_order_id,
        from = %current.status,
        to = %updated.status,
        "Change order status changed"
    );

    Ok(Json(DataResponse::new(ChangeOrderResponse::from(updated))))
}

/// DELETE /projects/:project_id/change-orders/:change_order_id
pub async fn delete_change_order(
    State(state): State<Arc<AppState>>,
    Path((project_id, change_order_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let change_order = records::fetch_change_order(&state.db, project_id, change_order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Change order not found"))?;
    if !change_order.status.is_editable() {
        return Err(ApiError::conflict(format!(
            "Change order is {} and cannot be deleted",
            change_order.status
        )));
    }

    if !records::delete_change_order(&state.db, project_id, change_order_id).await? {
        return Err(ApiError::conflict("Change order was decided while being deleted"));
    }

    tracing::info!(
        project_id = %project_id,
        change_order_id = %change_order_id,
        "Change order deleted"
    );

    Ok(Json(MessageResponse::new("Change order deleted successfully")))
}
