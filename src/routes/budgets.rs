//! Budget routes
//!
//! Budgets are versioned per project. Approved budgets are frozen.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, MessageResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::db::MAX_STORED_AMOUNT;
use crate::domain::{BudgetLineItem, BudgetResponse, CreateBudgetRequest, UpdateBudgetRequest};
use crate::error::{ApiError, ApiResult};
use crate::services::records;

fn validate_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Budget name is required"));
    }
    Ok(())
}

fn validate_contingency(pct: f64) -> ApiResult<()> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(ApiError::bad_request(
            "Contingency percentage must be between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_line_items(items: &[BudgetLineItem]) -> ApiResult<()> {
    for (index, item) in items.iter().enumerate() {
        let amounts = [
            item.budgeted_amount,
            item.allocated_amount,
            item.committed_amount,
            item.spent_amount,
        ];
        if amounts.iter().any(|amount| *amount < 0.0) {
            return Err(ApiError::bad_request(format!(
                "Line item {} has a negative amount",
                index + 1
            )));
        }
        if amounts.iter().any(|amount| *amount > MAX_STORED_AMOUNT) {
            return Err(ApiError::bad_request(format!(
                "Line item {} has an amount above {}",
                index + 1,
                MAX_STORED_AMOUNT
            )));
        }
    }
    Ok(())
}

/// GET /projects/:project_id/budgets
///
/// List budgets for a project, newest version first.
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    let page = records::list_budgets(
        &state.db,
        project_id,
        pagination.limit(),
        pagination.offset(),
    )
    .await?;

    let data: Vec<BudgetResponse> = page.items.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, &pagination, page.total.max(0) as u64))
}

/// GET /projects/:project_id/budgets/:budget_id
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Path((project_id, budget_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let budget = records::fetch_budget(&state.db, project_id, budget_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Budget not found"))?;

    Ok(Json(DataResponse::new(BudgetResponse::from(budget))))
}

/// POST /projects/:project_id/budgets
///
/// Create the next budget version for a project.
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateBudgetRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_name(&req.name)?;
    validate_contingency(req.contingency_percentage)?;
    validate_line_items(&req.line_items)?;

    let budget = records::insert_budget(&state.db, project_id, &req).await?;

    tracing::info!(
        project_id = %project_id,
        budget_id = %budget.id,
        version = budget.version,
        line_items = budget.line_items.len(),
        "Budget created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(BudgetResponse::from(budget))),
    ))
}

/// PUT /projects/:project_id/budgets/:budget_id
///
/// Update a draft budget. Line items, when given, replace the stored ones.
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Path((project_id, budget_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateBudgetRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }
    if let Some(pct) = req.contingency_percentage {
        validate_contingency(pct)?;
    }
    if let Some(items) = &req.line_items {
        validate_line_items(items)?;
    }

    let existing = records::fetch_budget(&state.db, project_id, budget_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Budget not found"))?;
    if existing.is_approved {
        return Err(ApiError::conflict("Approved budgets cannot be edited"));
    }

    let budget = records::update_budget(&state.db, project_id, budget_id, &req)
        .await?
        .ok_or_else(|| ApiError::conflict("Budget was approved while being edited"))?;

    tracing::info!(
        project_id = %project_id,
        budget_id = %budget_id,
        replaced_line_items = req.line_items.is_some(),
        "Budget updated"
    );

    Ok(Json(DataResponse::new(BudgetResponse::from(budget))))
}

/// POST /projects/:project_id/budgets/:budget_id/approve
pub async fn approve_budget(
    State(state): State<Arc<AppState>>,
    Path((project_id, budget_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let existing = records::fetch_budget(&state.db, project_id, budget_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Budget not found"))?;
    if existing.is_approved {
        return Err(ApiError::conflict("Budget is already approved"));
    }

    let budget = records::approve_budget(&state.db, project_id, budget_id)
        .await?
        .ok_or_else(|| ApiError::conflict("Budget is already approved"))?;

    tracing::info!(
        project_id = %project_id,
        budget_id = %budget_id,
        version = budget.version,
        "Budget approved"
    );

    Ok(Json(DataResponse::new(BudgetResponse::from(budget))))
}

/// DELETE /projects/:project_id/budgets/:budget_id
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Path((project_id, budget_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    if !records::delete_budget(&state.db, project_id, budget_id).await? {
        return Err(ApiError::not_found("Budget not found"));
    }

    tracing::info!(project_id = %project_id, budget_id = %budget_id, "Budget deleted");

    Ok(Json(MessageResponse::new("Budget deleted successfully")))
}
