//! Stateless calculation routes
//!
//! The request body carries the records; nothing is read from or written to
//! the record store.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::config::Settings;
use crate::cost::{
    self, BudgetAlert, BudgetSummary, BudgetTotal, ChangeOrderImpact, CumulativeBudgetImpact,
    CumulativeScheduleImpact, EvmInput, EvmSnapshot, ForecastSummary, VarianceAnalysis,
};
use crate::domain::{
    lenient_amount, lenient_optional_amount, BudgetLineItem, BudgetLineItemResponse, ChangeOrderInput,
    ChangeOrderLineItemResponse,
};
use crate::error::{ApiError, ApiResult};

// ============================================================================
// Budget summary
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BudgetSummaryRequest {
    #[serde(default)]
    pub line_items: Vec<BudgetLineItem>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub contingency_percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct BudgetSummaryResponse {
    pub line_items: Vec<BudgetLineItemResponse>,
    pub total: BudgetTotal,
    pub summary: BudgetSummary,
    pub spend: VarianceAnalysis,
    pub alerts: Vec<BudgetAlert>,
}

/// POST /calculations/budget-summary
pub async fn budget_summary(
    Json(req): Json<BudgetSummaryRequest>,
) -> Json<DataResponse<BudgetSummaryResponse>> {
    let summary = cost::aggregate_budget(&req.line_items);

    tracing::debug!(
        line_items = summary.line_item_count,
        categories = summary.by_category.len(),
        "Aggregating budget"
    );

    let response = BudgetSummaryResponse {
        line_items: req.line_items.iter().map(Into::into).collect(),
        total: cost::budget_total(&req.line_items, req.contingency_percentage),
        spend: VarianceAnalysis::new(summary.totals.budgeted, summary.totals.spent),
        alerts: cost::budget_alerts(&summary),
        summary,
    };

    Json(DataResponse::new(response))
}

// ============================================================================
// Earned value
// ============================================================================

/// POST /calculations/evm
pub async fn evm(Json(input): Json<EvmInput>) -> Json<DataResponse<EvmSnapshot>> {
    Json(DataResponse::new(input.snapshot()))
}

// ============================================================================
// Forecast
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    #[serde(default)]
    pub line_items: Vec<BudgetLineItem>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub percent_complete: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub actual_cost: f64,
    /// Budget at completion; defaults to the line items' budgeted total.
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub total_budget: Option<f64>,
    /// Defaults to the CPI implied by the other inputs.
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub cpi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub months: Option<u32>,
}

/// POST /calculations/forecast
pub async fn forecast(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForecastRequest>,
) -> ApiResult<Json<DataResponse<ForecastSummary>>> {
    let months = resolve_months(req.months, &state.settings)?;
    let total_budget = req
        .total_budget
        .filter(|v| v.is_finite())
        .unwrap_or_else(|| cost::aggregate_budget(&req.line_items).totals.budgeted);
    let cpi = req.cpi.filter(|v| v.is_finite()).unwrap_or_else(|| {
        cost::run_evm(total_budget, req.percent_complete, req.percent_complete, req.actual_cost)
            .cost_performance_index
    });
    let weight = req.weight.unwrap_or(state.settings.forecast_blend_weight);

    let summary = ForecastSummary::new(
        &req.line_items,
        req.percent_complete,
        req.actual_cost,
        total_budget,
        cpi,
        weight,
        months,
    );

    Ok(Json(DataResponse::new(summary)))
}

/// Cash-flow horizon from the request, falling back to the configured default.
pub(crate) fn resolve_months(requested: Option<u32>, settings: &Settings) -> ApiResult<u32> {
    match requested {
        None => Ok(settings.cash_flow_months),
        Some(months) if (1..=Settings::MAX_CASH_FLOW_MONTHS).contains(&months) => Ok(months),
        Some(months) => Err(ApiError::bad_request(format!(
            "months must be between 1 and {}, got {}",
            Settings::MAX_CASH_FLOW_MONTHS,
            months
        ))),
    }
}

// ============================================================================
// Change orders
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ChangeOrderImpactResponse {
    pub line_items: Vec<ChangeOrderLineItemResponse>,
    pub impact: ChangeOrderImpact,
}

/// POST /calculations/change-order-impact
pub async fn change_order_impact(
    Json(input): Json<ChangeOrderInput>,
) -> Json<DataResponse<ChangeOrderImpactResponse>> {
    let impact = cost::assess_change_order(
        &input.line_items,
        input.original_contract_amount,
        input.effective_schedule_impact_days(),
    );

    Json(DataResponse::new(ChangeOrderImpactResponse {
        line_items: input.line_items.iter().map(Into::into).collect(),
        impact,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CumulativeImpactRequest {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub original_budget: f64,
    #[serde(default)]
    pub original_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub change_orders: Vec<ChangeOrderInput>,
}

#[derive(Debug, Serialize)]
pub struct CumulativeImpactResponse {
    pub budget: CumulativeBudgetImpact,
    pub schedule: CumulativeScheduleImpact,
}

/// POST /calculations/cumulative-impact
pub async fn cumulative_impact(
    Json(req): Json<CumulativeImpactRequest>,
) -> Json<DataResponse<CumulativeImpactResponse>> {
    let budget = cost::cumulative_budget_impact(&req.change_orders, req.original_budget);
    let schedule = cost::cumulative_schedule_impact(&req.change_orders, req.original_end_date);

    tracing::debug!(
        change_orders = req.change_orders.len(),
        approved = budget.approved_count,
        total_impact = budget.total_impact,
        "Folding change order impact"
    );

    Json(DataResponse::new(CumulativeImpactResponse { budget, schedule }))
}
