//! Project cost report route

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::calculations::resolve_months;
use crate::api::DataResponse;
use crate::app::AppState;
use crate::cost::{self, ProjectCostReport, ReportOptions};
use crate::error::{ApiError, ApiResult};
use crate::services::records;

#[derive(Debug, Deserialize, Default)]
pub struct CostReportQuery {
    /// Defaults to the latest budget version.
    pub budget_id: Option<Uuid>,
    pub planned_percent_complete: Option<f64>,
    pub actual_percent_complete: Option<f64>,
    pub original_end_date: Option<DateTime<Utc>>,
    pub months: Option<u32>,
}

fn percent(name: &str, value: Option<f64>) -> ApiResult<f64> {
    match value {
        None => Ok(0.0),
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(ApiError::bad_request(format!("{} must be a finite number", name))),
    }
}

/// GET /projects/:project_id/cost-report
///
/// Budget, approved change orders and progress folded into one report.
pub async fn cost_report(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<CostReportQuery>,
) -> ApiResult<Json<DataResponse<ProjectCostReport>>> {
    let options = ReportOptions {
        planned_percent_complete: percent(
            "planned_percent_complete",
            query.planned_percent_complete,
        )?,
        actual_percent_complete: percent("actual_percent_complete", query.actual_percent_complete)?,
        original_end_date: query.original_end_date,
        cash_flow_months: resolve_months(query.months, &state.settings)?,
        blend_weight: state.settings.forecast_blend_weight,
    };

    let budget = async {
        match query.budget_id {
            Some(budget_id) => records::fetch_budget(&state.db, project_id, budget_id).await,
            None => records::fetch_latest_budget(&state.db, project_id).await,
        }
    };
    let change_orders = records::fetch_project_change_orders(&state.db, project_id);

    let (budget, change_orders) = futures::try_join!(budget, change_orders)?;
    let budget = budget.ok_or_else(|| ApiError::not_found("Budget not found"))?;

    let report = cost::build_cost_report(&budget, &change_orders, &options);

    tracing::info!(
        project_id = %project_id,
        budget_id = %report.budget_id,
        change_orders = change_orders.len(),
        approved_change_orders = report.change_orders.approved_count,
        cpi = report.evm.cost_performance_index,
        health = ?report.spend.health,
        "Cost report built"
    );

    Ok(Json(DataResponse::new(report)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_percents_default_to_zero() {
        assert_eq!(percent("p", None).unwrap(), 0.0);
        assert_eq!(percent("p", Some(42.5)).unwrap(), 42.5);
        assert!(percent("p", Some(f64::NAN)).is_err());
    }
}
