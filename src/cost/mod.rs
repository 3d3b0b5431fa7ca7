//! Project cost control engine
//!
//! Pure calculators over budget and change order records. Nothing here does
//! I/O or keeps state; every result is recomputed from its inputs, and every
//! division by zero degrades to `0.0` instead of producing NaN or infinity.

pub mod budget;
pub mod change_orders;
pub mod cumulative;
pub mod evm;
pub mod forecast;
pub mod report;
pub mod variance;

pub use budget::{aggregate_budget, budget_total, BudgetSummary, BudgetTotal, BudgetTotals, CategoryBreakdown};
pub use change_orders::{
    assess_change_order, change_order_amount, line_item_total, overall_impact_severity,
    percentage_impact, revised_contract_amount, time_impact, ChangeOrderImpact,
};
pub use cumulative::{
    cumulative_budget_impact, cumulative_schedule_impact, ContractChange, CumulativeBudgetImpact,
    CumulativeScheduleImpact,
};
pub use evm::{run_evm, EvmInput, EvmSnapshot, EvmStatus};
pub use forecast::{
    cash_flow_projection, linear_forecast, project_cash_flow, weighted_average_forecast,
    CashFlowEntry, ForecastSummary, DEFAULT_BLEND_WEIGHT,
};
pub use report::{build_cost_report, ProjectCostReport, ReportOptions};
pub use variance::{
    alert_severity, budget_alerts, budget_health, utilization, utilization_color, variance,
    variance_percentage, BudgetAlert, BudgetHealth, UtilizationColor, VarianceAnalysis,
};

use serde::{Deserialize, Serialize};

/// Four-level severity shared by budget alerts and change order impact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// `numerator / denominator`, or `0.0` when the denominator is zero.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
