//! Project cost report
//!
//! Composes the calculators: the budget total plus approved change orders
//! form the current baseline, which then drives variance, EVM and forecasts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{
    aggregate_budget, budget_alerts, budget_total, cumulative_budget_impact,
    cumulative_schedule_impact, run_evm, BudgetAlert, BudgetSummary, BudgetTotal,
    CumulativeBudgetImpact, CumulativeScheduleImpact, EvmSnapshot, ForecastSummary,
    VarianceAnalysis,
};
use crate::domain::{Budget, ChangeOrder};

/// Progress inputs supplied by the caller, plus forecast tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    pub planned_percent_complete: f64,
    pub actual_percent_complete: f64,
    pub original_end_date: Option<DateTime<Utc>>,
    pub cash_flow_months: u32,
    pub blend_weight: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectCostReport {
    pub project_id: Uuid,
    pub budget_id: Uuid,
    pub budget_version: i32,
    pub budget_approved: bool,
    pub budget: BudgetTotal,
    pub summary: BudgetSummary,
    /// Spend against the current baseline (budget total plus approved change orders).
    pub spend: VarianceAnalysis,
    pub alerts: Vec<BudgetAlert>,
    pub change_orders: CumulativeBudgetImpact,
    pub pending_change_orders: usize,
    pub schedule: CumulativeScheduleImpact,
    pub evm: EvmSnapshot,
    pub forecast: ForecastSummary,
}

pub fn build_cost_report(
    budget: &Budget,
    change_orders: &[ChangeOrder],
    options: &ReportOptions,
) -> ProjectCostReport {
    let total = budget_total(&budget.line_items, budget.contingency_percentage);
    let summary = aggregate_budget(&budget.line_items);
    let actual_cost = summary.actual_cost();

    let cumulative = cumulative_budget_impact(change_orders, total.total);
    let schedule = cumulative_schedule_impact(change_orders, options.original_end_date);
    let baseline = cumulative.revised_budget;

    let evm = run_evm(
        baseline,
        options.actual_percent_complete,
        options.planned_percent_complete,
        actual_cost,
    );

    let forecast = ForecastSummary::new(
        &budget.line_items,
        options.actual_percent_complete,
        actual_cost,
        baseline,
        evm.cost_performance_index,
        options.blend_weight,
        options.cash_flow_months,
    );

    ProjectCostReport {
        project_id: budget.project_id,
        budget_id: budget.id,
        budget_version: budget.version,
        budget_approved: budget.is_approved,
        budget: total,
        spend: VarianceAnalysis::new(baseline, actual_cost),
        alerts: budget_alerts(&summary),
        summary,
        change_orders: cumulative,
        pending_change_orders: change_orders
            .iter()
            .filter(|c| c.status.is_editable())
            .count(),
        schedule,
        evm,
        forecast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{BudgetHealth, Severity};
    use crate::domain::{
        BudgetCategory, BudgetLineItem, ChangeOrderCategory, ChangeOrderItemType,
        ChangeOrderLineItem, ChangeOrderPriority, ChangeOrderReason, ChangeOrderStatus,
    };

    fn budget(items: Vec<BudgetLineItem>, contingency: f64) -> Budget {
        let now = Utc::now();
        Budget {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            name: "Baseline".to_string(),
            version: 2,
            is_approved: true,
            contingency_percentage: contingency,
            notes: None,
            line_items: items,
            approved_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    fn change_order(status: ChangeOrderStatus, amount: f64, days: i64) -> ChangeOrder {
        let now = Utc::now();
        ChangeOrder {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            customer_id: None,
            number: 1,
            title: "Extra footing".to_string(),
            description: None,
            reason: ChangeOrderReason::UnforeseenCondition,
            category: ChangeOrderCategory::SiteCondition,
            priority: ChangeOrderPriority::High,
            status,
            original_contract_amount: 100_000.0,
            schedule_impact_days: days,
            original_completion_date: None,
            revised_completion_date: None,
            line_items: vec![ChangeOrderLineItem::new(ChangeOrderItemType::Labor, 1.0, amount)],
            submitted_at: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn options() -> ReportOptions {
        ReportOptions {
            planned_percent_complete: 50.0,
            actual_percent_complete: 40.0,
            original_end_date: Some("2027-01-01T00:00:00Z".parse().unwrap()),
            cash_flow_months: 10,
            blend_weight: 0.7,
        }
    }

    #[test]
    fn approved_change_orders_raise_the_evm_baseline() {
        let budget = budget(
            vec![
                BudgetLineItem {
                    spent_amount: 30_000.0,
                    ..BudgetLineItem::new(BudgetCategory::Material, 60_000.0)
                },
                BudgetLineItem {
                    spent_amount: 12_000.0,
                    ..BudgetLineItem::new(BudgetCategory::Labor, 40_000.0)
                },
            ],
            10.0,
        );
        let change_orders = vec![
            change_order(ChangeOrderStatus::Approved, 10_000.0, 14),
            change_order(ChangeOrderStatus::Draft, 50_000.0, 60),
        ];

        let report = build_cost_report(&budget, &change_orders, &options());

        assert_eq!(report.budget.total, 110_000.0);
        assert_eq!(report.change_orders.revised_budget, 120_000.0);
        assert_eq!(report.change_orders.approved_count, 1);
        assert_eq!(report.pending_change_orders, 1);
        assert_eq!(report.evm.budget_at_completion, 120_000.0);
        assert_eq!(report.evm.earned_value, 48_000.0);
        assert_eq!(report.evm.planned_value, 60_000.0);
        assert_eq!(report.evm.actual_cost, 42_000.0);
        assert_eq!(report.spend.budgeted, 120_000.0);
        assert_eq!(report.spend.health, BudgetHealth::Healthy);
        assert_eq!(report.schedule.total_days, 14);
        assert_eq!(
            report.schedule.revised_end_date,
            Some("2027-01-15T00:00:00Z".parse().unwrap())
        );
        assert_eq!(report.forecast.cash_flow.len(), 10);
        assert_eq!(report.forecast.cash_flow[0].expected_spend, 10_000.0);
        assert_eq!(report.forecast.linear_forecast, 105_000.0);
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn overspent_category_surfaces_an_alert() {
        let budget = budget(
            vec![BudgetLineItem {
                spent_amount: 5_200.0,
                ..BudgetLineItem::new(BudgetCategory::Equipment, 5_000.0)
            }],
            0.0,
        );

        let report = build_cost_report(&budget, &[], &options());

        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].severity, Severity::Critical);
        assert_eq!(report.spend.health, BudgetHealth::Critical);
    }

    #[test]
    fn report_is_repeatable() {
        let budget = budget(vec![BudgetLineItem::new(BudgetCategory::Overhead, 1_234.56)], 7.5);
        let change_orders = vec![change_order(ChangeOrderStatus::Implemented, 99.99, 2)];

        let first = build_cost_report(&budget, &change_orders, &options());
        let second = build_cost_report(&budget, &change_orders, &options());

        assert_eq!(first, second);
    }
}
