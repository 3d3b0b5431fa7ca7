//! Cost forecasting
//!
//! Linear burn-rate projection, a weighted blend of that projection with the
//! EVM estimate at completion, and a flat month-by-month cash-flow schedule.
//! The cash-flow model depletes the budget evenly and ignores real spend curves.

use serde::Serialize;

use super::ratio;
use crate::domain::BudgetLineItem;

/// Share of the linear projection in [`weighted_average_forecast`].
pub const DEFAULT_BLEND_WEIGHT: f64 = 0.7;

/// Projected final cost if spending continues at the current burn rate.
pub fn linear_forecast(percent_complete: f64, actual_cost: f64) -> f64 {
    ratio(actual_cost, percent_complete / 100.0)
}

/// `weight` clamped into `[0, 1]`, or [`DEFAULT_BLEND_WEIGHT`] when not finite.
pub(crate) fn effective_blend_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.clamp(0.0, 1.0)
    } else {
        DEFAULT_BLEND_WEIGHT
    }
}

/// Blend of the linear projection (weighted by `weight`) and the EVM
/// estimate at completion `BAC / CPI` (weighted by `1 - weight`).
///
/// See [`effective_blend_weight`] for how `weight` is sanitised.
pub fn weighted_average_forecast(
    percent_complete: f64,
    actual_cost: f64,
    total_budget: f64,
    cpi: f64,
    weight: f64,
) -> f64 {
    let weight = effective_blend_weight(weight);

    let linear = linear_forecast(percent_complete, actual_cost);
    let evm = ratio(total_budget, cpi);

    linear * weight + evm * (1.0 - weight)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CashFlowEntry {
    /// 1-based month index from the start of the projection.
    pub month: u32,
    pub expected_spend: f64,
    pub cumulative_spend: f64,
    pub remaining_budget: f64,
}

/// Flat cash-flow schedule over the budgeted total of `items`.
pub fn cash_flow_projection(items: &[BudgetLineItem], months: u32) -> Vec<CashFlowEntry> {
    let total: f64 = items.iter().map(|item| item.budgeted_amount).sum();
    project_cash_flow(total, months)
}

/// Spread `total_budget` evenly over `months`; remaining budget never drops below zero.
pub fn project_cash_flow(total_budget: f64, months: u32) -> Vec<CashFlowEntry> {
    if months == 0 {
        return Vec::new();
    }

    let monthly = total_budget / f64::from(months);

    (1..=months)
        .map(|month| {
            let cumulative_spend = monthly * f64::from(month);
            CashFlowEntry {
                month,
                expected_spend: monthly,
                cumulative_spend,
                remaining_budget: (total_budget - cumulative_spend).max(0.0),
            }
        })
        .collect()
}

/// All forecasts for one set of progress inputs.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForecastSummary {
    pub linear_forecast: f64,
    pub weighted_forecast: f64,
    pub blend_weight: f64,
    pub estimate_at_completion: f64,
    pub cash_flow: Vec<CashFlowEntry>,
}

impl ForecastSummary {
    pub fn new(
        items: &[BudgetLineItem],
        percent_complete: f64,
        actual_cost: f64,
        total_budget: f64,
        cpi: f64,
        weight: f64,
        months: u32,
    ) -> Self {
        Self {
            linear_forecast: linear_forecast(percent_complete, actual_cost),
            weighted_forecast: weighted_average_forecast(
                percent_complete,
                actual_cost,
                total_budget,
                cpi,
                weight,
            ),
            blend_weight: effective_blend_weight(weight),
            estimate_at_completion: ratio(total_budget, cpi),
            cash_flow: cash_flow_projection(items, months),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BudgetCategory;

    #[test]
    fn linear_projects_burn_rate() {
        assert_eq!(linear_forecast(25.0, 30_000.0), 120_000.0);
        assert_eq!(linear_forecast(100.0, 95_000.0), 95_000.0);
    }

    #[test]
    fn linear_is_zero_before_any_progress() {
        assert_eq!(linear_forecast(0.0, 500.0), 0.0);
    }

    #[test]
    fn weighted_blends_linear_and_evm() {
        // linear = 120k, EAC = 100k / 0.8 = 125k.
        let blended = weighted_average_forecast(25.0, 30_000.0, 100_000.0, 0.8, 0.7);
        let expected = 120_000.0 * 0.7 + 125_000.0 * (1.0 - 0.7);

        assert_eq!(blended, expected);
        assert_eq!(weighted_average_forecast(25.0, 30_000.0, 100_000.0, 0.8, 1.0), 120_000.0);
        assert_eq!(weighted_average_forecast(25.0, 30_000.0, 100_000.0, 0.8, 0.0), 125_000.0);
    }

    #[test]
    fn weighted_clamps_weight() {
        let high = weighted_average_forecast(25.0, 30_000.0, 100_000.0, 0.8, 4.0);
        let low = weighted_average_forecast(25.0, 30_000.0, 100_000.0, 0.8, -1.0);

        assert_eq!(high, 120_000.0);
        assert_eq!(low, 125_000.0);
    }

    #[test]
    fn cash_flow_spreads_budget_evenly() {
        let items = vec![
            BudgetLineItem::new(BudgetCategory::Material, 8_000.0),
            BudgetLineItem::new(BudgetCategory::Labor, 4_000.0),
        ];

        let schedule = cash_flow_projection(&items, 4);

        assert_eq!(schedule.len(), 4);
        assert!(schedule.iter().all(|entry| entry.expected_spend == 3_000.0));
        assert_eq!(schedule[0].month, 1);
        assert_eq!(schedule[0].remaining_budget, 9_000.0);
        assert_eq!(schedule[2].cumulative_spend, 9_000.0);
        assert_eq!(schedule[3].remaining_budget, 0.0);
    }

    #[test]
    fn cash_flow_remaining_never_negative() {
        let schedule = project_cash_flow(1_000.0, 3);

        assert!(schedule.iter().all(|entry| entry.remaining_budget >= 0.0));
        assert_eq!(schedule.last().unwrap().remaining_budget, 0.0);
    }

    #[test]
    fn zero_months_is_empty() {
        assert!(project_cash_flow(1_000.0, 0).is_empty());
    }

    #[test]
    fn summary_reports_the_weight_it_used() {
        let summary = ForecastSummary::new(&[], 25.0, 30_000.0, 100_000.0, 0.8, 4.0, 1);

        assert_eq!(summary.blend_weight, 1.0);
        assert_eq!(summary.weighted_forecast, 120_000.0);

        let summary = ForecastSummary::new(&[], 25.0, 30_000.0, 100_000.0, 0.8, f64::NAN, 1);
        assert_eq!(summary.blend_weight, DEFAULT_BLEND_WEIGHT);
    }
}
