//! Variance, utilization and budget health classification
//!
//! Breakpoints are fixed. Rules are evaluated from most to least severe and
//! the first match wins.

use serde::Serialize;

use super::{ratio, BudgetSummary, Severity};
use crate::domain::BudgetCategory;

/// Display tone for a utilization percentage.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationColor {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum BudgetHealth {
    Healthy,
    Caution,
    Warning,
    Critical,
}

/// Positive means under budget.
pub fn variance(budgeted: f64, actual: f64) -> f64 {
    budgeted - actual
}

pub fn variance_percentage(budgeted: f64, actual: f64) -> f64 {
    ratio(variance(budgeted, actual), budgeted) * 100.0
}

pub fn utilization(budgeted: f64, actual: f64) -> f64 {
    ratio(actual, budgeted) * 100.0
}

pub fn utilization_color(utilization_pct: f64) -> UtilizationColor {
    if utilization_pct >= 100.0 {
        UtilizationColor::Danger
    } else if utilization_pct >= 90.0 {
        UtilizationColor::Warning
    } else if utilization_pct >= 80.0 {
        UtilizationColor::Info
    } else {
        UtilizationColor::Success
    }
}

pub fn alert_severity(utilization_pct: f64) -> Severity {
    if utilization_pct >= 100.0 {
        Severity::Critical
    } else if utilization_pct >= 95.0 {
        Severity::High
    } else if utilization_pct >= 90.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

pub fn budget_health(utilization_pct: f64, variance_pct: f64) -> BudgetHealth {
    if utilization_pct >= 100.0 || variance_pct < -10.0 {
        BudgetHealth::Critical
    } else if utilization_pct >= 90.0 || variance_pct < -5.0 {
        BudgetHealth::Warning
    } else if utilization_pct >= 80.0 {
        BudgetHealth::Caution
    } else {
        BudgetHealth::Healthy
    }
}

/// Every derived figure for one budgeted/actual pair.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct VarianceAnalysis {
    pub budgeted: f64,
    pub actual: f64,
    pub variance: f64,
    pub variance_percentage: f64,
    pub utilization: f64,
    pub color: UtilizationColor,
    pub alert_severity: Severity,
    pub health: BudgetHealth,
}

impl VarianceAnalysis {
    pub fn new(budgeted: f64, actual: f64) -> Self {
        let utilization = utilization(budgeted, actual);
        let variance_percentage = variance_percentage(budgeted, actual);

        Self {
            budgeted,
            actual,
            variance: variance(budgeted, actual),
            variance_percentage,
            utilization,
            color: utilization_color(utilization),
            alert_severity: alert_severity(utilization),
            health: budget_health(utilization, variance_percentage),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetAlert {
    pub category: BudgetCategory,
    pub utilization: f64,
    pub severity: Severity,
    pub message: String,
}

/// One alert per category whose spend has reached an alerting threshold,
/// most severe first.
pub fn budget_alerts(summary: &BudgetSummary) -> Vec<BudgetAlert> {
    let mut alerts: Vec<BudgetAlert> = summary
        .by_category
        .iter()
        .filter_map(|(category, breakdown)| {
            let utilization = utilization(breakdown.budgeted, breakdown.spent);
            let severity = alert_severity(utilization);
            if severity == Severity::Low {
                return None;
            }

            Some(BudgetAlert {
                category: *category,
                utilization,
                severity,
                message: format!(
                    "{} spending at {:.1}% of budget",
                    category.as_str(),
                    utilization
                ),
            })
        })
        .collect();

    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}
