//! Earned value analysis
//!
//! Derives the standard EVM indicators from the budget at completion (BAC),
//! actual and planned percent complete, and actual cost (AC). Indices whose
//! denominator is zero come back as `0.0`, which at project start can look
//! the same as a genuinely zero ratio.

use serde::{Deserialize, Serialize};

use super::ratio;
use crate::domain::lenient_amount;

/// Inputs to [`run_evm`], as supplied by the UI.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EvmInput {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_budget: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub actual_percent_complete: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub planned_percent_complete: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub actual_cost: f64,
}

impl EvmInput {
    pub fn snapshot(&self) -> EvmSnapshot {
        run_evm(
            self.total_budget,
            self.actual_percent_complete,
            self.planned_percent_complete,
            self.actual_cost,
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostStatus {
    UnderBudget,
    OnBudget,
    OverBudget,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    AheadOfSchedule,
    OnSchedule,
    BehindSchedule,
}

/// Reading of a performance index against 1.0.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct EvmStatus {
    pub cost: CostStatus,
    pub schedule: ScheduleStatus,
    pub cost_performance: PerformanceRating,
    pub schedule_performance: PerformanceRating,
}

impl EvmStatus {
    fn classify(cv: f64, sv: f64, cpi: f64, spi: f64) -> Self {
        let cost = if cv > 0.0 {
            CostStatus::UnderBudget
        } else if cv < 0.0 {
            CostStatus::OverBudget
        } else {
            CostStatus::OnBudget
        };

        let schedule = if sv > 0.0 {
            ScheduleStatus::AheadOfSchedule
        } else if sv < 0.0 {
            ScheduleStatus::BehindSchedule
        } else {
            ScheduleStatus::OnSchedule
        };

        Self {
            cost,
            schedule,
            cost_performance: rate_index(cpi),
            schedule_performance: rate_index(spi),
        }
    }
}

fn rate_index(index: f64) -> PerformanceRating {
    if index > 1.0 {
        PerformanceRating::Good
    } else if index < 1.0 {
        PerformanceRating::Poor
    } else {
        PerformanceRating::Fair
    }
}

/// Derived EVM view. Never stored.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct EvmSnapshot {
    pub budget_at_completion: f64,
    pub planned_value: f64,
    pub earned_value: f64,
    pub actual_cost: f64,
    pub cost_variance: f64,
    pub schedule_variance: f64,
    pub cost_performance_index: f64,
    pub schedule_performance_index: f64,
    pub estimate_at_completion: f64,
    pub estimate_to_complete: f64,
    pub variance_at_completion: f64,
    pub to_complete_performance_index: f64,
    pub status: EvmStatus,
}

pub fn run_evm(
    total_budget: f64,
    actual_percent_complete: f64,
    planned_percent_complete: f64,
    actual_cost: f64,
) -> EvmSnapshot {
    let bac = total_budget;
    let pv = bac * planned_percent_complete / 100.0;
    let ev = bac * actual_percent_complete / 100.0;
    let ac = actual_cost;

    let cv = ev - ac;
    let sv = ev - pv;
    let cpi = ratio(ev, ac);
    let spi = ratio(ev, pv);
    let eac = ratio(bac, cpi);
    let etc = eac - ac;
    let vac = bac - eac;
    let tcpi = ratio(bac - ev, bac - ac);

    EvmSnapshot {
        budget_at_completion: bac,
        planned_value: pv,
        earned_value: ev,
        actual_cost: ac,
        cost_variance: cv,
        schedule_variance: sv,
        cost_performance_index: cpi,
        schedule_performance_index: spi,
        estimate_at_completion: eac,
        estimate_to_complete: etc,
        variance_at_completion: vac,
        to_complete_performance_index: tcpi,
        status: EvmStatus::classify(cv, sv, cpi, spi),
    }
}
