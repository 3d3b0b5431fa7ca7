//! Cumulative change order impact against the original baseline
//!
//! Only approved and implemented change orders move the baseline. Totals are
//! folded from the full set on every call; no running total is kept.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{change_order_amount, ratio};
use crate::domain::{ChangeOrder, ChangeOrderInput, ChangeOrderStatus};

/// A change order as seen by the cumulative aggregators.
pub trait ContractChange {
    fn status(&self) -> ChangeOrderStatus;

    /// Monetary amount of the change, derived from its line items.
    fn amount(&self) -> f64;

    /// Signed schedule impact in days; positive is a delay.
    fn schedule_impact_days(&self) -> i64;
}

impl ContractChange for ChangeOrder {
    fn status(&self) -> ChangeOrderStatus {
        self.status
    }

    fn amount(&self) -> f64 {
        change_order_amount(&self.line_items)
    }

    fn schedule_impact_days(&self) -> i64 {
        self.schedule_impact_days
    }
}

impl ContractChange for ChangeOrderInput {
    fn status(&self) -> ChangeOrderStatus {
        self.status
    }

    fn amount(&self) -> f64 {
        change_order_amount(&self.line_items)
    }

    fn schedule_impact_days(&self) -> i64 {
        self.effective_schedule_impact_days()
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CumulativeBudgetImpact {
    pub original_budget: f64,
    pub total_impact: f64,
    pub revised_budget: f64,
    pub impact_percentage: f64,
    pub approved_count: usize,
}

pub fn cumulative_budget_impact<C: ContractChange>(
    changes: &[C],
    original_budget: f64,
) -> CumulativeBudgetImpact {
    let (total_impact, approved_count) = changes
        .iter()
        .filter(|change| change.status().counts_toward_baseline())
        .fold((0.0, 0), |(total, count), change| {
            (total + change.amount(), count + 1)
        });

    CumulativeBudgetImpact {
        original_budget,
        total_impact,
        revised_budget: original_budget + total_impact,
        impact_percentage: ratio(total_impact, original_budget) * 100.0,
        approved_count,
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CumulativeScheduleImpact {
    pub total_days: i64,
    pub original_end_date: Option<DateTime<Utc>>,
    pub revised_end_date: Option<DateTime<Utc>>,
    pub approved_count: usize,
}

/// Sum of approved schedule impacts, applied to `original_end_date` when known.
pub fn cumulative_schedule_impact<C: ContractChange>(
    changes: &[C],
    original_end_date: Option<DateTime<Utc>>,
) -> CumulativeScheduleImpact {
    let (total_days, approved_count) = changes
        .iter()
        .filter(|change| change.status().counts_toward_baseline())
        .fold((0_i64, 0), |(days, count), change| {
            (days.saturating_add(change.schedule_impact_days()), count + 1)
        });

    CumulativeScheduleImpact {
        total_days,
        original_end_date,
        revised_end_date: original_end_date
            .zip(Duration::try_days(total_days))
            .and_then(|(end, shift)| end.checked_add_signed(shift)),
        approved_count,
    }
}
