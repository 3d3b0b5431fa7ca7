//! Change order impact calculation
//!
//! Works on any change order regardless of its status; which change orders
//! count toward the contract baseline is decided in [`super::cumulative`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ratio, Severity};
use crate::domain::ChangeOrderLineItem;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// `quantity × unit_rate`, with negative or non-finite factors read as zero.
pub fn line_item_total(item: &ChangeOrderLineItem) -> f64 {
    non_negative(item.quantity) * non_negative(item.unit_rate)
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn change_order_amount(items: &[ChangeOrderLineItem]) -> f64 {
    items.iter().map(line_item_total).sum()
}

pub fn revised_contract_amount(original_contract_amount: f64, change_order_amount: f64) -> f64 {
    original_contract_amount + change_order_amount
}

/// Days between the two completion dates, rounded up. Positive means delay.
pub fn time_impact(
    original_completion_date: DateTime<Utc>,
    revised_completion_date: DateTime<Utc>,
) -> i64 {
    let millis = (revised_completion_date - original_completion_date).num_milliseconds();
    (millis as f64 / MILLIS_PER_DAY).ceil() as i64
}

/// `|amount| / original × 100`, or `0.0` when there is no original contract amount.
pub fn percentage_impact(change_order_amount: f64, original_contract_amount: f64) -> f64 {
    ratio(change_order_amount.abs(), original_contract_amount) * 100.0
}

pub fn overall_impact_severity(
    change_order_amount: f64,
    original_contract_amount: f64,
    schedule_impact_days: i64,
) -> Severity {
    let pct = percentage_impact(change_order_amount, original_contract_amount);
    let days = schedule_impact_days.unsigned_abs();

    if pct > 20.0 || days > 30 {
        Severity::Critical
    } else if pct > 10.0 || days > 14 {
        Severity::High
    } else if pct > 5.0 || days > 7 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Cost and schedule impact of a single change order.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ChangeOrderImpact {
    pub change_order_amount: f64,
    pub original_contract_amount: f64,
    pub revised_contract_amount: f64,
    pub percentage_impact: f64,
    pub schedule_impact_days: i64,
    pub severity: Severity,
}

pub fn assess_change_order(
    items: &[ChangeOrderLineItem],
    original_contract_amount: f64,
    schedule_impact_days: i64,
) -> ChangeOrderImpact {
    let amount = change_order_amount(items);

    ChangeOrderImpact {
        change_order_amount: amount,
        original_contract_amount,
        revised_contract_amount: revised_contract_amount(original_contract_amount, amount),
        percentage_impact: percentage_impact(amount, original_contract_amount),
        schedule_impact_days,
        severity: overall_impact_severity(amount, original_contract_amount, schedule_impact_days),
    }
}
