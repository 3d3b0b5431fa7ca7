//! Budget line item aggregation

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{BudgetCategory, BudgetLineItem};

/// Sums of the four amount fields plus the derived availability.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct BudgetTotals {
    pub budgeted: f64,
    pub allocated: f64,
    pub committed: f64,
    pub spent: f64,
    pub available: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct CategoryBreakdown {
    pub budgeted: f64,
    pub spent: f64,
    pub variance: f64,
}

/// Budget totals and a breakdown for every category that has line items.
///
/// Categories without line items are absent from `by_category`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BudgetSummary {
    pub totals: BudgetTotals,
    pub by_category: BTreeMap<BudgetCategory, CategoryBreakdown>,
    pub line_item_count: usize,
}

impl BudgetSummary {
    /// Actual cost fed into earned value analysis.
    pub fn actual_cost(&self) -> f64 {
        self.totals.spent
    }
}

/// Budget at completion: line item total plus contingency.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct BudgetTotal {
    pub subtotal: f64,
    pub contingency_percentage: f64,
    pub contingency_amount: f64,
    pub total: f64,
}

pub fn aggregate_budget(items: &[BudgetLineItem]) -> BudgetSummary {
    let mut totals = BudgetTotals::default();
    let mut by_category: BTreeMap<BudgetCategory, CategoryBreakdown> = BTreeMap::new();

    for item in items {
        totals.budgeted += item.budgeted_amount;
        totals.allocated += item.allocated_amount;
        totals.committed += item.committed_amount;
        totals.spent += item.spent_amount;

        let entry = by_category.entry(item.category).or_default();
        entry.budgeted += item.budgeted_amount;
        entry.spent += item.spent_amount;
    }

    totals.available = totals.budgeted - totals.allocated - totals.committed - totals.spent;
    for breakdown in by_category.values_mut() {
        breakdown.variance = super::variance(breakdown.budgeted, breakdown.spent);
    }

    BudgetSummary {
        totals,
        by_category,
        line_item_count: items.len(),
    }
}

pub fn budget_total(items: &[BudgetLineItem], contingency_percentage: f64) -> BudgetTotal {
    let subtotal: f64 = items.iter().map(|item| item.budgeted_amount).sum();
    let contingency_amount = subtotal * contingency_percentage / 100.0;

    BudgetTotal {
        subtotal,
        contingency_percentage,
        contingency_amount,
        total: subtotal + contingency_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: BudgetCategory, budgeted: f64, committed: f64, spent: f64) -> BudgetLineItem {
        BudgetLineItem {
            committed_amount: committed,
            spent_amount: spent,
            ..BudgetLineItem::new(category, budgeted)
        }
    }

    #[test]
    fn sums_every_amount_field() {
        let items = vec![
            BudgetLineItem {
                allocated_amount: 100.0,
                ..item(BudgetCategory::Material, 5_000.0, 1_000.0, 2_000.0)
            },
            item(BudgetCategory::Labor, 8_000.0, 0.0, 6_500.0),
        ];

        let summary = aggregate_budget(&items);

        assert_eq!(summary.totals.budgeted, 13_000.0);
        assert_eq!(summary.totals.allocated, 100.0);
        assert_eq!(summary.totals.committed, 1_000.0);
        assert_eq!(summary.totals.spent, 8_500.0);
        assert_eq!(summary.totals.available, 3_400.0);
        assert_eq!(summary.actual_cost(), 8_500.0);
        assert_eq!(summary.line_item_count, 2);
    }

    #[test]
    fn groups_by_category_without_zero_filling() {
        let items = vec![
            item(BudgetCategory::Material, 5_000.0, 0.0, 2_000.0),
            item(BudgetCategory::Material, 1_000.0, 0.0, 1_500.0),
            item(BudgetCategory::Overhead, 700.0, 0.0, 0.0),
        ];

        let summary = aggregate_budget(&items);

        assert_eq!(summary.by_category.len(), 2);
        assert!(!summary.by_category.contains_key(&BudgetCategory::Labor));

        let material = summary.by_category[&BudgetCategory::Material];
        assert_eq!(material.budgeted, 6_000.0);
        assert_eq!(material.spent, 3_500.0);
        assert_eq!(material.variance, 2_500.0);

        let overhead = summary.by_category[&BudgetCategory::Overhead];
        assert_eq!(overhead.variance, 700.0);
    }

    #[test]
    fn empty_budget_is_all_zero() {
        let summary = aggregate_budget(&[]);

        assert_eq!(summary.totals, BudgetTotals::default());
        assert!(summary.by_category.is_empty());
    }

    #[test]
    fn overcommitted_budget_reports_negative_availability() {
        let items = vec![item(BudgetCategory::Equipment, 1_000.0, 800.0, 500.0)];

        assert_eq!(aggregate_budget(&items).totals.available, -300.0);
    }

    #[test]
    fn total_adds_contingency_on_top_of_line_items() {
        let items = vec![
            item(BudgetCategory::Material, 60_000.0, 0.0, 0.0),
            item(BudgetCategory::Labor, 40_000.0, 0.0, 0.0),
        ];

        let total = budget_total(&items, 10.0);

        assert_eq!(total.subtotal, 100_000.0);
        assert_eq!(total.contingency_amount, 10_000.0);
        assert_eq!(total.total, 110_000.0);
        assert_eq!(budget_total(&items, 0.0).total, 100_000.0);
    }

    #[test]
    fn category_keys_serialize_as_names() {
        let items = vec![item(BudgetCategory::Subcontractor, 10.0, 0.0, 4.0)];
        let json = serde_json::to_value(aggregate_budget(&items)).unwrap();

        assert_eq!(json["by_category"]["subcontractor"]["variance"], 6.0);
    }
}
