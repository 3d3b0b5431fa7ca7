//! Behavioural properties of the cost engine, exercised through the public API.

use chrono::{TimeZone, Utc};
use sitecost_backend::cost::{
    self, aggregate_budget, change_order_amount, cumulative_budget_impact,
    cumulative_schedule_impact, linear_forecast, overall_impact_severity, revised_contract_amount,
    run_evm, Severity,
};
use sitecost_backend::domain::{
    BudgetCategory, BudgetLineItem, ChangeOrderInput, ChangeOrderItemType, ChangeOrderLineItem,
    ChangeOrderStatus,
};

fn line(category: BudgetCategory, budgeted: f64, allocated: f64, committed: f64, spent: f64) -> BudgetLineItem {
    BudgetLineItem {
        allocated_amount: allocated,
        committed_amount: committed,
        spent_amount: spent,
        ..BudgetLineItem::new(category, budgeted)
    }
}

fn change(status: ChangeOrderStatus, amount: f64, days: i64) -> ChangeOrderInput {
    ChangeOrderInput {
        status,
        schedule_impact_days: days,
        line_items: vec![ChangeOrderLineItem::new(ChangeOrderItemType::Labor, 1.0, amount)],
        ..Default::default()
    }
}

#[test]
fn available_is_budget_minus_every_draw() {
    let items = [
        line(BudgetCategory::Labor, 1000.0, 200.5, 100.25, 50.125),
        line(BudgetCategory::Material, 0.0, 10.0, 0.0, 0.0),
        line(BudgetCategory::Equipment, 333.33, 111.11, 111.11, 111.11),
    ];

    for item in &items {
        let expected = item.budgeted_amount
            - item.allocated_amount
            - item.committed_amount
            - item.spent_amount;
        assert!((item.available() - expected).abs() < 1e-9);
    }
    assert_eq!(items[0].available(), 649.125);
    assert_eq!(items[1].available(), -10.0);
}

#[test]
fn evm_variances_hold_by_construction() {
    let cases = [
        (250_000.0, 50.0, 40.0, 120_000.0),
        (1_000.0, 0.0, 0.0, 0.0),
        (80_000.0, 100.0, 110.0, 95_500.5),
        (0.0, 50.0, 50.0, 100.0),
    ];

    for (bac, planned, actual, ac) in cases {
        let snap = run_evm(bac, actual, planned, ac);
        assert_eq!(snap.cost_variance, snap.earned_value - snap.actual_cost);
        assert_eq!(snap.schedule_variance, snap.earned_value - snap.planned_value);
    }
}

#[test]
fn evm_degrades_to_zero_without_budget() {
    let snap = run_evm(0.0, 50.0, 50.0, 100.0);

    assert_eq!(snap.cost_performance_index, 0.0);
    assert_eq!(snap.schedule_performance_index, 0.0);
    assert_eq!(snap.estimate_at_completion, 0.0);
    assert!(snap.to_complete_performance_index.is_finite());
}

#[test]
fn change_order_amount_sums_quantity_times_rate() {
    let items = [
        ChangeOrderLineItem::new(ChangeOrderItemType::Material, 10.0, 100.0),
        ChangeOrderLineItem::new(ChangeOrderItemType::Labor, 2.0, 50.0),
    ];

    let amount = change_order_amount(&items);

    assert_eq!(amount, 1100.0);
    assert_eq!(revised_contract_amount(50_000.0, amount), 51_100.0);
}

#[test]
fn severity_never_drops_as_impact_grows() {
    assert_eq!(overall_impact_severity(25_000.0, 100_000.0, 0), Severity::Critical);
    assert_eq!(overall_impact_severity(8_000.0, 100_000.0, 0), Severity::Medium);
    assert_eq!(overall_impact_severity(-25_000.0, 100_000.0, 0), Severity::Critical);

    let mut previous = Severity::Low;
    for step in 0..=60 {
        let severity = overall_impact_severity(f64::from(step) * 500.0, 100_000.0, 0);
        assert!(severity >= previous, "amount step {step} dropped severity");
        previous = severity;
    }

    let mut previous = Severity::Low;
    for days in 0..=60 {
        let severity = overall_impact_severity(0.0, 100_000.0, -days);
        assert!(severity >= previous, "{days} days dropped severity");
        previous = severity;
    }
}

#[test]
fn only_approved_and_implemented_orders_move_the_baseline() {
    let changes = [
        change(ChangeOrderStatus::Draft, 500.0, 3),
        change(ChangeOrderStatus::Approved, 1000.0, 5),
        change(ChangeOrderStatus::Rejected, 2000.0, 40),
        change(ChangeOrderStatus::Implemented, 300.0, 2),
    ];

    let budget = cumulative_budget_impact(&changes, 10_000.0);
    assert_eq!(budget.total_impact, 1300.0);
    assert_eq!(budget.revised_budget, 11_300.0);
    assert_eq!(budget.impact_percentage, 13.0);
    assert_eq!(budget.approved_count, 2);

    let end = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    let schedule = cumulative_schedule_impact(&changes, Some(end));
    assert_eq!(schedule.total_days, 7);
    assert_eq!(
        schedule.revised_end_date,
        Some(Utc.with_ymd_and_hms(2026, 6, 8, 0, 0, 0).unwrap())
    );
}

#[test]
fn linear_forecast_is_zero_before_work_starts() {
    let forecast = linear_forecast(0.0, 500.0);

    assert_eq!(forecast, 0.0);
    assert!(forecast.is_finite());
}

#[test]
fn repeated_calls_are_bit_identical() {
    let items = [
        line(BudgetCategory::Labor, 40_000.0, 5_000.0, 2_500.0, 30_100.1),
        line(BudgetCategory::Material, 60_000.0, 0.0, 12_000.0, 18_333.7),
        line(BudgetCategory::Labor, 7_500.0, 0.0, 0.0, 2_000.0),
    ];
    let changes = [
        change(ChangeOrderStatus::Approved, 1_234.56, 4),
        change(ChangeOrderStatus::UnderReview, 999.0, 1),
    ];

    assert_eq!(aggregate_budget(&items), aggregate_budget(&items));
    assert_eq!(
        run_evm(107_500.0, 42.0, 50.0, 50_433.8).cost_performance_index.to_bits(),
        run_evm(107_500.0, 42.0, 50.0, 50_433.8).cost_performance_index.to_bits()
    );
    assert_eq!(
        cost::cash_flow_projection(&items, 7),
        cost::cash_flow_projection(&items, 7)
    );
    assert_eq!(
        cumulative_budget_impact(&changes, 107_500.0),
        cumulative_budget_impact(&changes, 107_500.0)
    );
}
