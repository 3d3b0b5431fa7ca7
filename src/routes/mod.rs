pub mod budgets;
pub mod calculations;
pub mod change_orders;
pub mod health;
pub mod reports;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Stateless calculators
        .route(
            "/calculations/budget-summary",
            post(calculations::budget_summary),
        )
        .route("/calculations/evm", post(calculations::evm))
        .route("/calculations/forecast", post(calculations::forecast))
        .route(
            "/calculations/change-order-impact",
            post(calculations::change_order_impact),
        )
        .route(
            "/calculations/cumulative-impact",
            post(calculations::cumulative_impact),
        )
        // Budgets (nested under projects)
        .route(
            "/projects/:project_id/budgets",
            get(budgets::list_budgets).post(budgets::create_budget),
        )
        .route(
            "/projects/:project_id/budgets/:budget_id",
            get(budgets::get_budget)
                .put(budgets::update_budget)
                .delete(budgets::delete_budget),
        )
        .route(
            "/projects/:project_id/budgets/:budget_id/approve",
            post(budgets::approve_budget),
        )
        // Change orders (nested under projects)
        .route(
            "/projects/:project_id/change-orders",
            get(change_orders::list_change_orders).post(change_orders::create_change_order),
        )
        .route(
            "/projects/:project_id/change-orders/:change_order_id",
            get(change_orders::get_change_order)
                .put(change_orders::update_change_order)
                .delete(change_orders::delete_change_order),
        )
        .route(
            "/projects/:project_id/change-orders/:change_order_id/transition",
            post(change_orders::transition_change_order),
        )
        // Reports
        .route(
            "/projects/:project_id/cost-report",
            get(reports::cost_report),
        )
}
