//! Record store
//!
//! Loads and saves budgets and change orders with their line items. Line
//! items keep their insertion order through a `position` column. Nothing is
//! derived here; callers run the cost engine on what comes back.

pub mod budgets;
pub mod change_orders;

pub use budgets::*;
pub use change_orders::*;

/// One page of records plus the total count across all pages.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
