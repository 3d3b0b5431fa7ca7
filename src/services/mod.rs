//! Service layer modules.
//!
//! The record store persists budgets and change orders in PostgreSQL and hands
//! typed records to the cost engine.

pub mod records;
