//! Database connection pool management

use anyhow::{Context, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;

use crate::config::Settings;

/// Create a PostgreSQL connection pool
pub async fn create_pool(settings: &Settings) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(&settings.database_url)
        .context("Invalid DATABASE_URL")?
        .application_name("sitecost-backend");

    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to PostgreSQL")?;

    tracing::info!(
        max_connections = settings.database_max_connections,
        "Database connection pool established"
    );

    Ok(pool)
}

/// Apply pending schema migrations from `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations applied");
    Ok(())
}

/// Lightweight health check for database connectivity
pub async fn health_check(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}

/// NUMERIC column value as engine input; unreadable values become zero.
pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Largest magnitude a `NUMERIC(14, 2)` money column accepts after rounding.
pub const MAX_STORED_AMOUNT: f64 = 999_999_999_999.0;

/// Largest magnitude a `NUMERIC(14, 4)` quantity or rate column accepts after rounding.
pub const MAX_STORED_QUANTITY: f64 = 999_999_999.0;

/// Engine output as a NUMERIC(14, 2) column value, rounded to cents.
pub fn f64_to_decimal(value: f64) -> Result<Decimal, sqlx::Error> {
    to_column(value, MAX_STORED_AMOUNT, 2)
}

/// Quantities and rates keep four decimal places.
pub fn f64_to_decimal_precise(value: f64) -> Result<Decimal, sqlx::Error> {
    to_column(value, MAX_STORED_QUANTITY, 4)
}

fn to_column(value: f64, max: f64, dp: u32) -> Result<Decimal, sqlx::Error> {
    if !value.is_finite() || value.abs() > max {
        return Err(sqlx::Error::Encode(
            format!("{value} does not fit a NUMERIC column (limit {max})").into(),
        ));
    }

    Decimal::from_f64(value)
        .map(|d| d.round_dp(dp))
        .ok_or_else(|| sqlx::Error::Encode(format!("{value} is not representable").into()))
}
