use anyhow::{Context, Result};
use std::env;

use crate::cost::DEFAULT_BLEND_WEIGHT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // HTTP
    pub request_body_limit_bytes: usize,

    // Cost reports
    pub forecast_blend_weight: f64,
    pub cash_flow_months: u32,
}

impl Settings {
    /// Longest cash-flow horizon a caller may request.
    pub const MAX_CASH_FLOW_MONTHS: u32 = 120;

    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS").unwrap_or(10);
        let run_migrations = parse_var("RUN_MIGRATIONS").unwrap_or(true);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_body_limit_bytes = parse_var("REQUEST_BODY_LIMIT_BYTES").unwrap_or(1024 * 1024); // 1 MiB

        // Cost reports
        let forecast_blend_weight = parse_var::<f64>("FORECAST_BLEND_WEIGHT")
            .filter(|w| w.is_finite())
            .map(|w| w.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_BLEND_WEIGHT);
        let cash_flow_months = parse_var::<u32>("CASH_FLOW_MONTHS")
            .map(|m| m.clamp(1, Self::MAX_CASH_FLOW_MONTHS))
            .unwrap_or(12);

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            run_migrations,
            cors_allow_origins,
            request_body_limit_bytes,
            forecast_blend_weight,
            cash_flow_months,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_names() {
        assert_eq!(Environment::from_str("production"), Environment::Prod);
        assert_eq!(Environment::from_str("PROD"), Environment::Prod);
        assert_eq!(Environment::from_str("staging"), Environment::Staging);
        assert_eq!(Environment::from_str("anything"), Environment::Dev);
        assert!(Environment::Dev.is_dev());
        assert!(Environment::Prod.is_prod());
    }
}
