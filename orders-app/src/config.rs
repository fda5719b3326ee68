//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use orders_types::FeeRate;

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub inventory_service_url: String,
    pub user_service_url: String,
    pub fee_rate: FeeRate,
    pub inventory_timeout: Duration,
    pub user_service_timeout: Duration,
    pub rate_limit_per_minute: u32,
    pub cors_allowed_origin: String,
    /// OTLP collector; spans are only exported when this is set
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let fee_bps: u32 = parse_or(&lookup, "ORDER_FEE_BPS", FeeRate::default().bps())?;
        let fee_rate = FeeRate::from_bps(fee_bps)
            .map_err(|e| anyhow::anyhow!("ORDER_FEE_BPS: {}", e))?;

        Ok(Self {
            port: parse_or(&lookup, "PORT", 3000)?,
            database_url,
            inventory_service_url: lookup("INVENTORY_SERVICE_URL")
                .unwrap_or_else(|| "http://localhost:8000".to_string()),
            user_service_url: lookup("USER_SERVICE_URL")
                .unwrap_or_else(|| "http://localhost:8002".to_string()),
            fee_rate,
            inventory_timeout: Duration::from_millis(parse_or(
                &lookup,
                "INVENTORY_TIMEOUT_MS",
                5000,
            )?),
            user_service_timeout: Duration::from_millis(parse_or(
                &lookup,
                "USER_SERVICE_TIMEOUT_MS",
                5000,
            )?),
            rate_limit_per_minute: parse_or(&lookup, "RATE_LIMIT_PER_MINUTE", 100)?,
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
        None => Ok(default),
    }
}
