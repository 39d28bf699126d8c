use std::env;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

/// Platform-wide pricing knobs. Sourced fresh by the caller per invocation;
/// the engine never caches one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub base_delivery_fee: i64,
    pub small_order_surcharge: i64,
    pub small_order_litres: f64,
    pub platform_fee_rate: f64,
    pub base_booking_fee: i64,
    pub min_platform_margin: i64,
    pub night_start_hour: u32,
    pub night_end_hour: u32,
    pub night_multiplier: f64,
    pub rain_multiplier: f64,
    pub emergency_multiplier: f64,
    pub rain_mode: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_delivery_fee: 80,
            small_order_surcharge: 35,
            small_order_litres: 5.0,
            platform_fee_rate: 0.05,
            base_booking_fee: 150,
            min_platform_margin: 15,
            night_start_hour: 21,
            night_end_hour: 6,
            night_multiplier: 0.5,
            rain_multiplier: 0.3,
            emergency_multiplier: 0.5,
            rain_mode: false,
        }
    }
}

/// Worker compensation rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPayConfig {
    pub base_pay: i64,
    pub per_km_rate: f64,
    /// Fraction of the surge fee passed through to the worker.
    pub surge_share: f64,
    pub free_waiting_minutes: u32,
    pub waiting_rate_per_minute: i64,
    /// Every Nth completed delivery earns the incentive bonus. 0 disables it.
    pub incentive_every: u32,
    pub incentive_bonus: i64,
    pub long_distance_km: f64,
    pub long_distance_bonus: i64,
    pub peak_hour_bonus: i64,
    pub min_guaranteed_pay: i64,
}

impl Default for WorkerPayConfig {
    fn default() -> Self {
        Self {
            base_pay: 50,
            per_km_rate: 10.0,
            surge_share: 0.6,
            free_waiting_minutes: 10,
            waiting_rate_per_minute: 2,
            incentive_every: 10,
            incentive_bonus: 100,
            long_distance_km: 15.0,
            long_distance_bonus: 50,
            peak_hour_bonus: 30,
            min_guaranteed_pay: 60,
        }
    }
}

/// Cash-on-delivery risk controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodConfig {
    pub trust_threshold: i64,
    pub max_failures: u32,
    pub disable_days: i64,
    /// Global per-order COD ceiling.
    pub per_order_limit: i64,
    pub success_reward: i64,
    pub failure_penalty: i64,
}

impl Default for CodConfig {
    fn default() -> Self {
        Self {
            trust_threshold: 30,
            max_failures: 3,
            disable_days: 7,
            per_order_limit: 5000,
            success_reward: 5,
            failure_penalty: 10,
        }
    }
}
