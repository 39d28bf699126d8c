use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::ServiceType;

/// What the customer is billed. All amounts in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerBill {
    pub fuel_cost: i64,
    pub delivery_fee: i64,
    pub platform_service_fee: i64,
    pub surge_fee: i64,
    pub surge_reasons: Vec<String>,
    pub small_order_surcharge: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPayout {
    pub base_pay: i64,
    pub distance_pay: i64,
    pub surge_share: i64,
    pub waiting_bonus: i64,
    pub incentive_bonus: i64,
    pub long_distance_bonus: i64,
    pub peak_hour_bonus: i64,
    pub penalties: i64,
    pub guarantee_top_up: i64,
    pub total: i64,
}

/// The final, immutable money split for a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub order_id: Uuid,
    pub service: ServiceType,
    pub customer: CustomerBill,
    pub fuel_station_payout: i64,
    pub worker: WorkerPayout,
    pub platform_profit: i64,
    pub calculated_at: DateTime<Utc>,
}

/// Everything the calculator needs about a completed order. Pure input;
/// the calculator performs no I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementInput {
    pub order_id: Uuid,
    pub service: ServiceType,
    pub litres: f64,
    pub price_per_litre: f64,
    pub distance_km: f64,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default)]
    pub waiting_minutes: u32,
    /// The worker's completed-delivery tally including this order, used
    /// for the every-Nth incentive.
    #[serde(default)]
    pub completed_deliveries: u32,
    #[serde(default)]
    pub penalties: i64,
    #[serde(default)]
    pub overrides: SettlementOverrides,
}

/// Recorded original components, supplied to replay a historical bill
/// exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementOverrides {
    pub delivery_fee: Option<i64>,
    pub platform_service_fee: Option<i64>,
    pub night: Option<bool>,
    pub rain: Option<bool>,
}
