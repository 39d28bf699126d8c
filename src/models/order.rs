use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Petrol,
    Diesel,
    Cng,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Petrol,
    Diesel,
    Cng,
    Mechanic,
    Crane,
}

impl ServiceType {
    /// Fuel deliveries need a pickup station; mechanic/crane work does not.
    pub fn fuel(self) -> Option<FuelType> {
        match self {
            ServiceType::Petrol => Some(FuelType::Petrol),
            ServiceType::Diesel => Some(FuelType::Diesel),
            ServiceType::Cng => Some(FuelType::Cng),
            ServiceType::Mechanic | ServiceType::Crane => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Assigned,
    InTransit,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Prepaid,
    /// COD amount handed to the worker but not yet collected by the platform.
    PendingCollection,
    Collected,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service: ServiceType,
    pub quantity_litres: f64,
    pub price_per_litre: f64,
    pub is_cod: bool,
    /// Billable amount used for COD exposure accounting.
    pub amount: i64,
    pub payment_state: PaymentState,
    pub status: OrderStatus,
    pub assigned_station: Option<Uuid>,
    pub assigned_worker: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
