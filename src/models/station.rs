use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::FuelType;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Why a particular station cannot take a COD order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodRejection {
    NotSupported,
    NotTrusted,
    BalanceExceeded,
}

impl std::fmt::Display for CodRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodRejection::NotSupported => write!(f, "station does not support COD"),
            CodRejection::NotTrusted => write!(f, "station is not COD-trusted by the platform"),
            CodRejection::BalanceExceeded => write!(f, "station COD balance is at its limit"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodProfile {
    pub supported: bool,
    pub trusted: bool,
    /// Derived value: the sum of this station's COD orders pending
    /// collection. Recomputed after every COD-affecting transition.
    pub current_balance: i64,
    pub balance_limit: i64,
}

impl CodProfile {
    pub fn status(&self) -> Result<(), CodRejection> {
        if !self.supported {
            return Err(CodRejection::NotSupported);
        }
        if !self.trusted {
            return Err(CodRejection::NotTrusted);
        }
        if self.current_balance >= self.balance_limit {
            return Err(CodRejection::BalanceExceeded);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: Uuid,
    pub name: String,
    /// Legacy rows may lack coordinates; the selector degrades rather
    /// than rejecting them.
    pub location: Option<GeoPoint>,
    pub is_open: bool,
    pub is_verified: bool,
    pub cod: CodProfile,
    /// Litres on hand per fuel type.
    pub stock: HashMap<FuelType, f64>,
    pub updated_at: DateTime<Utc>,
}

impl Station {
    pub fn available_stock(&self, fuel: FuelType) -> f64 {
        self.stock.get(&fuel).copied().unwrap_or(0.0)
    }
}
