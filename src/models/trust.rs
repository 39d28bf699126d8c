use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TRUST_SCORE: i64 = 50;
pub const TRUST_FLOOR: i64 = 0;
pub const TRUST_CEILING: i64 = 100;

/// Stable, user-facing COD rejection codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodReason {
    TrustScoreLow,
    CodDisabled,
    CodDisabledUntil,
    CodFailLimit,
    OrderAmountTooHigh,
    LocationNotSupported,
    StationNotFound,
    StationCodNotSupported,
    FuelStationCodLimitExceeded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CodReason>,
}

impl CodDecision {
    pub fn allow() -> Self {
        Self { allowed: true, reason: None }
    }

    pub fn deny(reason: CodReason) -> Self {
        Self { allowed: false, reason: Some(reason) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustRecord {
    pub customer_id: Uuid,
    pub trust_score: i64,
    pub success_count: u32,
    pub failure_count: u32,
    pub disabled: bool,
    pub disabled_until: Option<DateTime<Utc>>,
    pub last_failure_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TrustRecord {
    pub fn new(customer_id: Uuid) -> Self {
        Self {
            customer_id,
            trust_score: DEFAULT_TRUST_SCORE,
            success_count: 0,
            failure_count: 0,
            disabled: false,
            disabled_until: None,
            last_failure_reason: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CodOutcome {
    Success,
    Failure { reason: String },
}
