use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::station::{CodRejection, GeoPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionCriteria {
    Nearest,
    CodSupported,
    CodFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub station_id: Uuid,
    pub name: String,
    /// None when the station row carries no coordinates.
    pub distance_km: Option<f64>,
}

/// Per-station reason a COD order could not be placed there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodRejectionDetail {
    pub station_id: Uuid,
    pub name: String,
    pub reason: CodRejection,
}

/// The outcome of a pickup-station selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub station_id: Uuid,
    pub station_name: String,
    pub distance_km: Option<f64>,
    pub criteria: SelectionCriteria,
    pub cod_fallback: bool,
    pub note: Option<String>,
    pub alternatives: Vec<Candidate>,
    pub cached: bool,
}

/// One selection pinned to a (worker, request) pair. Invalidated, never
/// deleted, so the history of reassignments stays auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub worker_id: Uuid,
    pub request_id: Uuid,
    pub station_id: Uuid,
    pub station_name: String,
    pub worker_location: GeoPoint,
    pub distance_km: Option<f64>,
    pub criteria: SelectionCriteria,
    pub valid: bool,
    pub created_at: DateTime<Utc>,
    pub invalidated_at: Option<DateTime<Utc>>,
}
