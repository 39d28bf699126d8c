use dashmap::DashMap;
use uuid::Uuid;

use crate::models::assignment::CacheEntry;
use crate::models::order::Order;
use crate::models::settlement::Settlement;
use crate::models::station::Station;
use crate::models::trust::TrustRecord;
use crate::observability::metrics::Metrics;

/// In-process stand-in for the storage collaborator. DashMap gives the
/// per-key atomicity the engine's read-then-write steps rely on: stock
/// decrements and COD balance updates happen under the station's shard
/// lock, and cache slots are keyed per (worker, request).
pub struct AppState {
    pub stations: DashMap<Uuid, Station>,
    pub orders: DashMap<Uuid, Order>,
    /// Full entry history per (worker, request); at most one entry is valid.
    pub cache: DashMap<(Uuid, Uuid), Vec<CacheEntry>>,
    pub trust: DashMap<Uuid, TrustRecord>,
    /// Append-only ledger keyed by order id.
    pub settlements: DashMap<Uuid, Settlement>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            stations: DashMap::new(),
            orders: DashMap::new(),
            cache: DashMap::new(),
            trust: DashMap::new(),
            settlements: DashMap::new(),
            metrics: Metrics::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
