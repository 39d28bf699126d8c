use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::engine::selector::{self, SelectionParams};
use crate::error::AppError;
use crate::geo::{self, REASSIGN_THRESHOLD_KM};
use crate::models::assignment::{CacheEntry, Decision};
use crate::models::station::{GeoPoint, Station};
use crate::state::AppState;

/// Resolve the pickup station for a (worker, request) pair, reusing the
/// previous selection while the worker stays within the reassignment
/// threshold. The DashMap entry guard is held across the whole call, so
/// concurrent calls for the same pair cannot both create a valid entry.
pub fn get_or_assign(
    state: &AppState,
    worker_id: Uuid,
    request_id: Uuid,
    location: GeoPoint,
    params: &SelectionParams,
) -> Result<Decision, AppError> {
    let mut slot = state.cache.entry((worker_id, request_id)).or_default();

    if let Some(entry) = slot.iter_mut().find(|e| e.valid) {
        let moved_km = geo::distance_km(entry.worker_location, location)?;

        if moved_km <= REASSIGN_THRESHOLD_KM {
            state
                .metrics
                .cache_lookups_total
                .with_label_values(&["hit"])
                .inc();
            return Ok(cached_decision(entry));
        }

        entry.valid = false;
        entry.invalidated_at = Some(Utc::now());
        state
            .metrics
            .cache_lookups_total
            .with_label_values(&["invalidated"])
            .inc();
        info!(
            %worker_id,
            %request_id,
            moved_km,
            station_id = %entry.station_id,
            "worker moved beyond threshold; invalidating cached station"
        );
    } else {
        state
            .metrics
            .cache_lookups_total
            .with_label_values(&["miss"])
            .inc();
    }

    let stations: Vec<Station> = state.stations.iter().map(|e| e.value().clone()).collect();
    let decision = selector::select_station(stations, location, params)?;

    slot.push(CacheEntry {
        worker_id,
        request_id,
        station_id: decision.station_id,
        station_name: decision.station_name.clone(),
        worker_location: location,
        distance_km: decision.distance_km,
        criteria: decision.criteria,
        valid: true,
        created_at: Utc::now(),
        invalidated_at: None,
    });

    // The request record tracks its assigned station for downstream reads.
    if let Some(mut order) = state.orders.get_mut(&request_id) {
        order.assigned_station = Some(decision.station_id);
    }

    info!(
        %worker_id,
        %request_id,
        station_id = %decision.station_id,
        criteria = ?decision.criteria,
        "station assigned"
    );

    Ok(decision)
}

fn cached_decision(entry: &CacheEntry) -> Decision {
    Decision {
        station_id: entry.station_id,
        station_name: entry.station_name.clone(),
        distance_km: entry.distance_km,
        criteria: entry.criteria,
        cod_fallback: false,
        note: None,
        alternatives: Vec::new(),
        cached: true,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use uuid::Uuid;

    use super::get_or_assign;
    use crate::engine::selector::SelectionParams;
    use crate::models::order::FuelType;
    use crate::models::station::{CodProfile, GeoPoint, Station};
    use crate::state::AppState;

    const WORKER_ID: Uuid = Uuid::from_u128(7);
    const REQUEST_ID: Uuid = Uuid::from_u128(8);

    fn add_station(state: &AppState, name: &str, location: GeoPoint) -> Uuid {
        let id = Uuid::new_v4();
        state.stations.insert(
            id,
            Station {
                id,
                name: name.to_string(),
                location: Some(location),
                is_open: true,
                is_verified: true,
                cod: CodProfile {
                    supported: false,
                    trusted: false,
                    current_balance: 0,
                    balance_limit: 0,
                },
                stock: HashMap::from([(FuelType::Petrol, 500.0)]),
                updated_at: Utc::now(),
            },
        );
        id
    }

    fn params() -> SelectionParams {
        SelectionParams {
            fuel: FuelType::Petrol,
            quantity: 10.0,
            is_cod: false,
            max_radius_km: 10.0,
            fallback_to_prepaid: false,
        }
    }

    #[test]
    fn small_moves_return_the_cached_station() {
        let state = AppState::new();
        let origin = GeoPoint { lat: 28.6139, lng: 77.2090 };
        let station_id = add_station(&state, "pump-a", GeoPoint { lat: 28.6150, lng: 77.2090 });

        let first = get_or_assign(&state, WORKER_ID, REQUEST_ID, origin, &params()).unwrap();
        assert_eq!(first.station_id, station_id);
        assert!(!first.cached);

        // ~0.11 km of GPS jitter.
        let nearby = GeoPoint { lat: 28.6149, lng: 77.2090 };
        let second = get_or_assign(&state, WORKER_ID, REQUEST_ID, nearby, &params()).unwrap();
        assert_eq!(second.station_id, station_id);
        assert!(second.cached);
    }

    #[test]
    fn moving_past_the_threshold_invalidates_and_reselects() {
        let state = AppState::new();
        let origin = GeoPoint { lat: 28.6139, lng: 77.2090 };
        let near_origin = add_station(&state, "pump-a", GeoPoint { lat: 28.6150, lng: 77.2090 });
        let far_north = add_station(&state, "pump-b", GeoPoint { lat: 28.6750, lng: 77.2090 });

        let first = get_or_assign(&state, WORKER_ID, REQUEST_ID, origin, &params()).unwrap();
        assert_eq!(first.station_id, near_origin);

        // ~6.8 km north: past the 0.5 km threshold, nearer to pump-b.
        let moved = GeoPoint { lat: 28.6750, lng: 77.2090 };
        let second = get_or_assign(&state, WORKER_ID, REQUEST_ID, moved, &params()).unwrap();
        assert_eq!(second.station_id, far_north);
        assert!(!second.cached);

        let slot = state.cache.get(&(WORKER_ID, REQUEST_ID)).unwrap();
        assert_eq!(slot.len(), 2);
        assert_eq!(slot.iter().filter(|e| e.valid).count(), 1);
        assert!(!slot[0].valid);
        assert!(slot[0].invalidated_at.is_some());
    }

    #[test]
    fn fresh_assignment_updates_the_request_record() {
        let state = AppState::new();
        let origin = GeoPoint { lat: 28.6139, lng: 77.2090 };
        let station_id = add_station(&state, "pump-a", GeoPoint { lat: 28.6150, lng: 77.2090 });

        let order_id = REQUEST_ID;
        state.orders.insert(
            order_id,
            crate::models::order::Order {
                id: order_id,
                customer_id: Uuid::new_v4(),
                service: crate::models::order::ServiceType::Petrol,
                quantity_litres: 10.0,
                price_per_litre: 100.0,
                is_cod: false,
                amount: 1_000,
                payment_state: crate::models::order::PaymentState::Prepaid,
                status: crate::models::order::OrderStatus::Pending,
                assigned_station: None,
                assigned_worker: None,
                created_at: Utc::now(),
            },
        );

        get_or_assign(&state, WORKER_ID, order_id, origin, &params()).unwrap();
        assert_eq!(
            state.orders.get(&order_id).unwrap().assigned_station,
            Some(station_id)
        );
    }

    #[test]
    fn selection_failure_leaves_no_valid_entry() {
        let state = AppState::new();
        let origin = GeoPoint { lat: 28.6139, lng: 77.2090 };

        let err = get_or_assign(&state, WORKER_ID, REQUEST_ID, origin, &params());
        assert!(err.is_err());

        let slot = state.cache.get(&(WORKER_ID, REQUEST_ID)).unwrap();
        assert!(slot.iter().all(|e| !e.valid));
    }
}
