use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::selector::{self, SelectionParams, DEFAULT_MAX_RADIUS_KM};
use crate::engine::cache;
use crate::error::AppError;
use crate::models::assignment::{Candidate, Decision};
use crate::models::order::FuelType;
use crate::models::station::{GeoPoint, Station};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assignments", post(assign_station))
        .route("/stations/alternatives", get(get_alternatives))
}

#[derive(Deserialize)]
pub struct AssignStationRequest {
    pub worker_id: Uuid,
    pub request_id: Uuid,
    pub location: GeoPoint,
    pub fuel: FuelType,
    pub quantity: f64,
    #[serde(default)]
    pub is_cod: bool,
    pub max_radius_km: Option<f64>,
    #[serde(default)]
    pub fallback_to_prepaid: bool,
}

async fn assign_station(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AssignStationRequest>,
) -> Result<Json<Decision>, AppError> {
    let params = SelectionParams {
        fuel: payload.fuel,
        quantity: payload.quantity,
        is_cod: payload.is_cod,
        max_radius_km: payload.max_radius_km.unwrap_or(DEFAULT_MAX_RADIUS_KM),
        fallback_to_prepaid: payload.fallback_to_prepaid,
    };

    let start = Instant::now();
    let result = cache::get_or_assign(
        &state,
        payload.worker_id,
        payload.request_id,
        payload.location,
        &params,
    );

    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .assignment_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .assignments_total
        .with_label_values(&[outcome])
        .inc();

    result.map(Json)
}

#[derive(Deserialize)]
pub struct AlternativesQuery {
    pub lat: f64,
    pub lng: f64,
    pub fuel: FuelType,
    pub quantity: f64,
    pub exclude: Option<Uuid>,
    pub max_radius_km: Option<f64>,
    pub limit: Option<usize>,
}

async fn get_alternatives(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlternativesQuery>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    let origin = GeoPoint { lat: query.lat, lng: query.lng };
    let stations: Vec<Station> = state.stations.iter().map(|e| e.value().clone()).collect();

    let candidates = selector::alternatives(
        stations,
        origin,
        query.fuel,
        query.quantity,
        query.exclude,
        query.max_radius_km.unwrap_or(DEFAULT_MAX_RADIUS_KM),
        query.limit.unwrap_or(5),
    )?;

    Ok(Json(candidates))
}
