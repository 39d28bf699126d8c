use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::FuelType;
use crate::models::station::{CodProfile, GeoPoint, Station};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stations", post(register_station).get(list_stations))
        .route("/stations/:id/stock", patch(update_stock))
}

#[derive(Deserialize)]
pub struct RegisterStationRequest {
    pub name: String,
    pub location: Option<GeoPoint>,
    #[serde(default = "default_true")]
    pub is_open: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub cod_supported: bool,
    #[serde(default)]
    pub cod_trusted: bool,
    #[serde(default)]
    pub cod_balance_limit: i64,
    #[serde(default)]
    pub stock: HashMap<FuelType, f64>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct UpdateStockRequest {
    pub fuel: FuelType,
    pub litres: f64,
}

async fn register_station(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterStationRequest>,
) -> Result<Json<Station>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if let Some(point) = payload.location {
        if !point.lat.is_finite() || !point.lng.is_finite() {
            return Err(AppError::BadRequest("coordinates must be finite".to_string()));
        }
    }

    let station = Station {
        id: Uuid::new_v4(),
        name: payload.name,
        location: payload.location,
        is_open: payload.is_open,
        is_verified: payload.is_verified,
        cod: CodProfile {
            supported: payload.cod_supported,
            trusted: payload.cod_trusted,
            current_balance: 0,
            balance_limit: payload.cod_balance_limit,
        },
        stock: payload.stock,
        updated_at: Utc::now(),
    };

    state.stations.insert(station.id, station.clone());
    Ok(Json(station))
}

async fn list_stations(State(state): State<Arc<AppState>>) -> Json<Vec<Station>> {
    let stations = state
        .stations
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(stations)
}

async fn update_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStockRequest>,
) -> Result<Json<Station>, AppError> {
    if !payload.litres.is_finite() || payload.litres < 0.0 {
        return Err(AppError::BadRequest("litres must be non-negative".to_string()));
    }

    let mut station = state
        .stations
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("station {id} not found")))?;

    station.stock.insert(payload.fuel, payload.litres);
    station.updated_at = Utc::now();

    Ok(Json(station.clone()))
}
