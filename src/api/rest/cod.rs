use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::CodConfig;
use crate::engine::cod::{self, StationContext};
use crate::engine::selector::DEFAULT_MAX_RADIUS_KM;
use crate::error::AppError;
use crate::geo;
use crate::models::order::{OrderStatus, PaymentState};
use crate::models::station::{GeoPoint, Station};
use crate::models::trust::{CodDecision, CodOutcome, TrustRecord};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cod/eligibility", post(check_eligibility))
        .route("/cod/failures", post(report_failure))
        .route("/cod/collections", post(collect_cash))
}

#[derive(Deserialize)]
pub struct EligibilityRequest {
    pub customer_id: Uuid,
    pub order_amount: i64,
    /// Evaluate a specific station's COD capacity...
    pub station_id: Option<Uuid>,
    /// ...or probe whether any COD-capable station serves this point.
    pub location: Option<GeoPoint>,
    pub max_radius_km: Option<f64>,
    #[serde(default)]
    pub config: Option<CodConfig>,
}

async fn check_eligibility(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EligibilityRequest>,
) -> Result<Json<CodDecision>, AppError> {
    let record = state
        .trust
        .get(&payload.customer_id)
        .map(|r| r.value().clone())
        .unwrap_or_else(|| TrustRecord::new(payload.customer_id));
    let cfg = payload.config.unwrap_or_default();

    let decision = match (payload.station_id, payload.location) {
        (Some(station_id), _) => {
            // The stored balance is derived; refresh it rather than trusting
            // a stale field.
            cod::recompute_cod_balance(&state, station_id);
            let station = state.stations.get(&station_id);
            let ctx = match station.as_deref() {
                Some(s) => StationContext::Station(s),
                None => StationContext::Missing,
            };
            cod::check_eligibility(&record, payload.order_amount, Utc::now(), &cfg, true, ctx)
        }
        (None, Some(point)) => {
            let in_range = stations_in_range(
                &state,
                point,
                payload.max_radius_km.unwrap_or(DEFAULT_MAX_RADIUS_KM),
            )?;
            let supported = cod::location_supports_cod(&in_range);
            cod::check_eligibility(
                &record,
                payload.order_amount,
                Utc::now(),
                &cfg,
                supported,
                StationContext::NotApplicable,
            )
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "either station_id or location is required".to_string(),
            ));
        }
    };

    let result = if decision.allowed { "allowed" } else { "denied" };
    state
        .metrics
        .cod_checks_total
        .with_label_values(&[result])
        .inc();

    Ok(Json(decision))
}

/// Stations reachable from a point. Coordinate-less rows count as in range;
/// legacy data must not make a whole area look COD-free.
fn stations_in_range(
    state: &AppState,
    point: GeoPoint,
    max_radius_km: f64,
) -> Result<Vec<Station>, AppError> {
    let mut in_range = Vec::new();
    for entry in state.stations.iter() {
        let station = entry.value();
        match station.location {
            Some(loc) => {
                if geo::distance_km(point, loc)? <= max_radius_km {
                    in_range.push(station.clone());
                }
            }
            None => in_range.push(station.clone()),
        }
    }
    Ok(in_range)
}

#[derive(Deserialize)]
pub struct FailureRequest {
    pub order_id: Uuid,
    pub reason: String,
    #[serde(default)]
    pub config: Option<CodConfig>,
}

async fn report_failure(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FailureRequest>,
) -> Result<Json<TrustRecord>, AppError> {
    let cfg = payload.config.unwrap_or_default();

    let (customer_id, station_id) = {
        let mut order = state
            .orders
            .get_mut(&payload.order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", payload.order_id)))?;
        if !order.is_cod {
            return Err(AppError::BadRequest(format!(
                "order {} is not cash-on-delivery",
                payload.order_id
            )));
        }

        order.status = OrderStatus::Cancelled;
        order.payment_state = PaymentState::Cancelled;
        (order.customer_id, order.assigned_station)
    };

    let outcome = CodOutcome::Failure { reason: payload.reason };
    let mut record = state
        .trust
        .entry(customer_id)
        .or_insert_with(|| TrustRecord::new(customer_id));
    cod::apply_outcome(&mut record, &outcome, Utc::now(), &cfg);
    let updated = record.clone();
    drop(record);

    if let Some(station_id) = station_id {
        cod::recompute_cod_balance(&state, station_id);
    }

    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct CollectionRequest {
    pub order_id: Uuid,
}

/// Administrative collection of floater cash a worker took at delivery.
/// Clears the order out of the station's COD exposure.
async fn collect_cash(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CollectionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let station_id = {
        let mut order = state
            .orders
            .get_mut(&payload.order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", payload.order_id)))?;
        if order.payment_state != PaymentState::PendingCollection {
            return Err(AppError::Conflict(format!(
                "order {} has no cash pending collection",
                payload.order_id
            )));
        }

        order.payment_state = PaymentState::Collected;
        order.assigned_station
    };

    let balance = station_id.map(|id| cod::recompute_cod_balance(&state, id));

    Ok(Json(serde_json::json!({
        "order_id": payload.order_id,
        "payment_state": "collected",
        "station_cod_balance": balance,
    })))
}
