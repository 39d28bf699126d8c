use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::config::{CodConfig, PlatformConfig, WorkerPayConfig};
use crate::engine::{cod, settlement};
use crate::error::AppError;
use crate::models::order::{OrderStatus, PaymentState};
use crate::models::settlement::{Settlement, SettlementInput, SettlementOverrides};
use crate::models::trust::{CodOutcome, TrustRecord};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settlements/preview", post(preview_settlement))
        .route("/orders/:id/settlement", post(settle_order))
}

#[derive(Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub input: SettlementInput,
    pub worker_config: Option<WorkerPayConfig>,
    pub platform_config: Option<PlatformConfig>,
}

/// Read path: compute a settlement without persisting anything. Used to
/// preview a bill or replay a historical one from recorded components.
async fn preview_settlement(
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<Settlement>, AppError> {
    let worker_cfg = payload.worker_config.unwrap_or_default();
    let platform_cfg = payload.platform_config.unwrap_or_default();

    let settlement = settlement::calculate(&payload.input, &worker_cfg, &platform_cfg)?;
    Ok(Json(settlement))
}

#[derive(Deserialize)]
pub struct SettleOrderRequest {
    pub distance_km: f64,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default)]
    pub waiting_minutes: u32,
    #[serde(default)]
    pub completed_deliveries: u32,
    #[serde(default)]
    pub penalties: i64,
    #[serde(default)]
    pub overrides: SettlementOverrides,
    pub worker_config: Option<WorkerPayConfig>,
    pub platform_config: Option<PlatformConfig>,
}

/// Completion path: settle an order exactly once, decrement station stock,
/// and roll COD state forward. The ledger entry is append-only; a second
/// call for the same order is a conflict.
async fn settle_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<SettleOrderRequest>,
) -> Result<Json<Settlement>, AppError> {
    // Taking the ledger entry up front makes the once-only guard a
    // write-time invariant rather than a racy pre-check.
    let ledger_slot = match state.settlements.entry(order_id) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!(
                "order {order_id} is already settled"
            )));
        }
        Entry::Vacant(slot) => slot,
    };

    let order = state
        .orders
        .get(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?
        .value()
        .clone();

    if order.status == OrderStatus::Cancelled {
        return Err(AppError::Conflict(format!("order {order_id} was cancelled")));
    }

    let input = SettlementInput {
        order_id,
        service: order.service,
        litres: order.quantity_litres,
        price_per_litre: order.price_per_litre,
        distance_km: payload.distance_km,
        completed_at: Utc::now(),
        emergency: payload.emergency,
        waiting_minutes: payload.waiting_minutes,
        completed_deliveries: payload.completed_deliveries,
        penalties: payload.penalties,
        overrides: payload.overrides,
    };

    let worker_cfg = payload.worker_config.unwrap_or_default();
    let platform_cfg = payload.platform_config.unwrap_or_default();
    let settlement = settlement::calculate(&input, &worker_cfg, &platform_cfg)?;

    // Fuel leaves the station's tank at completion.
    if let Some(fuel) = order.service.fuel() {
        let station_id = order.assigned_station.ok_or_else(|| {
            AppError::BadRequest(format!("order {order_id} has no assigned station"))
        })?;
        let mut station = state
            .stations
            .get_mut(&station_id)
            .ok_or_else(|| AppError::NotFound(format!("station {station_id} not found")))?;

        let on_hand = station.available_stock(fuel);
        if on_hand < order.quantity_litres {
            return Err(AppError::OutOfStock { fuel, quantity: order.quantity_litres });
        }
        station.stock.insert(fuel, on_hand - order.quantity_litres);
        station.updated_at = Utc::now();
    }

    if let Some(mut stored) = state.orders.get_mut(&order_id) {
        stored.status = OrderStatus::Completed;
        stored.amount = settlement.customer.total;
        if stored.is_cod {
            stored.payment_state = PaymentState::PendingCollection;
        }
    }

    if order.is_cod {
        if let Some(station_id) = order.assigned_station {
            cod::recompute_cod_balance(&state, station_id);
        }

        let mut record = state
            .trust
            .entry(order.customer_id)
            .or_insert_with(|| TrustRecord::new(order.customer_id));
        cod::apply_outcome(&mut record, &CodOutcome::Success, Utc::now(), &CodConfig::default());
    }

    let kind = if order.service.fuel().is_some() { "fuel" } else { "service" };
    state
        .metrics
        .settlements_total
        .with_label_values(&[kind])
        .inc();

    info!(
        %order_id,
        customer_total = settlement.customer.total,
        worker_payout = settlement.worker.total,
        platform_profit = settlement.platform_profit,
        "order settled"
    );

    ledger_slot.insert(settlement.clone());
    Ok(Json(settlement))
}
