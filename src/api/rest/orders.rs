use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{Order, OrderStatus, PaymentState, ServiceType};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub service: ServiceType,
    #[serde(default)]
    pub quantity_litres: f64,
    #[serde(default)]
    pub price_per_litre: f64,
    #[serde(default)]
    pub is_cod: bool,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    if payload.service.fuel().is_some()
        && (!payload.quantity_litres.is_finite() || payload.quantity_litres <= 0.0)
    {
        return Err(AppError::BadRequest(
            "fuel orders need a positive quantity in litres".to_string(),
        ));
    }
    if !payload.price_per_litre.is_finite() || payload.price_per_litre < 0.0 {
        return Err(AppError::BadRequest("price must be non-negative".to_string()));
    }

    let amount = (payload.quantity_litres * payload.price_per_litre).round() as i64;
    let order = Order {
        id: Uuid::new_v4(),
        customer_id: payload.customer_id,
        service: payload.service,
        quantity_litres: payload.quantity_litres,
        price_per_litre: payload.price_per_litre,
        is_cod: payload.is_cod,
        amount,
        payment_state: PaymentState::Prepaid,
        status: OrderStatus::Pending,
        assigned_station: None,
        assigned_worker: None,
        created_at: Utc::now(),
    };

    state.orders.insert(order.id, order.clone());
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order.value().clone()))
}
