use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::assignment::{Candidate, CodRejectionDetail};
use crate::models::order::FuelType;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("no station can fulfil {quantity} L of {fuel:?}")]
    OutOfStock { fuel: FuelType, quantity: f64 },

    #[error("no station within {max_radius_km} km")]
    NoStationInRadius { max_radius_km: f64 },

    #[error("no COD-capable station available")]
    NoCodStation {
        rejections: Vec<CodRejectionDetail>,
        fallback: Option<Candidate>,
    },

    #[error("settlement does not balance: payouts {payouts} vs customer total {customer_total}")]
    UnbalancedSettlement { payouts: i64, customer_total: i64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::OutOfStock { .. }
            | AppError::NoStationInRadius { .. }
            | AppError::NoCodStation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnbalancedSettlement { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            AppError::OutOfStock { .. } => json!({
                "error": self.to_string(),
                "reason": "out_of_stock",
            }),
            AppError::NoStationInRadius { .. } => json!({
                "error": self.to_string(),
                "reason": "no_station_in_radius",
            }),
            AppError::NoCodStation { rejections, fallback } => json!({
                "error": self.to_string(),
                "reason": "no_cod_station",
                "rejections": rejections,
                "fallback": fallback,
            }),
            AppError::UnbalancedSettlement { .. } => json!({
                "error": self.to_string(),
                "reason": "settlement_unbalanced",
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
