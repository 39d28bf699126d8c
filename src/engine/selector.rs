use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::engine::catalog;
use crate::error::AppError;
use crate::geo;
use crate::models::assignment::{Candidate, CodRejectionDetail, Decision, SelectionCriteria};
use crate::models::order::FuelType;
use crate::models::station::{GeoPoint, Station};

pub const DEFAULT_MAX_RADIUS_KM: f64 = 10.0;
const MAX_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionParams {
    pub fuel: FuelType,
    pub quantity: f64,
    pub is_cod: bool,
    pub max_radius_km: f64,
    pub fallback_to_prepaid: bool,
}

/// Pick a pickup station for one request. Deterministic: candidates are
/// distance-sorted with a stable sort, so equal distances keep catalog
/// order and repeated calls with the same inputs agree.
pub fn select_station(
    all: Vec<Station>,
    worker: GeoPoint,
    params: &SelectionParams,
) -> Result<Decision, AppError> {
    geo::validate(worker)?;
    if !params.quantity.is_finite() || params.quantity <= 0.0 {
        return Err(AppError::BadRequest(format!(
            "quantity must be a positive number of litres, got {}",
            params.quantity
        )));
    }

    let pool = candidate_pool(catalog::candidates(all), worker, params.max_radius_km)?;
    if pool.is_empty() {
        return Err(AppError::NoStationInRadius { max_radius_km: params.max_radius_km });
    }

    let stocked: Vec<(Station, Option<f64>)> = pool
        .into_iter()
        .filter(|(s, _)| s.available_stock(params.fuel) >= params.quantity)
        .collect();
    if stocked.is_empty() {
        return Err(AppError::OutOfStock { fuel: params.fuel, quantity: params.quantity });
    }

    if params.is_cod {
        return select_cod(stocked, params);
    }

    Ok(decide(&stocked, 0, SelectionCriteria::Nearest, false, None))
}

fn select_cod(
    stocked: Vec<(Station, Option<f64>)>,
    params: &SelectionParams,
) -> Result<Decision, AppError> {
    let cod_ok: Vec<(Station, Option<f64>)> = stocked
        .iter()
        .filter(|(s, _)| s.cod.status().is_ok())
        .cloned()
        .collect();

    if !cod_ok.is_empty() {
        return Ok(decide(&cod_ok, 0, SelectionCriteria::CodSupported, false, None));
    }

    if params.fallback_to_prepaid {
        let note = "no COD-capable station in range; nearest stocked station \
                    assigned, order must be prepaid";
        return Ok(decide(
            &stocked,
            0,
            SelectionCriteria::CodFallback,
            true,
            Some(note.to_string()),
        ));
    }

    let rejections = stocked
        .iter()
        .filter_map(|(s, _)| {
            s.cod.status().err().map(|reason| CodRejectionDetail {
                station_id: s.id,
                name: s.name.clone(),
                reason,
            })
        })
        .collect();
    let fallback = stocked.first().map(|(s, d)| candidate(s, *d));

    Err(AppError::NoCodStation { rejections, fallback })
}

/// Stations eligible to serve a request, nearest first. Coordinate-less
/// rows are only used when nothing with coordinates is reachable; their
/// distance is reported as unknown.
fn candidate_pool(
    candidates: Vec<Station>,
    worker: GeoPoint,
    max_radius_km: f64,
) -> Result<Vec<(Station, Option<f64>)>, AppError> {
    let mut located = Vec::new();
    let mut unlocated = Vec::new();
    for station in candidates {
        match station.location {
            Some(point) => located.push((station, point)),
            None => unlocated.push(station),
        }
    }

    if located.is_empty() {
        if !unlocated.is_empty() {
            warn!(
                stations = unlocated.len(),
                "no station has coordinates; selecting without a radius filter"
            );
        }
        return Ok(unlocated.into_iter().map(|s| (s, None)).collect());
    }

    let sorted = geo::sort_by_distance(worker, located)?;
    let in_radius = geo::within_radius(sorted, max_radius_km);

    if in_radius.is_empty() && !unlocated.is_empty() {
        warn!(
            max_radius_km,
            "no station within radius; falling back to coordinate-less rows"
        );
        return Ok(unlocated.into_iter().map(|s| (s, None)).collect());
    }

    Ok(in_radius.into_iter().map(|(s, d)| (s, Some(d))).collect())
}

fn decide(
    pool: &[(Station, Option<f64>)],
    index: usize,
    criteria: SelectionCriteria,
    cod_fallback: bool,
    note: Option<String>,
) -> Decision {
    let (station, distance_km) = &pool[index];
    let alternatives = pool
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .take(MAX_ALTERNATIVES)
        .map(|(_, (s, d))| candidate(s, *d))
        .collect();

    Decision {
        station_id: station.id,
        station_name: station.name.clone(),
        distance_km: *distance_km,
        criteria,
        cod_fallback,
        note,
        alternatives,
        cached: false,
    }
}

fn candidate(station: &Station, distance_km: Option<f64>) -> Candidate {
    Candidate { station_id: station.id, name: station.name.clone(), distance_km }
}

/// Distance-ordered stocked candidates near a point, for callers that want
/// choices rather than a single decision. An unreachable catalog yields an
/// empty list, not an error.
pub fn alternatives(
    all: Vec<Station>,
    origin: GeoPoint,
    fuel: FuelType,
    quantity: f64,
    exclude: Option<Uuid>,
    max_radius_km: f64,
    limit: usize,
) -> Result<Vec<Candidate>, AppError> {
    let pool = candidate_pool(catalog::candidates(all), origin, max_radius_km)?;

    Ok(pool
        .into_iter()
        .filter(|(s, _)| s.available_stock(fuel) >= quantity && Some(s.id) != exclude)
        .take(limit)
        .map(|(s, d)| candidate(&s, d))
        .collect())
}
