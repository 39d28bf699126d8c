use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::CodConfig;
use crate::models::order::PaymentState;
use crate::models::station::Station;
use crate::models::trust::{CodDecision, CodOutcome, CodReason, TrustRecord, TRUST_CEILING, TRUST_FLOOR};
use crate::state::AppState;

/// Station context for an eligibility check. Non-fuel work needs no
/// station; fuel orders resolve one by id or by proximity.
pub enum StationContext<'a> {
    NotApplicable,
    Missing,
    Station(&'a Station),
}

/// Ordered checks, short-circuiting at the first failure. The order is part
/// of the contract: callers render the first reason, not the full set.
pub fn check_eligibility(
    record: &TrustRecord,
    order_amount: i64,
    now: DateTime<Utc>,
    cfg: &CodConfig,
    location_supported: bool,
    station: StationContext<'_>,
) -> CodDecision {
    if record.trust_score < cfg.trust_threshold {
        return CodDecision::deny(CodReason::TrustScoreLow);
    }
    if record.disabled {
        return CodDecision::deny(CodReason::CodDisabled);
    }
    if record.disabled_until.is_some_and(|until| until > now) {
        return CodDecision::deny(CodReason::CodDisabledUntil);
    }
    if record.failure_count >= cfg.max_failures {
        return CodDecision::deny(CodReason::CodFailLimit);
    }
    if order_amount > cfg.per_order_limit {
        return CodDecision::deny(CodReason::OrderAmountTooHigh);
    }
    if !location_supported {
        return CodDecision::deny(CodReason::LocationNotSupported);
    }

    match station {
        StationContext::NotApplicable => CodDecision::allow(),
        StationContext::Missing => CodDecision::deny(CodReason::StationNotFound),
        StationContext::Station(s) => {
            if !s.cod.supported || !s.cod.trusted {
                return CodDecision::deny(CodReason::StationCodNotSupported);
            }
            if s.cod.current_balance + order_amount > s.cod.balance_limit {
                return CodDecision::deny(CodReason::FuelStationCodLimitExceeded);
            }
            CodDecision::allow()
        }
    }
}

/// Apply a completed COD order's outcome to the customer's trust record.
/// Trust is clamped to [0, 100].
pub fn apply_outcome(record: &mut TrustRecord, outcome: &CodOutcome, now: DateTime<Utc>, cfg: &CodConfig) {
    match outcome {
        CodOutcome::Success => {
            record.trust_score = (record.trust_score + cfg.success_reward).min(TRUST_CEILING);
            record.success_count += 1;
        }
        CodOutcome::Failure { reason } => {
            record.trust_score = (record.trust_score - cfg.failure_penalty).max(TRUST_FLOOR);
            record.failure_count += 1;
            record.last_failure_reason = Some(reason.clone());

            if record.failure_count >= cfg.max_failures {
                record.disabled_until = Some(now + Duration::days(cfg.disable_days));
                warn!(
                    customer_id = %record.customer_id,
                    failure_count = record.failure_count,
                    disable_days = cfg.disable_days,
                    "COD failure limit reached; disabling COD for customer"
                );
            }
        }
    }
    record.updated_at = now;
}

/// Recompute a station's COD exposure from its orders pending collection
/// and persist it. The stored balance is derived, never ground truth, so
/// every COD-affecting transition funnels through here.
pub fn recompute_cod_balance(state: &AppState, station_id: Uuid) -> i64 {
    let exposure: i64 = state
        .orders
        .iter()
        .filter(|entry| {
            let o = entry.value();
            o.assigned_station == Some(station_id)
                && o.is_cod
                && o.payment_state == PaymentState::PendingCollection
        })
        .map(|entry| entry.value().amount)
        .sum();

    if let Some(mut station) = state.stations.get_mut(&station_id) {
        if station.cod.current_balance != exposure {
            info!(
                %station_id,
                stored = station.cod.current_balance,
                derived = exposure,
                "recomputed station COD balance"
            );
        }
        station.cod.current_balance = exposure;
    }

    exposure
}

/// A location supports COD when at least one COD-capable station is in
/// range there.
pub fn location_supports_cod(in_range: &[Station]) -> bool {
    in_range.iter().any(|s| s.cod.status().is_ok())
}
