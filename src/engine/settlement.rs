use chrono::Timelike;
use tracing::error;

use crate::config::{PlatformConfig, WorkerPayConfig};
use crate::error::AppError;
use crate::models::settlement::{CustomerBill, Settlement, SettlementInput, WorkerPayout};

/// Whole currency units; the ledger works in rounded integers.
fn round_money(v: f64) -> i64 {
    v.round() as i64
}

/// Split a completed order's money across station, worker, and platform.
/// Pure and deterministic: re-invoking with recorded original components
/// (via the input's overrides) reproduces a historical bill exactly.
pub fn calculate(
    input: &SettlementInput,
    worker_cfg: &WorkerPayConfig,
    platform_cfg: &PlatformConfig,
) -> Result<Settlement, AppError> {
    if !input.litres.is_finite()
        || !input.price_per_litre.is_finite()
        || !input.distance_km.is_finite()
        || input.distance_km < 0.0
    {
        return Err(AppError::BadRequest(
            "litres, price, and distance must be finite (distance non-negative)".to_string(),
        ));
    }

    let is_fuel = input.service.fuel().is_some();
    let settlement = if is_fuel {
        calculate_fuel(input, worker_cfg, platform_cfg)
    } else {
        calculate_service(input, worker_cfg, platform_cfg)
    };

    validate(&settlement)?;
    Ok(settlement)
}

fn calculate_fuel(
    input: &SettlementInput,
    worker_cfg: &WorkerPayConfig,
    platform_cfg: &PlatformConfig,
) -> Settlement {
    let fuel_cost = round_money(input.litres * input.price_per_litre);

    let mut delivery_fee = input
        .overrides
        .delivery_fee
        .unwrap_or(platform_cfg.base_delivery_fee);

    let small_order_surcharge = if input.litres < platform_cfg.small_order_litres {
        platform_cfg.small_order_surcharge
    } else {
        0
    };

    let platform_service_fee = input
        .overrides
        .platform_service_fee
        .unwrap_or_else(|| round_money(fuel_cost as f64 * platform_cfg.platform_fee_rate));

    let night = is_night(input, platform_cfg);
    let (surge_fee, surge_reasons) = surge(delivery_fee, night, input, platform_cfg);

    let worker = fuel_worker_payout(input, surge_fee, night, worker_cfg);

    // Margin protection: the platform never nets less than its configured
    // minimum on the non-fuel portion of the bill.
    let collected = delivery_fee + platform_service_fee + surge_fee + small_order_surcharge;
    let required = worker.total + platform_cfg.min_platform_margin;
    if collected < required {
        delivery_fee += required - collected;
    }

    let total = fuel_cost + delivery_fee + platform_service_fee + surge_fee + small_order_surcharge;

    // The station is a pure passthrough; platform fees never touch it.
    let fuel_station_payout = fuel_cost;
    let platform_profit = total - fuel_station_payout - worker.total;

    Settlement {
        order_id: input.order_id,
        service: input.service,
        customer: CustomerBill {
            fuel_cost,
            delivery_fee,
            platform_service_fee,
            surge_fee,
            surge_reasons,
            small_order_surcharge,
            total,
        },
        fuel_station_payout,
        worker,
        platform_profit,
        calculated_at: input.completed_at,
    }
}

/// Mechanic/crane bookings: a flat fee, no delivery fee or surcharge, and a
/// reduced worker payout model. Surge percentages scale the booking fee
/// since there is no delivery fee to scale.
fn calculate_service(
    input: &SettlementInput,
    worker_cfg: &WorkerPayConfig,
    platform_cfg: &PlatformConfig,
) -> Settlement {
    let booking_fee = input
        .overrides
        .platform_service_fee
        .unwrap_or(platform_cfg.base_booking_fee);

    let night = is_night(input, platform_cfg);
    let (surge_fee, surge_reasons) = surge(booking_fee, night, input, platform_cfg);

    let surge_share = round_money(surge_fee as f64 * worker_cfg.surge_share);
    let worker_total = worker_cfg.base_pay + surge_share;
    let worker = WorkerPayout {
        base_pay: worker_cfg.base_pay,
        distance_pay: 0,
        surge_share,
        waiting_bonus: 0,
        incentive_bonus: 0,
        long_distance_bonus: 0,
        peak_hour_bonus: 0,
        penalties: 0,
        guarantee_top_up: 0,
        total: worker_total,
    };

    let total = booking_fee + surge_fee;

    Settlement {
        order_id: input.order_id,
        service: input.service,
        customer: CustomerBill {
            fuel_cost: 0,
            delivery_fee: 0,
            platform_service_fee: booking_fee,
            surge_fee,
            surge_reasons,
            small_order_surcharge: 0,
            total,
        },
        fuel_station_payout: 0,
        worker,
        platform_profit: total - worker_total,
        calculated_at: input.completed_at,
    }
}

fn is_night(input: &SettlementInput, cfg: &PlatformConfig) -> bool {
    input.overrides.night.unwrap_or_else(|| {
        let hour = input.completed_at.hour();
        hour >= cfg.night_start_hour || hour < cfg.night_end_hour
    })
}

fn surge(
    basis: i64,
    night: bool,
    input: &SettlementInput,
    cfg: &PlatformConfig,
) -> (i64, Vec<String>) {
    let mut fee = 0;
    let mut reasons = Vec::new();

    if night {
        fee += round_money(basis as f64 * cfg.night_multiplier);
        reasons.push("Night delivery".to_string());
    }
    if input.overrides.rain.unwrap_or(cfg.rain_mode) {
        fee += round_money(basis as f64 * cfg.rain_multiplier);
        reasons.push("Rain conditions".to_string());
    }
    if input.emergency {
        fee += round_money(basis as f64 * cfg.emergency_multiplier);
        reasons.push("Emergency service".to_string());
    }

    (fee, reasons)
}

fn fuel_worker_payout(
    input: &SettlementInput,
    surge_fee: i64,
    night: bool,
    cfg: &WorkerPayConfig,
) -> WorkerPayout {
    let distance_pay = round_money(input.distance_km * cfg.per_km_rate);
    let surge_share = round_money(surge_fee as f64 * cfg.surge_share);

    let billable_minutes = input.waiting_minutes.saturating_sub(cfg.free_waiting_minutes);
    let waiting_bonus = billable_minutes as i64 * cfg.waiting_rate_per_minute;

    let incentive_bonus = if cfg.incentive_every > 0
        && input.completed_deliveries > 0
        && input.completed_deliveries % cfg.incentive_every == 0
    {
        cfg.incentive_bonus
    } else {
        0
    };

    let long_distance_bonus = if input.distance_km >= cfg.long_distance_km {
        cfg.long_distance_bonus
    } else {
        0
    };

    // Night/emergency work earns the flat peak bonus only when the surge
    // split didn't already pay for it.
    let peak_hour_bonus = if surge_share == 0 && (night || input.emergency) {
        cfg.peak_hour_bonus
    } else {
        0
    };

    let subtotal = cfg.base_pay
        + distance_pay
        + surge_share
        + waiting_bonus
        + incentive_bonus
        + long_distance_bonus
        + peak_hour_bonus
        - input.penalties;

    let total = subtotal.max(cfg.min_guaranteed_pay);
    let guarantee_top_up = total - subtotal;

    WorkerPayout {
        base_pay: cfg.base_pay,
        distance_pay,
        surge_share,
        waiting_bonus,
        incentive_bonus,
        long_distance_bonus,
        peak_hour_bonus,
        penalties: input.penalties,
        guarantee_top_up,
        total,
    }
}

/// Money conservation: the three payouts must reproduce the customer total
/// within one currency unit. A violation is a calculation bug with real
/// financial impact, so it is logged and returned, never swallowed.
pub fn validate(s: &Settlement) -> Result<(), AppError> {
    let payouts = s.fuel_station_payout + s.worker.total + s.platform_profit;
    if (payouts - s.customer.total).abs() > 1 {
        error!(
            order_id = %s.order_id,
            payouts,
            customer_total = s.customer.total,
            "settlement does not balance"
        );
        return Err(AppError::UnbalancedSettlement {
            payouts,
            customer_total: s.customer.total,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::{calculate, validate};
    use crate::config::{PlatformConfig, WorkerPayConfig};
    use crate::models::order::ServiceType;
    use crate::models::settlement::{SettlementInput, SettlementOverrides};

    fn daytime_input(litres: f64, price: f64) -> SettlementInput {
        SettlementInput {
            order_id: Uuid::new_v4(),
            service: ServiceType::Petrol,
            litres,
            price_per_litre: price,
            distance_km: 3.0,
            completed_at: Utc.with_ymd_and_hms(2026, 3, 10, 14, 0, 0).unwrap(),
            emergency: false,
            waiting_minutes: 0,
            completed_deliveries: 1,
            penalties: 0,
            overrides: SettlementOverrides::default(),
        }
    }

    fn configs() -> (WorkerPayConfig, PlatformConfig) {
        (WorkerPayConfig::default(), PlatformConfig::default())
    }

    #[test]
    fn small_daytime_order_bills_430() {
        let (worker, platform) = configs();
        let s = calculate(&daytime_input(3.0, 100.0), &worker, &platform).unwrap();

        assert_eq!(s.customer.fuel_cost, 300);
        assert_eq!(s.customer.delivery_fee, 80);
        assert_eq!(s.customer.platform_service_fee, 15);
        assert_eq!(s.customer.small_order_surcharge, 35);
        assert_eq!(s.customer.surge_fee, 0);
        assert_eq!(s.customer.total, 430);
        assert_eq!(s.fuel_station_payout, 300);
    }

    #[test]
    fn surcharge_applies_strictly_under_five_litres() {
        let (worker, platform) = configs();

        let under = calculate(&daytime_input(4.9, 100.0), &worker, &platform).unwrap();
        assert_eq!(under.customer.small_order_surcharge, 35);

        let at = calculate(&daytime_input(5.0, 100.0), &worker, &platform).unwrap();
        assert_eq!(at.customer.small_order_surcharge, 0);
    }

    #[test]
    fn night_order_surges_half_the_delivery_fee() {
        let (worker, platform) = configs();
        let mut input = daytime_input(10.0, 100.0);
        input.completed_at = Utc.with_ymd_and_hms(2026, 3, 10, 22, 0, 0).unwrap();

        let s = calculate(&input, &worker, &platform).unwrap();
        assert_eq!(s.customer.surge_fee, 40);
        assert!(s.customer.surge_reasons.iter().any(|r| r == "Night delivery"));
    }

    #[test]
    fn night_window_wraps_midnight() {
        let (worker, platform) = configs();

        let mut early = daytime_input(10.0, 100.0);
        early.completed_at = Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap();
        assert!(calculate(&early, &worker, &platform).unwrap().customer.surge_fee > 0);

        let mut morning = daytime_input(10.0, 100.0);
        morning.completed_at = Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap();
        assert_eq!(calculate(&morning, &worker, &platform).unwrap().customer.surge_fee, 0);
    }

    #[test]
    fn rain_and_emergency_stack_on_top_of_night() {
        let (worker, platform) = configs();
        let mut input = daytime_input(10.0, 100.0);
        input.completed_at = Utc.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap();
        input.emergency = true;
        input.overrides.rain = Some(true);

        let s = calculate(&input, &worker, &platform).unwrap();
        // 50% + 30% + 50% of the 80 delivery fee.
        assert_eq!(s.customer.surge_fee, 40 + 24 + 40);
        assert_eq!(s.customer.surge_reasons.len(), 3);
    }

    #[test]
    fn overrides_replay_a_historical_bill_exactly() {
        let (worker, platform) = configs();
        let mut input = daytime_input(10.0, 95.0);
        input.overrides = SettlementOverrides {
            delivery_fee: Some(90),
            platform_service_fee: Some(48),
            night: Some(false),
            rain: Some(false),
        };

        let first = calculate(&input, &worker, &platform).unwrap();
        let second = calculate(&input, &worker, &platform).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.customer.delivery_fee, 90);
        assert_eq!(first.customer.platform_service_fee, 48);
    }

    #[test]
    fn worker_pay_never_drops_below_the_guarantee() {
        let (mut worker, platform) = configs();
        worker.min_guaranteed_pay = 120;

        let mut input = daytime_input(10.0, 100.0);
        input.distance_km = 0.0;
        input.penalties = 40;

        let s = calculate(&input, &worker, &platform).unwrap();
        assert_eq!(s.worker.total, 120);
        assert!(s.worker.guarantee_top_up > 0);
    }

    #[test]
    fn margin_protection_bumps_the_delivery_fee() {
        let (worker, platform) = configs();
        let mut input = daytime_input(10.0, 100.0);
        // 20 km of distance pay (200) + long-distance bonus dwarfs the
        // 80 + 50 the customer would otherwise contribute.
        input.distance_km = 20.0;

        let s = calculate(&input, &worker, &platform).unwrap();
        assert!(s.customer.delivery_fee > platform.base_delivery_fee);
        assert_eq!(s.platform_profit, platform.min_platform_margin);
    }

    #[test]
    fn every_tenth_delivery_earns_the_incentive() {
        let (worker, platform) = configs();

        let mut input = daytime_input(10.0, 100.0);
        input.completed_deliveries = 10;
        let s = calculate(&input, &worker, &platform).unwrap();
        assert_eq!(s.worker.incentive_bonus, 100);

        input.completed_deliveries = 11;
        let s = calculate(&input, &worker, &platform).unwrap();
        assert_eq!(s.worker.incentive_bonus, 0);
    }

    #[test]
    fn waiting_past_the_free_window_is_paid() {
        let (worker, platform) = configs();
        let mut input = daytime_input(10.0, 100.0);
        input.waiting_minutes = 25;

        let s = calculate(&input, &worker, &platform).unwrap();
        assert_eq!(s.worker.waiting_bonus, 30);
    }

    #[test]
    fn peak_bonus_only_when_the_surge_split_paid_nothing() {
        let (worker, platform) = configs();

        let mut night = daytime_input(10.0, 100.0);
        night.completed_at = Utc.with_ymd_and_hms(2026, 3, 10, 22, 0, 0).unwrap();
        let s = calculate(&night, &worker, &platform).unwrap();
        assert!(s.worker.surge_share > 0);
        assert_eq!(s.worker.peak_hour_bonus, 0);

        // Same night order but with the delivery fee zeroed by override:
        // no surge fee to split, so the flat peak bonus applies.
        night.overrides.delivery_fee = Some(0);
        let s = calculate(&night, &worker, &platform).unwrap();
        assert_eq!(s.worker.surge_share, 0);
        assert_eq!(s.worker.peak_hour_bonus, worker.peak_hour_bonus);
    }

    #[test]
    fn non_fuel_bookings_use_the_flat_model() {
        let (worker, platform) = configs();
        let mut input = daytime_input(0.0, 0.0);
        input.service = ServiceType::Mechanic;

        let s = calculate(&input, &worker, &platform).unwrap();
        assert_eq!(s.customer.fuel_cost, 0);
        assert_eq!(s.customer.delivery_fee, 0);
        assert_eq!(s.customer.small_order_surcharge, 0);
        assert_eq!(s.customer.platform_service_fee, platform.base_booking_fee);
        assert_eq!(s.fuel_station_payout, 0);
        assert_eq!(s.worker.total, worker.base_pay);
        assert_eq!(s.worker.distance_pay, 0);
        assert_eq!(s.worker.guarantee_top_up, 0);
    }

    #[test]
    fn all_settlements_conserve_money() {
        let (worker, platform) = configs();
        let cases = [
            daytime_input(3.0, 100.0),
            daytime_input(50.0, 92.5),
            {
                let mut i = daytime_input(10.0, 100.0);
                i.completed_at = Utc.with_ymd_and_hms(2026, 3, 10, 23, 30, 0).unwrap();
                i.emergency = true;
                i.distance_km = 18.0;
                i
            },
            {
                let mut i = daytime_input(0.0, 0.0);
                i.service = ServiceType::Crane;
                i
            },
        ];

        for input in cases {
            let s = calculate(&input, &worker, &platform).unwrap();
            let payouts = s.fuel_station_payout + s.worker.total + s.platform_profit;
            assert!((payouts - s.customer.total).abs() <= 1);
            assert!(validate(&s).is_ok());
        }
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let (worker, platform) = configs();
        let mut input = daytime_input(10.0, 100.0);
        input.litres = f64::NAN;
        assert!(calculate(&input, &worker, &platform).is_err());

        let mut input = daytime_input(10.0, 100.0);
        input.distance_km = -1.0;
        assert!(calculate(&input, &worker, &platform).is_err());
    }
}
