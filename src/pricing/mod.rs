//! Cost and duration arithmetic for parking sessions.

pub mod duration;

pub use duration::{
    adjust_session_end, modify_duration, next_duration, EndAdjustment,
    LONG_SESSION_THRESHOLD_MINUTES, SESSION_END_LIMIT_MINUTES,
};

use crate::{log_debug, models::Zone};

const ENABLE_LOGS: bool = true;

/// Cost of parking `duration_minutes` at `hourly_rate`.
///
/// Zero, negative and NaN durations cost nothing. No rounding is applied;
/// presenting the amount in cents is up to the caller.
pub fn calculate_cost(duration_minutes: f64, hourly_rate: f64) -> f64 {
    if duration_minutes.is_nan() || duration_minutes <= 0.0 {
        return 0.0;
    }
    (duration_minutes / 60.0) * hourly_rate
}

/// Hourly rate to charge for `zone`: its `price` when usable, else `fallback`.
///
/// The zone data source keeps `price` equal to the highest time-sliced rate;
/// a mismatch is logged but not corrected here.
pub fn resolve_hourly_rate(zone: Option<&Zone>, fallback: f64) -> f64 {
    let Some(zone) = zone else {
        return fallback;
    };

    let Some(price) = zone.price_value() else {
        return fallback;
    };

    if let Some(max_rate) = zone.max_rate() {
        if (max_rate - price).abs() > f64::EPSILON {
            log_debug!(
                "PRICING",
                "Zone {} price {} differs from highest rate {}",
                zone.id,
                price,
                max_rate
            );
        }
    }

    price
}
