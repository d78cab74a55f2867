use chrono::{DateTime, Duration, Utc};

use crate::{
    log_debug,
    state::{StateChanges, StateStore},
};

const ENABLE_LOGS: bool = true;

/// From this many minutes on, every duration step counts double.
pub const LONG_SESSION_THRESHOLD_MINUTES: u32 = 120;

/// Upper bound for moving a session's end when its zone sets no maximum.
pub const SESSION_END_LIMIT_MINUTES: u32 = 1440;

/// Applies one `delta` step to `current` and clamps to `[0, max]`.
///
/// Below [`LONG_SESSION_THRESHOLD_MINUTES`] the raw delta is added; at or
/// above it the delta is doubled. The step is added first, then clamped.
/// `max: None` leaves the upper end open.
pub fn next_duration(current: u32, delta: i32, max: Option<u32>) -> u32 {
    let step = if current < LONG_SESSION_THRESHOLD_MINUTES {
        i64::from(delta)
    } else {
        i64::from(delta) * 2
    };
    let upper = i64::from(max.unwrap_or(u32::MAX));
    (i64::from(current) + step).clamp(0, upper) as u32
}

/// Moves the duration picker by `delta` against the selected zone's maximum
/// and writes the result back into state. Without a selected zone there is
/// no maximum.
pub fn modify_duration(store: &mut StateStore, delta: i32) -> u32 {
    let state = store.get();
    let max = state.selected_zone().and_then(|zone| zone.max_duration());
    if state.selected_zone().is_none() {
        log_debug!("DURATION", "No selected zone, duration is unbounded");
    }

    let duration = next_duration(state.duration, delta, max);
    store.update(StateChanges::new().duration(duration));
    duration
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndAdjustment {
    Unchanged,
    /// New end; `None` turns the session into "until stopped".
    Set(Option<DateTime<Utc>>),
}

/// Moves an active session's end by one step in the direction of `delta`.
///
/// The step is 60 minutes for `|delta| >= 60`, otherwise 30. Extending is
/// capped at `now + max` (or [`SESSION_END_LIMIT_MINUTES`] without a zone
/// maximum). An open-ended session can only be extended, which fixes its end
/// one step from now. Shortening a fixed end to `now` or earlier makes the
/// session open-ended.
pub fn adjust_session_end(
    end: Option<DateTime<Utc>>,
    delta: i32,
    max: Option<u32>,
    now: DateTime<Utc>,
) -> EndAdjustment {
    if delta == 0 {
        return EndAdjustment::Unchanged;
    }

    let step_minutes = if delta.unsigned_abs() >= 60 { 60 } else { 30 };
    let step = Duration::minutes(step_minutes);
    let limit = Duration::minutes(i64::from(max.unwrap_or(SESSION_END_LIMIT_MINUTES)));

    // Stored ends can sit anywhere in chrono's range; out-of-range moves are ignored.
    match (end, delta > 0) {
        (None, false) => EndAdjustment::Unchanged,
        (end, true) => {
            let base = end.unwrap_or(now);
            match (base.checked_add_signed(step), now.checked_add_signed(limit)) {
                (Some(extended), Some(latest)) => EndAdjustment::Set(Some(extended.min(latest))),
                _ => EndAdjustment::Unchanged,
            }
        }
        (Some(end), false) => match end.checked_sub_signed(step) {
            Some(shortened) if shortened > now => EndAdjustment::Set(Some(shortened)),
            _ => EndAdjustment::Set(None),
        },
    }
}
