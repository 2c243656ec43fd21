//! Clock helpers shared by the engine and rules.

use chrono::{Local, NaiveDateTime, TimeDelta};

/// Wall-clock now in local time, used when a frame carries no timestamp
pub fn wall_clock_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Convert configured seconds to a `TimeDelta` at microsecond precision.
/// Callers validate the input first; non-finite values collapse to zero.
pub fn secs_to_delta(secs: f64) -> TimeDelta {
    if !secs.is_finite() {
        return TimeDelta::zero();
    }
    TimeDelta::microseconds((secs * 1_000_000.0).round() as i64)
}

/// Seconds in a `TimeDelta`, with microsecond precision
pub fn delta_secs(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}
