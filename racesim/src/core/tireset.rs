use std::convert::TryFrom;

/// Wear never reduces an agent's speed below this fraction of its base speed factor.
pub const MIN_SPEED_FRACTION: f64 = 0.5;

/// Tireset tracks the remaining life of the mounted tyres in laps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tireset {
    laps_left: u32,
}

impl Tireset {
    pub fn new(laps_left: u32) -> Tireset {
        Tireset { laps_left }
    }

    pub fn laps_left(&self) -> u32 {
        self.laps_left
    }

    /// drive_lap reduces the remaining tyre life by one lap (floored at zero).
    pub fn drive_lap(&mut self) {
        self.laps_left = self.laps_left.saturating_sub(1);
    }

    /// is_worn checks if the tyres have reached the pit threshold.
    pub fn is_worn(&self, pit_threshold: u32) -> bool {
        self.laps_left <= pit_threshold
    }

    /// fit_fresh mounts a new tyre set with the given life.
    pub fn fit_fresh(&mut self, fresh_tire_laps: u32) {
        self.laps_left = fresh_tire_laps;
    }

    /// override_laps_left sets the remaining tyre life from operator input. Negative values are
    /// clamped to zero, values beyond the representable range to u32::MAX.
    pub fn override_laps_left(&mut self, value: i64) -> u32 {
        self.laps_left = u32::try_from(value.max(0)).unwrap_or(u32::MAX);
        self.laps_left
    }
}

/// calc_effective_speed returns the distance an agent covers in one tick.
///
/// effective = max(speed_factor * 0.5, speed_factor - lap * wear_factor) * path_length * chaos
///
/// Non-finite results are treated as standstill.
pub fn calc_effective_speed(
    speed_factor: f64,
    wear_factor: f64,
    lap: u32,
    path_length: f64,
    chaos_factor: f64,
) -> f64 {
    let worn_speed_factor = speed_factor - lap as f64 * wear_factor;
    let effective =
        worn_speed_factor.max(speed_factor * MIN_SPEED_FRACTION) * path_length * chaos_factor;

    if effective.is_finite() {
        effective
    } else {
        0.0
    }
}
