use crate::core::track::{Point2, Track, DRAW_MARGIN};
use crate::error::GeometryError;
use helpers::general::{clamp_finite, wrap_into};

/// RaceProgUpdate is the result of advancing an agent by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceProgUpdate {
    pub lap_completed: bool,
    pub draw_point: Point2,
}

/// StateHandler tracks the progress of an agent along the closed path: the distance covered in
/// the current lap and the number of completed laps.
#[derive(Debug, Clone, Default)]
pub struct StateHandler {
    distance: f64,
    compl_lap: u32,
}

impl StateHandler {
    /// get_distance returns the distance covered in the current lap, always in [0.0, length[.
    pub fn get_distance(&self) -> f64 {
        self.distance
    }

    /// get_compl_lap returns the number of completed laps.
    pub fn get_compl_lap(&self) -> u32 {
        self.compl_lap
    }

    /// update_race_prog advances the agent by `effective_speed`. A lap is completed (and the
    /// distance reset to 0.0) if the agent's current point lies within the finish threshold, it is
    /// moving, and it has already covered more than half of the lap. Otherwise the distance is
    /// advanced and wrapped into [0.0, length[.
    ///
    /// Both geometry lookups happen before any state is touched, such that a failing lookup
    /// leaves the agent unchanged.
    pub fn update_race_prog(
        &mut self,
        effective_speed: f64,
        track: &Track,
    ) -> Result<RaceProgUpdate, GeometryError> {
        let max_dist = (track.length - DRAW_MARGIN).max(0.0);
        let cur_point = track.point_at(clamp_finite(self.distance, 0.0, max_dist))?;

        let potential_distance = self.distance + effective_speed;
        let draw_point = track.point_at(track.draw_distance(potential_distance))?;

        let lap_completed = track.is_near_finish(cur_point)
            && effective_speed > 0.0
            && self.distance > track.length / 2.0;

        if lap_completed {
            self.distance = 0.0;
            self.compl_lap += 1;
        } else {
            if potential_distance >= track.length {
                log::debug!(
                    "Wrapped around at {:.3} without passing close enough to the finish point",
                    self.distance
                );
            }
            self.distance = wrap_into(potential_distance, track.length);
        }

        Ok(RaceProgUpdate {
            lap_completed,
            draw_point,
        })
    }
}
