use crate::core::race::{Race, TickReport};
use crate::error::RaceError;
use std::time::{Duration, Instant};

/// FrameOutcome tells the host loop what happened in a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Ticked(TickReport),
    Paused,
    Stopped,
}

/// TickScheduler paces the ticks of a race. Every frame performs at most one tick, frames are
/// `timestep_size / realtime_factor` seconds apart in wall-clock time. Pausing the race cancels
/// the ticks but not the frames.
///
/// * `frame_duration` - Wall-clock time between two frames
/// * `next_frame` - Earliest instant of the next frame (None before the first frame)
/// * `frames` - Number of frames run so far
#[derive(Debug, Clone)]
pub struct TickScheduler {
    frame_duration: Duration,
    next_frame: Option<Instant>,
    frames: u64,
}

impl TickScheduler {
    pub fn new(timestep_size: f64, realtime_factor: f64) -> Result<TickScheduler, RaceError> {
        if !(timestep_size.is_finite() && timestep_size > 0.0) {
            return Err(RaceError::InvalidRacePars(format!(
                "timestep size must be positive, is {}",
                timestep_size
            )));
        }

        if !(realtime_factor.is_finite() && realtime_factor > 0.0) {
            return Err(RaceError::InvalidRacePars(format!(
                "real-time factor must be positive, is {}",
                realtime_factor
            )));
        }

        Ok(TickScheduler {
            frame_duration: Duration::from_secs_f64(timestep_size / realtime_factor),
            next_frame: None,
            frames: 0,
        })
    }

    /// run_frame performs the tick of the current frame if the race has one scheduled.
    pub fn run_frame(&mut self, race: &mut Race, now: Instant) -> FrameOutcome {
        if race.is_finished() {
            return FrameOutcome::Stopped;
        }

        self.frames += 1;
        self.next_frame = Some(now + self.frame_duration);

        match race.simulate_timestep(now) {
            Some(report) => FrameOutcome::Ticked(report),
            None => FrameOutcome::Paused,
        }
    }

    /// time_until_next_frame returns how long the host has to wait before the next frame is due.
    pub fn time_until_next_frame(&self, now: Instant) -> Duration {
        self.next_frame
            .map(|t| t.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    pub fn get_frames(&self) -> u64 {
        self.frames
    }
}
