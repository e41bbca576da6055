#![allow(dead_code)]

use racesim::core::agent::AgentPars;
use racesim::core::race::{Race, RacePars, TickReport};
use racesim::core::track::{Circle, Track, TrackPars};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::{Duration, Instant};

pub const RADIUS: f64 = 100.0;

/// Ticks an agent moving 3.0 per tick needs for one lap of the test circle.
pub const LAP_TICKS_STEP_3: u64 = 209;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn track_length() -> f64 {
    2.0 * PI * RADIUS
}

pub fn circle_track_pars() -> TrackPars {
    TrackPars {
        name: String::from("test_circle"),
        circle_radius: Some(RADIUS),
        finish_point: None,
        finish_threshold_sq: 25.0,
        pit_boxes: HashMap::new(),
    }
}

pub fn circle_track() -> Track {
    Track::new(
        &circle_track_pars(),
        Box::new(Circle {
            center: [0.0, 0.0],
            radius: RADIUS,
        }),
    )
    .unwrap()
}

/// agent_pars creates an agent without tyre wear that covers `step` per tick on the test circle.
pub fn agent_pars(id: u32, step: f64, tire_laps: u32) -> AgentPars {
    AgentPars {
        id,
        name: format!("Agent{}", id),
        color: String::from("white"),
        speed_factor: step / track_length(),
        wear_factor: 0.0,
        tire_laps,
    }
}

pub fn race_pars(tot_no_laps: u32) -> RacePars {
    RacePars {
        tot_no_laps,
        seed: Some(1),
        ..Default::default()
    }
}

pub fn create_race(race_pars: &RacePars, agent_pars_all: &[AgentPars]) -> Race {
    init_logging();
    Race::new(race_pars, circle_track(), agent_pars_all).unwrap()
}

/// Clock drives a race on a virtual time axis, one frame per `frame_duration`.
pub struct Clock {
    pub t0: Instant,
    pub frame_duration: Duration,
    pub frames: u32,
}

impl Clock {
    pub fn new(frame_ms: u64) -> Clock {
        Clock {
            t0: Instant::now(),
            frame_duration: Duration::from_millis(frame_ms),
            frames: 0,
        }
    }

    pub fn now(&self) -> Instant {
        self.t0 + self.frame_duration * self.frames
    }

    /// step advances the clock by one frame and runs the race tick of that frame.
    pub fn step(&mut self, race: &mut Race) -> Option<TickReport> {
        self.frames += 1;
        race.simulate_timestep(self.now())
    }

    /// step_until runs frames until the predicate holds for a tick report, at most `max_frames`.
    pub fn step_until<F>(&mut self, race: &mut Race, max_frames: u32, mut pred: F) -> TickReport
    where
        F: FnMut(&TickReport) -> bool,
    {
        for _ in 0..max_frames {
            if let Some(report) = self.step(race) {
                if pred(&report) {
                    return report;
                }
            }
        }
        panic!("condition not reached within {} frames", max_frames);
    }
}
