use crate::core::agent::StatusKind;
use crate::core::track::Point2;
use crate::post::race_result::RaceResult;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// AgentRenderState is what a renderer needs to draw one agent. Renderers must not feed the
/// position back into the simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRenderState {
    pub id: u32,
    pub color: RgbColor,
    pub display_position: Point2,
    pub status: StatusKind,
    pub pit_remaining_s: Option<f64>,
}

/// LeaderboardEntry is one row of the leaderboard. Heart rate and win probability are cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub id: u32,
    pub name: String,
    pub tire_laps: u32,
    pub status: StatusKind,
    pub pit_remaining_s: Option<f64>,
    pub heart_rate: Option<i32>,
    pub win_probability: Option<u8>,
}

impl LeaderboardEntry {
    /// status_text returns the status column as shown on the leaderboard.
    pub fn status_text(&self) -> String {
        match (self.status, self.pit_remaining_s) {
            (StatusKind::Dnf, _) => String::from("DNF"),
            (StatusKind::Pitting, Some(t)) => format!("Pitting ({:.1}s)", t),
            (StatusKind::Pitting, None) => String::from("Pitting"),
            (StatusKind::Racing, _) => String::from("Racing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LapCounter {
    pub lap: u32,
    pub tot_no_laps: u32,
}

/// RaceState is sent to the render and leaderboard sinks after every tick.
#[derive(Debug, Clone, Serialize)]
pub struct RaceState {
    pub tick: u64,
    pub agent_states: Vec<AgentRenderState>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub lap_counter: LapCounter,

    // true if raining, the particle flag tells renderers whether to spawn rain drops
    pub is_raining: bool,
    pub rain_particles_active: bool,

    pub paused: bool,
    pub finished: bool,

    // final results payload (sent once when race finishes)
    pub final_result: Option<RaceResult>,
}
