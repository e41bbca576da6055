use crate::core::pit_stop::PitStop;
use crate::core::state_handler::StateHandler;
use crate::core::tireset::Tireset;
use crate::core::track::Point2;
use crate::error::RaceError;
use crate::interfaces::render_interface::RgbColor;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// * `id` - Unique agent id, never reused
/// * `name` - Display name, e.g. "White"
/// * `color` - CSS color string used by renderers, e.g. "#ff0000" or "cyan"
/// * `speed_factor` - Nominal distance per tick as a fraction of the path length
/// * `wear_factor` - Reduction of the speed factor per completed lap
/// * `tire_laps` - Remaining tyre life in laps at the start of the race
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentPars {
    pub id: u32,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    pub speed_factor: f64,
    pub wear_factor: f64,
    #[serde(default = "default_tire_laps")]
    pub tire_laps: u32,
}

fn default_color() -> String {
    String::from("white")
}

fn default_tire_laps() -> u32 {
    15
}

/// StatusKind is the plain status of an agent as shown to sinks and collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Racing,
    Pitting,
    #[serde(rename = "DNF")]
    Dnf,
}

/// AgentStatus is the state of the pit stop state machine. The pit bookkeeping only exists while
/// an agent is pitting, and a retired agent can never carry an active pit stop.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStatus {
    Racing,
    Pitting(PitStop),
    Dnf,
}

#[derive(Debug)]
pub struct Agent {
    pub id: u32,
    pub name: String,
    pub color: RgbColor,
    pub(crate) speed_factor: f64,
    wear_factor: f64,
    pub(crate) status: AgentStatus,
    pub(crate) pit_count: u32,
    pub tireset: Tireset,
    pub hr_variation: i32,
    pub display_position: Point2,
    pub sh: StateHandler,
}

impl Agent {
    pub fn new(agent_pars: &AgentPars, start_point: Point2) -> Result<Agent, RaceError> {
        if !(agent_pars.speed_factor.is_finite() && agent_pars.speed_factor > 0.0) {
            return Err(RaceError::InvalidAgentPars {
                id: agent_pars.id,
                reason: format!("speed factor must be positive, is {}", agent_pars.speed_factor),
            });
        }

        if !(agent_pars.wear_factor.is_finite() && agent_pars.wear_factor >= 0.0) {
            return Err(RaceError::InvalidAgentPars {
                id: agent_pars.id,
                reason: format!("wear factor must not be negative, is {}", agent_pars.wear_factor),
            });
        }

        let color = agent_pars
            .color
            .parse::<css_color_parser::Color>()
            .map_err(|_| RaceError::InvalidColor {
                id: agent_pars.id,
                color: agent_pars.color.to_owned(),
            })?;

        Ok(Agent {
            id: agent_pars.id,
            name: agent_pars.name.to_owned(),
            color: RgbColor {
                r: color.r,
                g: color.g,
                b: color.b,
            },
            speed_factor: agent_pars.speed_factor,
            wear_factor: agent_pars.wear_factor,
            status: AgentStatus::Racing,
            pit_count: 0,
            tireset: Tireset::new(agent_pars.tire_laps),
            hr_variation: 0,
            display_position: start_point,
            sh: StateHandler::default(),
        })
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn wear_factor(&self) -> f64 {
        self.wear_factor
    }

    pub fn status(&self) -> &AgentStatus {
        &self.status
    }

    pub fn status_kind(&self) -> StatusKind {
        match self.status {
            AgentStatus::Racing => StatusKind::Racing,
            AgentStatus::Pitting(_) => StatusKind::Pitting,
            AgentStatus::Dnf => StatusKind::Dnf,
        }
    }

    pub fn is_racing(&self) -> bool {
        matches!(self.status, AgentStatus::Racing)
    }

    pub fn is_pitting(&self) -> bool {
        matches!(self.status, AgentStatus::Pitting(_))
    }

    pub fn is_dnf(&self) -> bool {
        matches!(self.status, AgentStatus::Dnf)
    }

    pub fn pit_count(&self) -> u32 {
        self.pit_count
    }

    pub fn distance(&self) -> f64 {
        self.sh.get_distance()
    }

    pub fn lap(&self) -> u32 {
        self.sh.get_compl_lap()
    }

    pub fn tire_laps(&self) -> u32 {
        self.tireset.laps_left()
    }

    /// pit_remaining returns the remaining pit stop time if the agent is pitting.
    pub fn pit_remaining(&self, now: Instant) -> Option<Duration> {
        match &self.status {
            AgentStatus::Pitting(pit_stop) => Some(pit_stop.remaining(now)),
            _ => None,
        }
    }

    /// retire marks a racing agent as DNF and stops it permanently. Agents that are pitting or
    /// already retired are left untouched. Returns true if the agent was retired.
    pub fn retire(&mut self) -> bool {
        if !self.is_racing() {
            return false;
        }

        self.speed_factor = 0.0;
        self.status = AgentStatus::Dnf;
        true
    }
}
