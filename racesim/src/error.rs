use thiserror::Error;

/// RaceError covers everything that prevents a race from being set up (precondition failures) as
/// well as operator inputs that cannot be mapped onto the race.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RaceError {
    #[error("Track path has zero or invalid length ({0})")]
    InvalidPathLength(f64),

    #[error("Track path needs at least two points, got {0}")]
    TooFewPathPoints(usize),

    #[error("Race has no participating agents")]
    NoAgents,

    #[error("Agent id {0} is used more than once")]
    DuplicateAgentId(u32),

    #[error("Invalid parameters for agent {id}: {reason}")]
    InvalidAgentPars { id: u32, reason: String },

    #[error("Invalid race parameters: {0}")]
    InvalidRacePars(String),

    #[error("Could not parse color '{color}' of agent {id}")]
    InvalidColor { id: u32, color: String },

    #[error("Unknown agent id {0}")]
    UnknownAgent(u32),
}

/// GeometryError is returned by a path geometry provider if a position lookup fails. It is
/// contained within the tick in which it occurs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Distance {distance:.3} is outside of [0.0, {length:.3}[")]
    OutOfRange { distance: f64, length: f64 },

    #[error("Distance is not a finite number")]
    NonFinite,
}
