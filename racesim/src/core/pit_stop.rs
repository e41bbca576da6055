use crate::core::agent::{Agent, AgentStatus};
use crate::core::track::Point2;
use std::time::{Duration, Instant};

/// PitStop holds the bookkeeping of an active pit stop.
///
/// * `deadline` - Wall-clock time at which the pit stop is complete
/// * `saved_speed_factor` - Speed factor before entering the pits, restored on exit
/// * `saved_position` - Display position before the agent was parked in its pit box
#[derive(Debug, Clone, PartialEq)]
pub struct PitStop {
    pub deadline: Instant,
    pub saved_speed_factor: f64,
    pub saved_position: Point2,
}

impl PitStop {
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// pit_due checks, on lap completion, if an agent has to be routed into the pit lane: it must be
/// racing, its tyres must have reached the pit threshold and the completed lap must not decide
/// the race.
pub fn pit_due(agent: &Agent, pit_threshold: u32, tot_no_laps: u32) -> bool {
    agent.is_racing() && agent.tireset.is_worn(pit_threshold) && agent.lap() < tot_no_laps
}

impl Agent {
    /// enter_pit stops the agent, parks it in its pit box and starts the pit stop timer. Only a
    /// racing agent can enter the pits. Returns true if the pit stop was started.
    pub fn enter_pit(&mut self, pit_box: Point2, now: Instant, pit_duration: Duration) -> bool {
        if !self.is_racing() {
            return false;
        }

        self.status = AgentStatus::Pitting(PitStop {
            deadline: now + pit_duration,
            saved_speed_factor: self.speed_factor,
            saved_position: self.display_position,
        });
        self.speed_factor = 0.0;
        self.pit_count += 1;
        self.display_position = pit_box;
        true
    }

    /// exit_pit ends an active pit stop: the saved speed factor and display position are restored
    /// and fresh tyres are fitted. The restored position is shown until the next tick. Returns true
    /// if a pit stop was ended.
    pub fn exit_pit(&mut self, fresh_tire_laps: u32) -> bool {
        let pit_stop = match &self.status {
            AgentStatus::Pitting(pit_stop) => pit_stop.to_owned(),
            _ => return false,
        };

        self.speed_factor = pit_stop.saved_speed_factor;
        self.display_position = pit_stop.saved_position;
        self.tireset.fit_fresh(fresh_tire_laps);
        self.status = AgentStatus::Racing;
        true
    }

    /// check_pit_exit ends the pit stop if its deadline has been reached.
    pub fn check_pit_exit(&mut self, now: Instant, fresh_tire_laps: u32) -> bool {
        match &self.status {
            AgentStatus::Pitting(pit_stop) if pit_stop.is_complete(now) => {
                self.exit_pit(fresh_tire_laps)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::agent::AgentPars;

    const PIT_DURATION: Duration = Duration::from_millis(2500);

    fn agent(tire_laps: u32) -> Agent {
        Agent::new(
            &AgentPars {
                id: 1,
                name: String::from("Red"),
                color: String::from("red"),
                speed_factor: 0.00063,
                wear_factor: 0.000001,
                tire_laps,
            },
            [5.0, 5.0],
        )
        .unwrap()
    }

    #[test]
    fn pit_is_due_only_with_worn_tyres_before_the_last_lap() {
        let agent_worn = agent(3);
        assert!(pit_due(&agent_worn, 3, 50));
        assert!(!pit_due(&agent(4), 3, 50));
        // the completed lap decides the race
        assert!(!pit_due(&agent_worn, 3, 0));
    }

    #[test]
    fn pit_cycle_restores_pre_pit_state() {
        let t0 = Instant::now();
        let mut agent = agent(3);

        assert!(agent.enter_pit([100.0, -20.0], t0, PIT_DURATION));
        assert!(agent.is_pitting());
        assert_eq!(agent.speed_factor(), 0.0);
        assert_eq!(agent.pit_count(), 1);
        assert_eq!(agent.display_position, [100.0, -20.0]);
        assert!(!pit_due(&agent, 3, 50));

        // no re-entry while pitting
        assert!(!agent.enter_pit([0.0, 0.0], t0, PIT_DURATION));
        assert_eq!(agent.pit_count(), 1);

        assert!(!agent.check_pit_exit(t0 + Duration::from_millis(2499), 25));
        assert_eq!(agent.pit_remaining(t0 + Duration::from_millis(2000)), Some(Duration::from_millis(500)));

        assert!(agent.check_pit_exit(t0 + PIT_DURATION, 25));
        assert!(agent.is_racing());
        assert_eq!(agent.speed_factor(), 0.00063);
        assert_eq!(agent.tire_laps(), 25);
        assert_eq!(agent.display_position, [5.0, 5.0]);
        assert_eq!(agent.pit_remaining(t0 + PIT_DURATION), None);
    }

    #[test]
    fn retired_agent_never_pits() {
        let t0 = Instant::now();
        let mut agent = agent(0);

        agent.retire();
        assert!(!pit_due(&agent, 3, 50));
        assert!(!agent.enter_pit([0.0, 0.0], t0, PIT_DURATION));
        assert!(!agent.exit_pit(25));
        assert_eq!(agent.tire_laps(), 0);
    }
}
