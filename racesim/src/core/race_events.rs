use crate::core::agent::Agent;
use crate::core::race::Race;
use crate::core::ranking::{rank_agents, rank_of};
use crate::post::race_result::RaceEventKind;
use log::{debug, info};

/// State of the cosmetic rain particle timer owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleTimer {
    Running,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherState {
    Dry,
    Rain(ParticleTimer),
}

impl Default for WeatherState {
    fn default() -> Self {
        WeatherState::Dry
    }
}

/// select_crash_victims returns the store indices of the agents caught in a crash between the two
/// target agents: every racing agent ranked strictly between them. If that band is empty (the
/// targets are adjacent, or one of them does not exist) the targets themselves are hit instead,
/// as long as they are racing.
pub fn select_crash_victims(
    agents: &[Agent],
    ranking: &[usize],
    target_a: u32,
    target_b: u32,
) -> Vec<usize> {
    let mut victims: Vec<usize> = match (
        rank_of(agents, ranking, target_a),
        rank_of(agents, ranking, target_b),
    ) {
        (Some(rank_a), Some(rank_b)) => {
            let rank_lower = rank_a.min(rank_b);
            let rank_upper = rank_a.max(rank_b);

            ranking
                .iter()
                .enumerate()
                .filter(|&(rank, &idx)| {
                    rank > rank_lower && rank < rank_upper && agents[idx].is_racing()
                })
                .map(|(_, &idx)| idx)
                .collect()
        }
        _ => Vec::new(),
    };

    if victims.is_empty() {
        victims = agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| {
                (agent.id == target_a || agent.id == target_b) && agent.is_racing()
            })
            .map(|(idx, _)| idx)
            .collect();
    }

    victims
}

impl Race {
    /// start_rain reduces the chaos factor of all agents and starts the cosmetic rain particle
    /// timer (suspended while the race is paused). No-op while raining or after the race has
    /// finished. Returns true if rain started.
    pub fn start_rain(&mut self) -> bool {
        if self.finished || self.is_raining() {
            debug!("Ignoring rain trigger (finished: {})", self.finished);
            return false;
        }

        self.chaos_factor = self.race_pars.rain_chaos_factor;
        self.weather_state = if self.paused {
            WeatherState::Rain(ParticleTimer::Suspended)
        } else {
            WeatherState::Rain(ParticleTimer::Running)
        };

        info!("Heavy rain, chaos factor is {:.2}", self.chaos_factor);
        self.push_event(RaceEventKind::RainStart, Vec::new());
        true
    }

    /// stop_rain restores the nominal chaos factor and stops the rain particle timer. Returns true
    /// if it was raining.
    pub fn stop_rain(&mut self) -> bool {
        if !self.clear_rain() {
            return false;
        }

        info!("Rain stopped");
        self.push_event(RaceEventKind::RainStop, Vec::new());
        true
    }

    fn clear_rain(&mut self) -> bool {
        if !self.is_raining() {
            return false;
        }

        self.weather_state = WeatherState::Dry;
        self.chaos_factor = 1.0;
        true
    }

    /// trigger_crash retires every racing agent ranked strictly between the two target agents
    /// (falling back to the targets themselves, see select_crash_victims). A crash silently ends
    /// any rain. No-op after the race has finished. Returns the ids of the retired agents.
    pub fn trigger_crash(&mut self, target_a: u32, target_b: u32) -> Vec<u32> {
        if self.finished {
            debug!("Ignoring crash trigger, race is finished");
            return Vec::new();
        }

        info!(
            "Crash triggered between agent {} and agent {}",
            target_a, target_b
        );
        self.clear_rain();

        let ranking = rank_agents(&self.agents);
        let victims = select_crash_victims(&self.agents, &ranking, target_a, target_b);
        let mut crashed = Vec::with_capacity(victims.len());

        for idx in victims {
            let agent = &mut self.agents[idx];
            if agent.retire() {
                info!("Agent {} ({}) caught in crash", agent.id, agent.name);
                crashed.push(agent.id);
            }
        }

        if crashed.is_empty() {
            info!("Nobody was caught in the crash");
        }

        self.ranking = rank_agents(&self.agents);
        self.push_event(RaceEventKind::Crash, crashed.to_owned());
        crashed
    }
}
