use crate::core::agent::{Agent, AgentPars};
use crate::core::pit_stop::pit_due;
use crate::core::race_events::{ParticleTimer, WeatherState};
use crate::core::ranking::{calc_display_lap, derive_leaderboard, rank_agents};
use crate::core::tireset::{calc_effective_speed, MIN_SPEED_FRACTION};
use crate::core::track::Track;
use crate::error::RaceError;
use crate::interfaces::advisory_interface::{AdvisorySnapshot, AgentSnapshot};
use crate::interfaces::control_interface::ScriptedCommand;
use crate::interfaces::render_interface::{AgentRenderState, LapCounter, RaceState};
use crate::post::race_result::{ClassificationEntry, RaceEvent, RaceEventKind, RaceResult, Winner};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Probability per tick that an agent's cosmetic heart rate variation is re-rolled.
const HR_REROLL_PROBABILITY: f64 = 0.1;

/// * `tot_no_laps` - Number of laps the leader has to complete
/// * `pit_threshold` - Agents pit automatically once their tyre laps drop to this value
/// * `fresh_tire_laps` - Tyre life after a pit stop
/// * `pit_duration_ms` - (ms) Wall-clock duration of a pit stop
/// * `rain_chaos_factor` - Speed multiplier while it is raining
/// * `seed` - Seed for the cosmetic jitter and the start field perturbation (random if not set)
/// * `speed_factor_sigma` - Standard deviation of a normal perturbation of the agents' speed
/// factors at race creation (0.0 disables the perturbation)
/// * `control_script` - Operator commands applied at given ticks
#[derive(Debug, Deserialize, Clone)]
pub struct RacePars {
    #[serde(default = "default_tot_no_laps")]
    pub tot_no_laps: u32,
    #[serde(default = "default_pit_threshold")]
    pub pit_threshold: u32,
    #[serde(default = "default_fresh_tire_laps")]
    pub fresh_tire_laps: u32,
    #[serde(default = "default_pit_duration_ms")]
    pub pit_duration_ms: u64,
    #[serde(default = "default_rain_chaos_factor")]
    pub rain_chaos_factor: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub speed_factor_sigma: f64,
    #[serde(default)]
    pub control_script: Vec<ScriptedCommand>,
}

fn default_tot_no_laps() -> u32 {
    50
}

fn default_pit_threshold() -> u32 {
    3
}

fn default_fresh_tire_laps() -> u32 {
    25
}

fn default_pit_duration_ms() -> u64 {
    2500
}

fn default_rain_chaos_factor() -> f64 {
    0.3
}

impl Default for RacePars {
    fn default() -> Self {
        RacePars {
            tot_no_laps: default_tot_no_laps(),
            pit_threshold: default_pit_threshold(),
            fresh_tire_laps: default_fresh_tire_laps(),
            pit_duration_ms: default_pit_duration_ms(),
            rain_chaos_factor: default_rain_chaos_factor(),
            seed: None,
            speed_factor_sigma: 0.0,
            control_script: Vec::new(),
        }
    }
}

/// TickReport summarizes what happened during one simulated tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub laps_completed: Vec<u32>,
    pub pits_entered: Vec<u32>,
    pub pits_exited: Vec<u32>,
    pub skipped_agents: Vec<u32>,
    pub finished: bool,
}

#[derive(Debug)]
pub struct Race {
    pub race_pars: RacePars,
    pub track: Track,
    pub(crate) agents: Vec<Agent>,
    pub(crate) ranking: Vec<usize>,
    pub(crate) chaos_factor: f64,
    pub(crate) weather_state: WeatherState,
    pub(crate) finished: bool,
    pub(crate) paused: bool,
    pub(crate) cur_tick: u64,
    pub(crate) events: Vec<RaceEvent>,
    rng: StdRng,
}

impl Race {
    pub fn new(
        race_pars: &RacePars,
        track: Track,
        agent_pars_all: &[AgentPars],
    ) -> Result<Race, RaceError> {
        if race_pars.tot_no_laps == 0 {
            return Err(RaceError::InvalidRacePars(String::from(
                "total number of laps must be positive",
            )));
        }

        if !(race_pars.rain_chaos_factor.is_finite() && race_pars.rain_chaos_factor >= 0.0) {
            return Err(RaceError::InvalidRacePars(format!(
                "rain chaos factor must not be negative, is {}",
                race_pars.rain_chaos_factor
            )));
        }

        if agent_pars_all.is_empty() {
            return Err(RaceError::NoAgents);
        }

        let mut ids = HashSet::with_capacity(agent_pars_all.len());
        for agent_pars in agent_pars_all.iter() {
            if !ids.insert(agent_pars.id) {
                return Err(RaceError::DuplicateAgentId(agent_pars.id));
            }
        }

        let mut rng = match race_pars.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // perturb the start field if requested
        let speed_noise = if race_pars.speed_factor_sigma > 0.0 {
            Some(
                Normal::new(0.0, race_pars.speed_factor_sigma)
                    .map_err(|e| RaceError::InvalidRacePars(e.to_string()))?,
            )
        } else {
            None
        };

        let start_point = track
            .point_at(0.0)
            .map_err(|_| RaceError::InvalidPathLength(track.length))?;

        let mut agents = Vec::with_capacity(agent_pars_all.len());

        for agent_pars in agent_pars_all.iter() {
            let mut agent_pars = agent_pars.to_owned();

            if let Some(normal) = &speed_noise {
                let base = agent_pars.speed_factor;
                agent_pars.speed_factor =
                    (base + normal.sample(&mut rng)).max(base * MIN_SPEED_FRACTION);
            }

            agents.push(Agent::new(&agent_pars, start_point)?);
        }

        let ranking = rank_agents(&agents);

        info!(
            "Race created on {} (length {:.1}) with {} agents over {} laps",
            track.name,
            track.length,
            agents.len(),
            race_pars.tot_no_laps
        );

        Ok(Race {
            race_pars: race_pars.to_owned(),
            track,
            agents,
            ranking,
            chaos_factor: 1.0,
            weather_state: WeatherState::Dry,
            finished: false,
            paused: false,
            cur_tick: 0,
            events: Vec::new(),
            rng,
        })
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// simulate_timestep performs one tick: finished pit stops are released, every agent is
    /// advanced, the ranking is recomputed and the race completion is checked. Returns None
    /// without touching the state if no tick is scheduled (race finished or paused).
    pub fn simulate_timestep(&mut self, now: Instant) -> Option<TickReport> {
        if !self.is_tick_scheduled() {
            return None;
        }

        self.cur_tick += 1;
        let mut report = TickReport {
            tick: self.cur_tick,
            ..Default::default()
        };

        // release agents whose pit stop deadline has passed
        self.handle_pit_exits(now, &mut report);

        // advance agents
        for idx in 0..self.agents.len() {
            self.advance_agent(idx, now, &mut report);
        }

        for &agent_id in report.pits_entered.iter() {
            self.push_event(RaceEventKind::PitEntry, vec![agent_id]);
        }

        self.update_hr_variations();

        // derive ranking and check for the end of the race
        self.ranking = rank_agents(&self.agents);
        report.finished = self.check_race_finished();

        Some(report)
    }

    // ---------------------------------------------------------------------------------------------
    // RACE SIMULATOR PARTS ------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn handle_pit_exits(&mut self, now: Instant, report: &mut TickReport) {
        let fresh_tire_laps = self.race_pars.fresh_tire_laps;

        for agent in self.agents.iter_mut() {
            if agent.check_pit_exit(now, fresh_tire_laps) {
                info!(
                    "Agent {} ({}) exited pits with fresh tyres ({} laps)",
                    agent.id,
                    agent.name,
                    agent.tire_laps()
                );
                report.pits_exited.push(agent.id);
            }
        }

        for &agent_id in report.pits_exited.iter() {
            self.push_event(RaceEventKind::PitExit, vec![agent_id]);
        }
    }

    /// advance_agent moves one agent along the track, handles lap completion, tyre wear and the
    /// automatic pit entry. Retired agents are frozen.
    fn advance_agent(&mut self, idx: usize, now: Instant, report: &mut TickReport) {
        let pit_duration = self.pit_duration();
        let pit_box = self.track.pit_box(self.agents[idx].id, idx);
        let agent = &mut self.agents[idx];

        if agent.is_dnf() {
            return;
        }

        let effective_speed = calc_effective_speed(
            agent.speed_factor(),
            agent.wear_factor(),
            agent.lap(),
            self.track.length,
            self.chaos_factor,
        );

        let update = match agent.sh.update_race_prog(effective_speed, &self.track) {
            Ok(update) => update,
            Err(e) => {
                warn!("Skipping agent {} in tick {}: {}", agent.id, self.cur_tick, e);
                report.skipped_agents.push(agent.id);
                return;
            }
        };

        // pitting agents stay parked in their pit box, agents leaving the pits are shown at their
        // pre-pit position until the next tick
        if !agent.is_pitting() && !report.pits_exited.contains(&agent.id) {
            agent.display_position = update.draw_point;
        }

        if !update.lap_completed {
            return;
        }

        agent.tireset.drive_lap();
        report.laps_completed.push(agent.id);
        debug!(
            "Agent {} completed lap {}, tyre laps left: {}",
            agent.id,
            agent.lap(),
            agent.tire_laps()
        );

        if pit_due(agent, self.race_pars.pit_threshold, self.race_pars.tot_no_laps)
            && agent.enter_pit(pit_box, now, pit_duration)
        {
            info!(
                "Agent {} ({}) entering pits after lap {}, tyre laps left: {}",
                agent.id,
                agent.name,
                agent.lap(),
                agent.tire_laps()
            );
            report.pits_entered.push(agent.id);
        }
    }

    fn update_hr_variations(&mut self) {
        for agent in self.agents.iter_mut().filter(|agent| agent.is_racing()) {
            if self.rng.gen_bool(HR_REROLL_PROBABILITY) {
                agent.hr_variation = self.rng.gen_range(-4..4);
            }
        }
    }

    /// check_race_finished marks the race as finished once the racing leader has completed the
    /// required number of laps. Returns true in the tick in which this happens.
    fn check_race_finished(&mut self) -> bool {
        if self.finished {
            return false;
        }

        let leader = match self.ranking.first() {
            Some(&idx) => &self.agents[idx],
            None => return false,
        };

        if leader.is_racing() && leader.lap() >= self.race_pars.tot_no_laps {
            info!(
                "Race finished! Leader (Agent {}, {}) reached {} laps",
                leader.id, leader.name, self.race_pars.tot_no_laps
            );
            let leader_id = leader.id;
            self.finished = true;
            self.push_event(RaceEventKind::Finished, vec![leader_id]);
            return true;
        }

        false
    }

    // ---------------------------------------------------------------------------------------------
    // OPERATOR CONTROLS ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// pause cancels the scheduling of further ticks and suspends the rain particle timer. Pit stop
    /// deadlines keep running in real time. Returns true if the race was paused.
    pub fn pause(&mut self) -> bool {
        if self.paused || self.finished {
            return false;
        }

        self.paused = true;
        if let WeatherState::Rain(ParticleTimer::Running) = self.weather_state {
            self.weather_state = WeatherState::Rain(ParticleTimer::Suspended);
        }

        info!("Race paused");
        self.push_event(RaceEventKind::Paused, Vec::new());
        true
    }

    /// resume schedules ticks again and restores the rain particle timer if it was active.
    pub fn resume(&mut self) -> bool {
        if !self.paused || self.finished {
            return false;
        }

        self.paused = false;
        if let WeatherState::Rain(ParticleTimer::Suspended) = self.weather_state {
            self.weather_state = WeatherState::Rain(ParticleTimer::Running);
        }

        info!("Race resumed");
        self.push_event(RaceEventKind::Resumed, Vec::new());
        true
    }

    /// set_tire_laps overrides the remaining tyre life of an agent. Negative values are clamped to
    /// zero. Retired agents are frozen, the override is ignored for them. Returns the tyre laps
    /// the agent has afterwards.
    pub fn set_tire_laps(&mut self, agent_id: u32, value: i64) -> Result<u32, RaceError> {
        let agent = self
            .agents
            .iter_mut()
            .find(|agent| agent.id == agent_id)
            .ok_or(RaceError::UnknownAgent(agent_id))?;

        if agent.is_dnf() {
            warn!("Ignoring tyre override for retired agent {}", agent_id);
            return Ok(agent.tire_laps());
        }

        if value < 0 {
            warn!(
                "Tyre override {} for agent {} is negative, clamping to 0",
                value, agent_id
            );
        }

        let tire_laps = agent.tireset.override_laps_left(value);
        info!("Agent {} tyre laps set to {}", agent_id, tire_laps);
        self.push_event(RaceEventKind::TireOverride, vec![agent_id]);
        Ok(tire_laps)
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub(crate) fn push_event(&mut self, kind: RaceEventKind, agents: Vec<u32>) {
        let lap = self.get_display_lap();
        self.events.push(RaceEvent {
            kind,
            tick: self.cur_tick,
            lap,
            agents,
        });
    }

    pub fn pit_duration(&self) -> Duration {
        Duration::from_millis(self.race_pars.pit_duration_ms)
    }

    pub fn is_tick_scheduled(&self) -> bool {
        !self.finished && !self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_raining(&self) -> bool {
        matches!(self.weather_state, WeatherState::Rain(_))
    }

    pub fn get_weather_state(&self) -> WeatherState {
        self.weather_state
    }

    pub fn get_chaos_factor(&self) -> f64 {
        self.chaos_factor
    }

    pub fn get_cur_tick(&self) -> u64 {
        self.cur_tick
    }

    pub fn get_agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get_agent(&self, agent_id: u32) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == agent_id)
    }

    /// get_ranking returns the store indices of the agents in race order as derived in the last
    /// tick (or by the last race event).
    pub fn get_ranking(&self) -> &[usize] {
        &self.ranking
    }

    /// get_ranked_ids returns the agent ids in race order.
    pub fn get_ranked_ids(&self) -> Vec<u32> {
        self.ranking.iter().map(|&idx| self.agents[idx].id).collect()
    }

    pub fn get_events(&self) -> &[RaceEvent] {
        &self.events
    }

    pub fn get_display_lap(&self) -> u32 {
        calc_display_lap(&self.agents, &self.ranking, self.race_pars.tot_no_laps)
    }

    /// get_all_retired checks if no agent is able to finish the race anymore.
    pub fn get_all_retired(&self) -> bool {
        self.agents.iter().all(|agent| agent.is_dnf())
    }

    /// get_winner returns the leader if it is racing, else the first racing agent in race order,
    /// else the information that all agents retired.
    pub fn get_winner(&self) -> Winner {
        self.ranking
            .iter()
            .map(|&idx| &self.agents[idx])
            .find(|agent| agent.is_racing())
            .map(|agent| Winner::Agent {
                id: agent.id,
                name: agent.name.to_owned(),
            })
            .unwrap_or(Winner::AllRetired)
    }

    /// get_race_state creates the render and leaderboard data for the current state.
    pub fn get_race_state(&self, now: Instant) -> RaceState {
        RaceState {
            tick: self.cur_tick,
            agent_states: self
                .agents
                .iter()
                .map(|agent| AgentRenderState {
                    id: agent.id,
                    color: agent.color.to_owned(),
                    display_position: agent.display_position,
                    status: agent.status_kind(),
                    pit_remaining_s: agent.pit_remaining(now).map(|t| t.as_secs_f64()),
                })
                .collect(),
            leaderboard: derive_leaderboard(&self.agents, &self.ranking, self.is_raining(), now),
            lap_counter: LapCounter {
                lap: self.get_display_lap(),
                tot_no_laps: self.race_pars.tot_no_laps,
            },
            is_raining: self.is_raining(),
            rain_particles_active: matches!(
                self.weather_state,
                WeatherState::Rain(ParticleTimer::Running)
            ),
            paused: self.paused,
            finished: self.finished,
            final_result: None,
        }
    }

    /// get_advisory_snapshot serializes the agent store for the strategy advisor.
    pub fn get_advisory_snapshot(&self, timestamp: DateTime<Utc>) -> AdvisorySnapshot {
        AdvisorySnapshot {
            timestamp,
            total_laps: self.race_pars.tot_no_laps,
            is_raining: self.is_raining(),
            agents: self
                .agents
                .iter()
                .map(|agent| AgentSnapshot {
                    id: agent.id,
                    name: agent.name.to_owned(),
                    lap: agent.lap(),
                    distance: agent.distance(),
                    status: agent.status_kind(),
                    speed_factor: agent.speed_factor(),
                    wear_factor: agent.wear_factor(),
                    tire_laps: agent.tire_laps(),
                })
                .collect(),
        }
    }

    pub fn get_race_result(&self) -> RaceResult {
        RaceResult {
            tot_no_laps: self.race_pars.tot_no_laps,
            ticks: self.cur_tick,
            finished: self.finished,
            winner: self.get_winner(),
            classification: self
                .ranking
                .iter()
                .enumerate()
                .map(|(i, &idx)| {
                    let agent = &self.agents[idx];
                    ClassificationEntry {
                        position: i + 1,
                        id: agent.id,
                        name: agent.name.to_owned(),
                        laps: agent.lap(),
                        status: agent.status_kind(),
                        pit_count: agent.pit_count(),
                    }
                })
                .collect(),
            events: self.events.to_owned(),
        }
    }
}
