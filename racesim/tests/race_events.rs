mod common;

use approx::assert_relative_eq;
use common::{agent_pars, create_race, race_pars, Clock};
use racesim::core::race::Race;
use racesim::core::race_events::{ParticleTimer, WeatherState};
use racesim::post::race_result::{RaceEventKind, Winner};

/// four agents that are ranked 1, 2, 3, 4 after the first tick
fn four_agent_race() -> (Race, Clock) {
    let mut race = create_race(
        &race_pars(50),
        &[
            agent_pars(1, 3.0, 15),
            agent_pars(2, 2.5, 15),
            agent_pars(3, 2.0, 15),
            agent_pars(4, 1.5, 15),
        ],
    );
    let mut clock = Clock::new(100);

    for _ in 0..10 {
        clock.step(&mut race);
    }
    assert_eq!(race.get_ranked_ids(), vec![1, 2, 3, 4]);

    (race, clock)
}

#[test]
fn crash_retires_the_agents_between_the_targets() {
    let (mut race, mut clock) = four_agent_race();

    let crashed = race.trigger_crash(4, 1);
    assert_eq!(crashed, vec![2, 3]);
    assert!(race.get_agent(2).unwrap().is_dnf());
    assert!(race.get_agent(3).unwrap().is_dnf());
    assert_eq!(race.get_agent(2).unwrap().speed_factor(), 0.0);
    assert!(race.get_agent(1).unwrap().is_racing());
    assert!(race.get_agent(4).unwrap().is_racing());

    // retired agents are ranked last, in store order
    assert_eq!(race.get_ranked_ids(), vec![1, 4, 2, 3]);

    let event = race.get_events().last().unwrap();
    assert_eq!(event.kind, RaceEventKind::Crash);
    assert_eq!(event.agents, vec![2, 3]);

    // retired agents are frozen
    let distance_2 = race.get_agent(2).unwrap().distance();
    for _ in 0..500 {
        clock.step(&mut race);
    }
    let agent_2 = race.get_agent(2).unwrap();
    assert_eq!(agent_2.distance(), distance_2);
    assert_eq!(agent_2.lap(), 0);
    assert!(agent_2.is_dnf());

    // so is their tyre life
    assert_eq!(race.set_tire_laps(2, 3), Ok(15));
    assert_eq!(race.get_agent(2).unwrap().tire_laps(), 15);
}

#[test]
fn crash_of_adjacent_targets_hits_the_targets() {
    let (mut race, _) = four_agent_race();

    let crashed = race.trigger_crash(2, 3);
    assert_eq!(crashed, vec![2, 3]);
    assert_eq!(race.get_ranked_ids(), vec![1, 4, 2, 3]);
}

#[test]
fn crash_with_an_unknown_target_hits_the_known_one() {
    let (mut race, _) = four_agent_race();

    assert_eq!(race.trigger_crash(1, 99), vec![1]);
    assert!(race.get_agent(1).unwrap().is_dnf());
    assert_eq!(race.get_ranked_ids(), vec![2, 3, 4, 1]);
}

#[test]
fn crash_band_skips_retired_agents() {
    let (mut race, _) = four_agent_race();

    assert_eq!(race.trigger_crash(2, 3), vec![2, 3]);
    // ranking is now [1, 4, 2, 3], the band between 1 and 3 only holds retired agents and 4
    assert_eq!(race.trigger_crash(1, 3), vec![4]);
    assert!(!race.get_all_retired());
    assert!(race.get_agent(1).unwrap().is_racing());
}

#[test]
fn crash_ends_rain_silently() {
    let (mut race, _) = four_agent_race();

    assert!(race.start_rain());
    race.trigger_crash(1, 3);

    assert!(!race.is_raining());
    assert_relative_eq!(race.get_chaos_factor(), 1.0);
    let result = race.get_race_result();
    assert_eq!(result.count_events(RaceEventKind::RainStart), 1);
    assert_eq!(result.count_events(RaceEventKind::RainStop), 0);
}

#[test]
fn rain_scales_progress_by_the_chaos_factor() {
    let (mut dry, mut clock_dry) = four_agent_race();
    let (mut wet, mut clock_wet) = four_agent_race();
    let d0_dry = dry.get_agent(1).unwrap().distance();
    let d0_wet = wet.get_agent(1).unwrap().distance();

    assert!(wet.start_rain());
    assert!(!wet.start_rain());
    assert_relative_eq!(wet.get_chaos_factor(), 0.3);

    for _ in 0..20 {
        clock_dry.step(&mut dry);
        clock_wet.step(&mut wet);
    }

    let progress_dry = dry.get_agent(1).unwrap().distance() - d0_dry;
    let progress_wet = wet.get_agent(1).unwrap().distance() - d0_wet;
    assert_relative_eq!(progress_wet, 0.3 * progress_dry, epsilon = 1e-9);

    let state = wet.get_race_state(clock_wet.now());
    assert!(state.is_raining);
    assert!(state.rain_particles_active);
    // leader heart rate in the rain, jitter stays within [-4, 3]
    let hr = state.leaderboard[0].heart_rate.unwrap();
    assert!((131..=138).contains(&hr));

    assert!(wet.stop_rain());
    assert!(!wet.stop_rain());
    assert_relative_eq!(wet.get_chaos_factor(), 1.0);
    assert_eq!(wet.get_race_result().count_events(RaceEventKind::RainStart), 1);
    assert_eq!(wet.get_race_result().count_events(RaceEventKind::RainStop), 1);
}

#[test]
fn rain_particles_follow_pause_and_resume() {
    let (mut race, _) = four_agent_race();

    assert!(race.pause());
    assert!(race.start_rain());
    assert_eq!(
        race.get_weather_state(),
        WeatherState::Rain(ParticleTimer::Suspended)
    );

    assert!(race.resume());
    assert_eq!(race.get_weather_state(), WeatherState::Rain(ParticleTimer::Running));

    assert!(race.pause());
    assert_eq!(
        race.get_weather_state(),
        WeatherState::Rain(ParticleTimer::Suspended)
    );
    assert!(!race.pause());
}

#[test]
fn crashing_every_agent_leaves_no_winner() {
    let mut race = create_race(&race_pars(50), &[agent_pars(1, 3.0, 15), agent_pars(2, 2.0, 15)]);
    let mut clock = Clock::new(100);
    clock.step(&mut race);

    assert_eq!(race.trigger_crash(1, 2), vec![1, 2]);
    assert!(race.get_all_retired());
    assert_eq!(race.get_winner(), Winner::AllRetired);
    assert_eq!(race.get_display_lap(), 0);

    let state = race.get_race_state(clock.now());
    assert!(state.leaderboard.iter().all(|entry| entry.win_probability.is_none()));
    assert!(race
        .get_race_result()
        .format_result()
        .unwrap()
        .contains("(All DNF)"));
}
