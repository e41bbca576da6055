mod common;

use approx::assert_relative_eq;
use common::{agent_pars, create_race, race_pars, track_length, Clock, LAP_TICKS_STEP_3};
use racesim::core::agent::StatusKind;
use racesim::post::race_result::RaceEventKind;

#[test]
fn lap_completion_wears_tyres() {
    let mut race = create_race(&race_pars(50), &[agent_pars(1, 3.0, 15)]);
    let mut clock = Clock::new(100);

    let report = clock.step_until(&mut race, 1000, |r| !r.laps_completed.is_empty());
    assert_eq!(report.tick, LAP_TICKS_STEP_3);

    let agent = race.get_agent(1).unwrap();
    assert_eq!(agent.lap(), 1);
    assert_eq!(agent.distance(), 0.0);
    assert_eq!(agent.tire_laps(), 14);

    clock.step_until(&mut race, 1000, |r| !r.laps_completed.is_empty());
    let agent = race.get_agent(1).unwrap();
    assert_eq!(agent.lap(), 2);
    assert_eq!(agent.tire_laps(), 13);
    assert!(!agent.is_pitting());
}

#[test]
fn distance_stays_within_the_lap() {
    let mut race = create_race(
        &race_pars(5),
        &[agent_pars(1, 3.0, 4), agent_pars(2, 2.2, 15), agent_pars(3, 4.1, 2)],
    );
    let mut clock = Clock::new(50);

    for _ in 0..3000 {
        clock.step(&mut race);
        for agent in race.get_agents().iter() {
            assert!(agent.distance() >= 0.0 && agent.distance() < track_length());
            assert!(agent.lap() <= race.race_pars.tot_no_laps + 1);
        }

        let mut ranked = race.get_ranked_ids();
        ranked.sort_unstable();
        assert_eq!(ranked, vec![1, 2, 3]);
    }
}

#[test]
fn worn_tyres_trigger_the_pit_in_the_same_tick() {
    let mut race = create_race(&race_pars(50), &[agent_pars(1, 3.0, 4)]);
    let mut clock = Clock::new(100);

    let report = clock.step_until(&mut race, 1000, |r| !r.laps_completed.is_empty());
    assert_eq!(report.pits_entered, vec![1]);

    let agent = race.get_agent(1).unwrap();
    assert_eq!(agent.tire_laps(), 3);
    assert_eq!(agent.status_kind(), StatusKind::Pitting);
    assert_eq!(agent.speed_factor(), 0.0);
    assert_eq!(agent.pit_count(), 1);
    assert_eq!(agent.display_position, race.track.pit_box(1, 0));

    let state = race.get_race_state(clock.now());
    assert_relative_eq!(state.leaderboard[0].pit_remaining_s.unwrap(), 2.5, epsilon = 1e-9);
    assert_eq!(state.leaderboard[0].heart_rate, None);
    assert_eq!(state.leaderboard[0].status_text(), "Pitting (2.5s)");

    let events = race.get_events();
    assert_eq!(events.last().unwrap().kind, RaceEventKind::PitEntry);
    assert_eq!(events.last().unwrap().agents, vec![1]);
}

#[test]
fn pit_stop_restores_speed_and_fits_fresh_tyres() {
    let mut race = create_race(&race_pars(50), &[agent_pars(1, 3.0, 4)]);
    let base_speed_factor = race.get_agent(1).unwrap().speed_factor();
    let mut clock = Clock::new(100);

    let entry = clock.step_until(&mut race, 1000, |r| !r.pits_entered.is_empty());

    // 2.5 s at 100 ms per frame
    for _ in 0..24 {
        let report = clock.step(&mut race).unwrap();
        assert!(report.pits_exited.is_empty());
        assert_eq!(race.get_agent(1).unwrap().distance(), 0.0);
    }

    let report = clock.step(&mut race).unwrap();
    assert_eq!(report.tick, entry.tick + 25);
    assert_eq!(report.pits_exited, vec![1]);

    let agent = race.get_agent(1).unwrap();
    assert!(agent.is_racing());
    assert_eq!(agent.tire_laps(), 25);
    assert_relative_eq!(agent.speed_factor(), base_speed_factor);
    // the agent moves again in the exit tick
    assert_relative_eq!(agent.distance(), 3.0, epsilon = 1e-9);

    // shown at the position it was drawn at when entering the pits
    let pre_pit_point = race.track.point_at(3.0 * LAP_TICKS_STEP_3 as f64).unwrap();
    assert_relative_eq!(agent.display_position[0], pre_pit_point[0], epsilon = 1e-6);
    assert_relative_eq!(agent.display_position[1], pre_pit_point[1], epsilon = 1e-6);

    // the next tick redraws it from its distance
    clock.step(&mut race).unwrap();
    let agent = race.get_agent(1).unwrap();
    let point = race.track.point_at(6.0).unwrap();
    assert_relative_eq!(agent.display_position[0], point[0], epsilon = 1e-6);
    assert_relative_eq!(agent.display_position[1], point[1], epsilon = 1e-6);
}

#[test]
fn pit_entry_is_logged_before_the_finish() {
    // agent 2 completes its first lap in the tick in which agent 1 wins
    let mut race = create_race(&race_pars(2), &[agent_pars(1, 3.0, 15), agent_pars(2, 1.496, 4)]);
    let mut clock = Clock::new(100);

    let report = clock.step_until(&mut race, 2000, |r| r.finished);
    assert_eq!(report.tick, 2 * LAP_TICKS_STEP_3);
    assert_eq!(report.pits_entered, vec![2]);

    let kinds: Vec<RaceEventKind> = race.get_events().iter().map(|event| event.kind).collect();
    assert_eq!(kinds, vec![RaceEventKind::PitEntry, RaceEventKind::Finished]);
}

#[test]
fn pit_timer_keeps_running_while_paused() {
    let mut race = create_race(&race_pars(50), &[agent_pars(1, 3.0, 4)]);
    let mut clock = Clock::new(100);

    clock.step_until(&mut race, 1000, |r| !r.pits_entered.is_empty());
    assert!(race.pause());
    assert!(race.is_paused());

    // 3 s pass without any tick
    for _ in 0..30 {
        assert_eq!(clock.step(&mut race), None);
    }
    assert!(race.get_agent(1).unwrap().is_pitting());

    assert!(race.resume());
    let report = clock.step(&mut race).unwrap();
    assert_eq!(report.pits_exited, vec![1]);
    assert_eq!(race.get_agent(1).unwrap().tire_laps(), 25);
}

#[test]
fn no_pit_stop_on_the_deciding_lap() {
    let mut race = create_race(&race_pars(1), &[agent_pars(1, 3.0, 4)]);
    let mut clock = Clock::new(100);

    let report = clock.step_until(&mut race, 1000, |r| !r.laps_completed.is_empty());
    assert!(report.finished);
    assert!(report.pits_entered.is_empty());
    assert!(race.get_agent(1).unwrap().is_racing());
}

#[test]
fn tyre_override_feeds_the_pit_trigger() {
    let mut race = create_race(&race_pars(50), &[agent_pars(1, 3.0, 15), agent_pars(2, 2.0, 15)]);
    let mut clock = Clock::new(100);

    assert_eq!(race.set_tire_laps(1, 4), Ok(4));
    assert_eq!(race.set_tire_laps(2, -7), Ok(0));
    assert_eq!(
        race.set_tire_laps(99, 5),
        Err(racesim::error::RaceError::UnknownAgent(99))
    );
    assert_eq!(
        race.get_events()
            .iter()
            .filter(|event| event.kind == RaceEventKind::TireOverride)
            .count(),
        2
    );

    let report = clock.step_until(&mut race, 1000, |r| r.laps_completed.contains(&1));
    assert_eq!(report.pits_entered, vec![1]);

    // worn out tyres stay at 0 and pit the agent as well
    let report = clock.step_until(&mut race, 1000, |r| r.laps_completed.contains(&2));
    assert_eq!(race.get_agent(2).unwrap().tire_laps(), 0);
    assert_eq!(report.pits_entered, vec![2]);
}
