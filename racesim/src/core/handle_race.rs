use crate::core::race::Race;
use crate::core::scheduler::{FrameOutcome, TickScheduler};
use crate::core::track::Track;
use crate::interfaces::control_interface::{OperatorCommand, ScriptedCommand};
use crate::interfaces::render_interface::RaceState;
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::{Receiver, Sender};
use log::{debug, info, warn};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// create_race loads the track and creates the race from the inserted parameters.
pub fn create_race(sim_pars: &SimPars) -> anyhow::Result<Race> {
    let track = Track::from_track_pars(&sim_pars.track_pars)?;
    let race = Race::new(&sim_pars.race_pars, track, &sim_pars.agent_pars_all)
        .context("Failed to create race from the simulation parameters!")?;
    Ok(race)
}

/// handle_race creates and simulates a race on the basis of the inserted parameters, and returns
/// the results for post-processing.
pub fn handle_race(
    sim_pars: &SimPars,
    timestep_size: f64,
    tx: Option<&Sender<RaceState>>,
    rx_cmd: Option<&Receiver<OperatorCommand>>,
    realtime_factor: f64,
    max_frames: Option<u64>,
) -> anyhow::Result<RaceResult> {
    let mut race = create_race(sim_pars)?;
    run_race(&mut race, timestep_size, tx, rx_cmd, realtime_factor, max_frames)
}

/// run_race simulates the inserted race until it stops.
///
/// If a sender is inserted, the race is simulated in real time and the race state is sent after
/// every frame. Otherwise the race runs as fast as possible on a virtual clock that advances by
/// `timestep_size` per frame. Operator commands are taken from the race's control script and
/// from the command receiver (if inserted) between two frames. The loop stops once the race is
/// finished, every agent is retired or `max_frames` frames were run. A headless race also stops
/// once it is paused with neither scripted commands left nor a connected command sender.
pub fn run_race(
    race: &mut Race,
    timestep_size: f64,
    tx: Option<&Sender<RaceState>>,
    rx_cmd: Option<&Receiver<OperatorCommand>>,
    realtime_factor: f64,
    max_frames: Option<u64>,
) -> anyhow::Result<RaceResult> {
    let sim_realtime = tx.is_some();
    let pacing_factor = if sim_realtime { realtime_factor } else { 1.0 };
    let mut scheduler = TickScheduler::new(timestep_size, pacing_factor)?;

    let mut control_script = race.race_pars.control_script.to_owned();
    control_script.sort_by_key(|scripted| scripted.tick);
    let mut script_idx = 0;

    let t_virtual_start = Instant::now();
    let mut last_logged_lap = 0;

    loop {
        if race.is_finished() {
            break;
        }

        if race.get_all_retired() {
            info!("All agents retired, stopping the race");
            break;
        }

        if max_frames.map_or(false, |max| scheduler.get_frames() >= max) {
            warn!(
                "Stopping unfinished race after {} frames (tick {})",
                scheduler.get_frames(),
                race.get_cur_tick()
            );
            break;
        }

        let t_frame_start = Instant::now();
        let frame = scheduler.get_frames() + 1;

        // operator commands
        script_idx += apply_scripted_commands(race, &control_script[script_idx..], frame);
        if let Some(rx_cmd) = rx_cmd {
            for command in rx_cmd.try_iter() {
                if let Err(e) = command.apply(race) {
                    warn!("Ignoring operator command {:?}: {}", command, e);
                }
            }
        }

        // a headless race paused for good would spin forever
        let resume_possible = script_idx < control_script.len()
            || rx_cmd.map_or(false, |rx_cmd| !rx_cmd.is_disconnected());
        if !sim_realtime && race.is_paused() && !resume_possible {
            warn!(
                "Stopping headless race paused at tick {} without a pending resume",
                race.get_cur_tick()
            );
            break;
        }

        let now = if sim_realtime {
            t_frame_start
        } else {
            t_virtual_start + Duration::from_secs_f64(frame as f64 * timestep_size)
        };

        match scheduler.run_frame(race, now) {
            FrameOutcome::Ticked(report) => {
                for agent_id in report.skipped_agents.iter() {
                    debug!("Agent {} skipped in tick {}", agent_id, report.tick);
                }
            }
            FrameOutcome::Paused => {}
            FrameOutcome::Stopped => break,
        }

        let display_lap = race.get_display_lap();
        if display_lap > last_logged_lap {
            info!(
                "Simulating... leader is on lap {}/{}",
                display_lap, race.race_pars.tot_no_laps
            );
            last_logged_lap = display_lap;
        }

        if let Some(tx) = tx {
            tx.send(race.get_race_state(now))
                .context("Failed to send race state to the render sink!")?;

            // sleep until the frame is finished in real time as well
            let t_sleep = scheduler.time_until_next_frame(Instant::now());
            if t_sleep > Duration::ZERO {
                sleep(t_sleep);
            } else if t_frame_start.elapsed() > scheduler.frame_duration() {
                warn!("Could not keep up with real-time!");
            }
        }
    }

    let result = race.get_race_result();

    // send final result once
    if let Some(tx) = tx {
        let mut final_state = race.get_race_state(Instant::now());
        final_state.final_result = Some(result.to_owned());
        tx.send(final_state)
            .context("Failed to send final race result to the render sink!")?;
    }

    Ok(result)
}

/// apply_scripted_commands applies the leading commands of a sorted script that are due in the
/// inserted frame and returns how many were consumed.
fn apply_scripted_commands(race: &mut Race, script: &[ScriptedCommand], frame: u64) -> usize {
    let due = script.iter().take_while(|scripted| scripted.tick <= frame).count();

    for scripted in script[..due].iter() {
        if let Err(e) = scripted.command.apply(race) {
            warn!(
                "Ignoring scripted command {:?} (frame {}): {}",
                scripted.command, scripted.tick, e
            );
        }
    }

    due
}
