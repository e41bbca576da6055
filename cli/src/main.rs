use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use log::{info, warn};
use racesim::core::handle_race::{create_race, run_race};
use racesim::core::race::Race;
use racesim::interfaces::advisory_interface::{consult, HeuristicAdvisor};
use racesim::interfaces::control_interface::OperatorCommand;
use racesim::interfaces::render_interface::RaceState;
use racesim::post::race_result::Winner;
use racesim::pre::read_sim_pars::{read_sim_pars, SimPars};
use racesim::pre::sim_opts::SimOpts;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufRead;
use std::thread;
use std::time::Instant;

/// Number of frames between two leaderboard prints in real-time mode.
const LEADERBOARD_PRINT_INTERVAL: u64 = 60;

const COMMAND_HELP: &str =
    "Commands: rain | dry | crash <id> <id> | pause | resume | p | tyres <id> <laps>";

/// run_headless simulates the inserted number of independent runs in parallel, every run with
/// its own seed, and returns the races in run order.
fn run_headless(sim_opts: &SimOpts, sim_pars: &SimPars) -> anyhow::Result<Vec<Race>> {
    if sim_opts.no_sim_runs == 0 {
        anyhow::bail!("Number of simulation runs must be positive!");
    }

    info!("Running {} simulation run(s) headless...", sim_opts.no_sim_runs);
    let t_start = Instant::now();

    let races = (0..sim_opts.no_sim_runs)
        .into_par_iter()
        .map(|run| -> anyhow::Result<Race> {
            let mut sim_pars_run = sim_pars.to_owned();
            sim_pars_run.race_pars.seed = sim_pars
                .race_pars
                .seed
                .map(|seed| seed.wrapping_add(u64::from(run)));

            let mut race = create_race(&sim_pars_run)?;
            run_race(
                &mut race,
                sim_opts.timestep_size,
                None,
                None,
                1.0,
                sim_opts.max_ticks,
            )
            .with_context(|| format!("Simulation run {} failed!", run))?;
            Ok(race)
        })
        .collect::<anyhow::Result<Vec<Race>>>()?;

    info!("Execution time: {}ms", t_start.elapsed().as_millis());

    if races.len() > 1 {
        let mut wins: BTreeMap<String, u32> = BTreeMap::new();
        for race in races.iter() {
            let key = match race.get_winner() {
                Winner::Agent { id, name } if race.is_finished() => format!("Agent {} ({})", id, name),
                Winner::Agent { .. } => String::from("Unfinished"),
                Winner::AllRetired => String::from("All DNF"),
            };
            *wins.entry(key).or_insert(0) += 1;
        }

        for (winner, count) in wins.iter() {
            info!("{}: {} of {} runs", winner, count, races.len());
        }
    }

    Ok(races)
}

/// run_realtime simulates the race in real time in a separate thread. Operator commands are read
/// from stdin, the leaderboard is printed to stdout.
fn run_realtime(sim_opts: &SimOpts, sim_pars: &SimPars) -> anyhow::Result<Race> {
    info!("Starting real-time simulation...");
    println!("{}", COMMAND_HELP);

    let (tx, rx) = flume::unbounded::<RaceState>();
    let (tx_cmd, rx_cmd) = flume::unbounded::<OperatorCommand>();

    let sim_opts_thread = sim_opts.to_owned();
    let sim_pars_thread = sim_pars.to_owned();

    let sim_handle = thread::spawn(move || -> anyhow::Result<Race> {
        let mut race = create_race(&sim_pars_thread)?;
        run_race(
            &mut race,
            sim_opts_thread.timestep_size,
            Some(&tx),
            Some(&rx_cmd),
            sim_opts_thread.realtime_factor,
            sim_opts_thread.max_ticks,
        )?;
        Ok(race)
    });

    // stdin reader, detached since reading blocks until the next line
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };

            if line.trim().is_empty() {
                continue;
            }

            match OperatorCommand::parse(&line) {
                Ok(command) => {
                    if tx_cmd.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    println!("{}", COMMAND_HELP);
                }
            }
        }
    });

    // the channel closes once the simulation thread has finished
    let mut last_printed = None;
    for race_state in rx.iter() {
        let print_key = (race_state.tick, race_state.paused);
        let due = race_state.tick % LEADERBOARD_PRINT_INTERVAL == 0
            || last_printed.map_or(true, |(_, paused)| paused != race_state.paused);

        if race_state.final_result.is_some() || (due && last_printed != Some(print_key)) {
            print_leaderboard(&race_state);
            last_printed = Some(print_key);
        }
    }

    sim_handle
        .join()
        .map_err(|_| anyhow::anyhow!("Simulation thread panicked!"))?
}

fn print_leaderboard(race_state: &RaceState) {
    let mut flags = String::new();
    if race_state.is_raining {
        flags.push_str(" [RAIN]");
    }
    if race_state.paused {
        flags.push_str(" [PAUSED]");
    }
    if race_state.finished {
        flags.push_str(" [FINISHED]");
    }

    println!(
        "Lap {}/{}{}",
        race_state.lap_counter.lap, race_state.lap_counter.tot_no_laps, flags
    );

    for entry in race_state.leaderboard.iter() {
        let heart_rate = entry
            .heart_rate
            .map(|hr| format!("{} bpm", hr))
            .unwrap_or_else(|| String::from("-"));
        let win_probability = entry
            .win_probability
            .map(|p| format!("{}%", p))
            .unwrap_or_else(|| String::from("-"));

        println!(
            "{:>2}. Agent {} {:<12} tyres {:>2}  {:<16} HR {:<8} win {}",
            entry.rank,
            entry.id,
            entry.name,
            entry.tire_laps,
            entry.status_text(),
            heart_rate,
            win_probability
        );
    }
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    let default_filter = if sim_opts.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // get simulation parameters
    let parfile_path = sim_opts
        .parfile_path
        .as_ref()
        .context("No parameter file provided! Use -p <path_to_json> to run the simulation.")?;
    info!("Reading simulation parameters from {}", parfile_path.display());
    let sim_pars = read_sim_pars(parfile_path)?;

    info!(
        "Simulating {} laps on {} with {} agents and a time step size of {:.4}s",
        sim_pars.race_pars.tot_no_laps,
        sim_pars.track_pars.name,
        sim_pars.agent_pars_all.len(),
        sim_opts.timestep_size
    );

    // EXECUTION -----------------------------------------------------------------------------------
    let race = if sim_opts.realtime {
        run_realtime(&sim_opts, &sim_pars)?
    } else {
        run_headless(&sim_opts, &sim_pars)?
            .into_iter()
            .next()
            .context("No simulation run finished!")?
    };

    // POST-PROCESSING -----------------------------------------------------------------------------
    let race_result = race.get_race_result();
    race_result.print_result()?;
    let result_path = race_result.write_result_to_file(sim_opts.result_out.as_deref())?;
    info!("Race result written to {}", result_path);

    if let Some(snapshot_out) = &sim_opts.snapshot_out {
        let fh = File::create(snapshot_out).with_context(|| {
            format!("Failed to create snapshot file {}!", snapshot_out.display())
        })?;
        serde_json::to_writer_pretty(fh, &race.get_advisory_snapshot(Utc::now()))
            .context("Failed to write advisory snapshot!")?;
        info!("Advisory snapshot written to {}", snapshot_out.display());
    }

    if let Some(question) = &sim_opts.advise {
        for line in consult(&HeuristicAdvisor, &race, question, Utc::now()) {
            println!("{}", line);
        }
    }

    Ok(())
}
