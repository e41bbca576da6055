use crate::core::agent::StatusKind;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::io::Write as IoWrite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceEventKind {
    RainStart,
    RainStop,
    Crash,
    PitEntry,
    PitExit,
    TireOverride,
    Paused,
    Resumed,
    Finished,
}

/// RaceEvent is an entry of the race event log.
///
/// * `kind` - Type of the event
/// * `tick` - Tick in which the event happened (0 before the first tick)
/// * `lap` - Lap shown by the lap counter when the event happened
/// * `agents` - Affected agents, e.g. the agents retired in a crash
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RaceEvent {
    pub kind: RaceEventKind,
    pub tick: u64,
    pub lap: u32,
    pub agents: Vec<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub enum Winner {
    Agent { id: u32, name: String },
    AllRetired,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClassificationEntry {
    pub position: usize,
    pub id: u32,
    pub name: String,
    pub laps: u32,
    pub status: StatusKind,
    pub pit_count: u32,
}

/// RaceResult contains all race information that is required for post-processing the results.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RaceResult {
    pub tot_no_laps: u32,
    pub ticks: u64,
    pub finished: bool,
    pub winner: Winner,
    pub classification: Vec<ClassificationEntry>,
    pub events: Vec<RaceEvent>,
}

impl RaceResult {
    /// format_result creates the human readable classification and event log.
    pub fn format_result(&self) -> Result<String, std::fmt::Error> {
        let mut content = String::new();

        match &self.winner {
            Winner::Agent { id, name } if self.finished => {
                writeln!(&mut content, "RACE FINISHED! Winner: Agent {} ({})", id, name)?
            }
            Winner::Agent { id, name } => writeln!(
                &mut content,
                "RACE NOT FINISHED after {} ticks, leading: Agent {} ({})",
                self.ticks, id, name
            )?,
            Winner::AllRetired => writeln!(&mut content, "RACE FINISHED! (All DNF)")?,
        }

        writeln!(&mut content, "RESULT: Classification")?;
        writeln!(&mut content, "pos,  id, name                , laps, status , pits")?;
        for entry in self.classification.iter() {
            let status = match entry.status {
                StatusKind::Racing => "Racing",
                StatusKind::Pitting => "Pitting",
                StatusKind::Dnf => "DNF",
            };
            writeln!(
                &mut content,
                "{:3}, {:3}, {:20}, {:4}, {:7}, {:4}",
                entry.position, entry.id, entry.name, entry.laps, status, entry.pit_count
            )?;
        }

        writeln!(&mut content, "RESULT: Race events")?;
        for event in self.events.iter() {
            writeln!(
                &mut content,
                "tick {:7}, lap {:3}: {:?} {:?}",
                event.tick, event.lap, event.kind, event.agents
            )?;
        }

        Ok(content)
    }

    /// write_result_to_file writes the classification and event log to a text file (default
    /// output/last_run.txt). Returns the path to the written file.
    pub fn write_result_to_file(&self, path: Option<&std::path::Path>) -> anyhow::Result<String> {
        let content = self.format_result()?;

        let out_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let out_dir = std::path::Path::new("output");
                std::fs::create_dir_all(out_dir)?;
                out_dir.join("last_run.txt")
            }
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(out_path.to_string_lossy().into_owned())
    }

    /// print_result prints the classification and event log to the console output.
    pub fn print_result(&self) -> Result<(), std::fmt::Error> {
        print!("{}", self.format_result()?);
        Ok(())
    }

    /// count_events returns how often an event of the given kind happened.
    pub fn count_events(&self, kind: RaceEventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }
}
