use crate::core::race::Race;
use crate::error::RaceError;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OperatorCommand is one of the operator controls of a running race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperatorCommand {
    StartRain,
    StopRain,
    TriggerCrash { target_a: u32, target_b: u32 },
    Pause,
    Resume,
    TogglePause,
    SetTireLaps { agent_id: u32, value: i64 },
}

/// ScriptedCommand applies an operator command right before the given frame of the host loop.
/// Frames keep counting while the race is paused, so a scripted pause can be followed by a
/// scripted resume. Without a pause, frame and tick numbers are the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedCommand {
    pub tick: u64,
    pub command: OperatorCommand,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}'")]
    Unknown(String),

    #[error("Command '{command}' expects {expected} argument(s)")]
    MissingArgument {
        command: String,
        expected: usize,
    },

    #[error("Could not parse argument '{0}' as an integer")]
    InvalidArgument(String),
}

fn parse_arg<T: std::str::FromStr>(arg: &str) -> Result<T, CommandParseError> {
    arg.parse::<T>()
        .map_err(|_| CommandParseError::InvalidArgument(arg.to_owned()))
}

impl OperatorCommand {
    /// parse reads a command from a line of operator input, e.g. "rain", "crash 2 4" or
    /// "tyres 1 10".
    pub fn parse(line: &str) -> Result<OperatorCommand, CommandParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (command, args) = match tokens.split_first() {
            Some((command, args)) => (command.to_lowercase(), args),
            None => return Err(CommandParseError::Empty),
        };

        let expect_args = |expected: usize| {
            if args.len() < expected {
                Err(CommandParseError::MissingArgument {
                    command: command.to_owned(),
                    expected,
                })
            } else {
                Ok(())
            }
        };

        match command.as_str() {
            "rain" | "start-rain" => Ok(OperatorCommand::StartRain),
            "dry" | "stop-rain" => Ok(OperatorCommand::StopRain),
            "pause" => Ok(OperatorCommand::Pause),
            "resume" => Ok(OperatorCommand::Resume),
            "p" => Ok(OperatorCommand::TogglePause),
            "crash" => {
                expect_args(2)?;
                Ok(OperatorCommand::TriggerCrash {
                    target_a: parse_arg(args[0])?,
                    target_b: parse_arg(args[1])?,
                })
            }
            "tyres" | "tires" => {
                expect_args(2)?;
                Ok(OperatorCommand::SetTireLaps {
                    agent_id: parse_arg(args[0])?,
                    value: parse_arg(args[1])?,
                })
            }
            _ => Err(CommandParseError::Unknown(command.to_owned())),
        }
    }

    /// apply executes the command on the race. Guarded commands (e.g. rain after the race has
    /// finished) are no-ops.
    pub fn apply(&self, race: &mut Race) -> Result<(), RaceError> {
        info!("Operator command: {:?}", self);

        match *self {
            OperatorCommand::StartRain => {
                race.start_rain();
            }
            OperatorCommand::StopRain => {
                race.stop_rain();
            }
            OperatorCommand::TriggerCrash { target_a, target_b } => {
                race.trigger_crash(target_a, target_b);
            }
            OperatorCommand::Pause => {
                race.pause();
            }
            OperatorCommand::Resume => {
                race.resume();
            }
            OperatorCommand::TogglePause => {
                if race.is_paused() {
                    race.resume();
                } else {
                    race.pause();
                }
            }
            OperatorCommand::SetTireLaps { agent_id, value } => {
                race.set_tire_laps(agent_id, value)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operator_input() {
        assert_eq!(OperatorCommand::parse("rain").unwrap(), OperatorCommand::StartRain);
        assert_eq!(OperatorCommand::parse(" DRY ").unwrap(), OperatorCommand::StopRain);
        assert_eq!(
            OperatorCommand::parse("crash 2 4").unwrap(),
            OperatorCommand::TriggerCrash {
                target_a: 2,
                target_b: 4
            }
        );
        assert_eq!(
            OperatorCommand::parse("tyres 1 -3").unwrap(),
            OperatorCommand::SetTireLaps {
                agent_id: 1,
                value: -3
            }
        );
        assert_eq!(OperatorCommand::parse("p").unwrap(), OperatorCommand::TogglePause);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(OperatorCommand::parse("   "), Err(CommandParseError::Empty));
        assert!(matches!(
            OperatorCommand::parse("crash 2"),
            Err(CommandParseError::MissingArgument { expected: 2, .. })
        ));
        assert!(matches!(
            OperatorCommand::parse("tyres one 3"),
            Err(CommandParseError::InvalidArgument(_))
        ));
        assert!(matches!(
            OperatorCommand::parse("boost"),
            Err(CommandParseError::Unknown(_))
        ));
    }

    #[test]
    fn scripted_commands_read_from_json() {
        let script: Vec<ScriptedCommand> = serde_json::from_str(
            r#"[
                {"tick": 600, "command": {"kind": "start_rain"}},
                {"tick": 900, "command": {"kind": "trigger_crash", "target_a": 2, "target_b": 4}}
            ]"#,
        )
        .unwrap();

        assert_eq!(script.len(), 2);
        assert_eq!(script[0].command, OperatorCommand::StartRain);
        assert_eq!(
            script[1].command,
            OperatorCommand::TriggerCrash {
                target_a: 2,
                target_b: 4
            }
        );
    }
}
