//! Interactive console commands
//!
//! One command per line, words separated by whitespace:
//!
//! ```text
//! load <location>...   replace the playlist (only before the first load)
//! play | pause | stop
//! next | prev
//! song <index>         jump to a track
//! seek <seconds>       jump within the playing track
//! list | status | help | quit
//! ```

use plp_common::Track;

use crate::error::{Error, Result};
use crate::playback::Command;

pub const HELP: &str = "\
Commands:
  load <location>...  load a playlist
  play                start or resume playback
  pause               pause playback
  stop                stop playback
  next | prev         select the following / preceding track
  song <index>        select a track by index
  seek <seconds>      seek within the playing track
  list                show the playlist
  status              show the player state
  help                show this help
  quit                exit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Player(Command),
    Next,
    Previous,
    List,
    Status,
    Help,
    Quit,
}

/// Parse one line of input; blank lines yield None
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "load" => {
            if args.is_empty() {
                return Err(Error::InvalidCommand(
                    "load needs at least one location".to_string(),
                ));
            }
            ConsoleCommand::Player(Command::Load {
                tracks: args.iter().map(|location| Track::from_location(*location)).collect(),
            })
        }
        "play" => no_args(verb, &args, ConsoleCommand::Player(Command::Play))?,
        "pause" => no_args(verb, &args, ConsoleCommand::Player(Command::Pause))?,
        "stop" => no_args(verb, &args, ConsoleCommand::Player(Command::Stop))?,
        "next" => no_args(verb, &args, ConsoleCommand::Next)?,
        "prev" | "previous" => no_args(verb, &args, ConsoleCommand::Previous)?,
        "song" => {
            let index = single_arg(verb, &args)?;
            let next_song = index
                .parse::<i64>()
                .map_err(|_| Error::InvalidCommand(format!("not a track index: {}", index)))?;
            ConsoleCommand::Player(Command::GoToSong { next_song })
        }
        "seek" => {
            let value = single_arg(verb, &args)?;
            let second = value
                .parse::<f64>()
                .map_err(|_| Error::InvalidCommand(format!("not a number of seconds: {}", value)))?;
            ConsoleCommand::Player(Command::GoToSecond {
                second: Some(second),
            })
        }
        "list" => no_args(verb, &args, ConsoleCommand::List)?,
        "status" => no_args(verb, &args, ConsoleCommand::Status)?,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(Error::InvalidCommand(format!("unknown command: {}", other))),
    };

    Ok(Some(command))
}

fn no_args(verb: &str, args: &[&str], command: ConsoleCommand) -> Result<ConsoleCommand> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(Error::InvalidCommand(format!("{} takes no arguments", verb)))
    }
}

fn single_arg<'a>(verb: &str, args: &[&'a str]) -> Result<&'a str> {
    match args {
        [arg] => Ok(*arg),
        _ => Err(Error::InvalidCommand(format!("{} takes exactly one argument", verb))),
    }
}
