//! Inbound commands and read-only player snapshots

use plp_common::{PlayerState, Track};
use serde::Serialize;

/// Commands accepted by the playback machine
///
/// A command the current state has no transition for, or whose payload
/// fails validation, is ignored without surfacing an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the playlist (only from `unloaded`)
    Load { tracks: Vec<Track> },
    /// Start or resume rendering
    Play,
    /// Halt rendering, keep position
    Pause,
    /// Halt rendering, discard position
    Stop,
    /// Select another track by index
    ///
    /// Signed so callers can pass `selected_index - 1` from index 0; any
    /// index outside the playlist is a no-op.
    GoToSong { next_song: i64 },
    /// Seek within the rendering track (only while `playing`)
    GoToSecond { second: Option<f64> },
}

/// Discriminant of a [`Command`], used as the transition table key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Load,
    Play,
    Pause,
    Stop,
    GoToSong,
    GoToSecond,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Load { .. } => CommandKind::Load,
            Command::Play => CommandKind::Play,
            Command::Pause => CommandKind::Pause,
            Command::Stop => CommandKind::Stop,
            Command::GoToSong { .. } => CommandKind::GoToSong,
            Command::GoToSecond { .. } => CommandKind::GoToSecond,
        }
    }

    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Load => "LOAD",
            CommandKind::Play => "PLAY",
            CommandKind::Pause => "PAUSE",
            CommandKind::Stop => "STOP",
            CommandKind::GoToSong => "GO_TO_SONG",
            CommandKind::GoToSecond => "GO_TO_SECOND",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Point-in-time copy of the machine's observable state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub state: PlayerState,
    pub tracks: Vec<Track>,
    pub selected_index: usize,
    /// Resume point in seconds
    pub saved_position: f64,
}

impl PlayerSnapshot {
    /// Whether a track with the same location is already in the playlist
    pub fn contains(&self, track: &Track) -> bool {
        self.tracks.iter().any(|t| t.same_location(track))
    }

    /// Index of the last track, None for an empty playlist
    pub fn last_index(&self) -> Option<usize> {
        self.tracks.len().checked_sub(1)
    }

    /// Currently selected track, if the index is in bounds
    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected_index)
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            state: PlayerState::Unloaded,
            tracks: Vec::new(),
            selected_index: 0,
            saved_position: 0.0,
        }
    }
}
