//! Transition table
//!
//! One row per (source state, command) pair that has a handler. Anything not
//! listed is ignored by the machine.
//!
//! Rows with `Target::Unchanged` are internal transitions: they run their
//! actions without exiting or re-entering the state, so a running play
//! activity survives them.

use plp_common::PlayerState;

use super::types::CommandKind;

/// Predicate evaluated before any action runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// LOAD payload is non-empty and every track has a location
    SongsValid,
    /// GO_TO_SONG index is inside the playlist
    SongInRange,
    /// GO_TO_SECOND target is inside the rendering track
    SecondInRange,
}

/// Transition actions, run after the source state's exit actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SetSongs,
    Pause,
    Stop,
    GoToSong,
    GoToSecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Unchanged,
    State(PlayerState),
}

#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub source: PlayerState,
    pub event: CommandKind,
    pub guard: Option<Guard>,
    pub actions: &'static [Action],
    pub target: Target,
}

impl Transition {
    /// State after this transition, starting from `source`
    pub fn resolve_target(&self) -> PlayerState {
        match self.target {
            Target::Unchanged => self.source,
            Target::State(state) => state,
        }
    }

    /// Whether the source state is exited (and the target entered)
    pub fn is_external(&self) -> bool {
        matches!(self.target, Target::State(_))
    }
}

const fn row(
    source: PlayerState,
    event: CommandKind,
    guard: Option<Guard>,
    actions: &'static [Action],
    target: Target,
) -> Transition {
    Transition {
        source,
        event,
        guard,
        actions,
        target,
    }
}

use CommandKind as C;
use PlayerState as S;

pub const TRANSITIONS: &[Transition] = &[
    row(S::Unloaded, C::Load, Some(Guard::SongsValid), &[Action::SetSongs], Target::State(S::Stopped)),
    row(S::Stopped, C::Play, None, &[], Target::State(S::Playing)),
    row(S::Playing, C::Pause, None, &[Action::Pause], Target::State(S::Paused)),
    row(S::Playing, C::Stop, None, &[Action::Stop], Target::State(S::Stopped)),
    row(S::Paused, C::Play, None, &[], Target::State(S::Playing)),
    // Stopping from pause discards the preserved position too
    row(S::Paused, C::Stop, None, &[Action::Stop], Target::State(S::Stopped)),
    row(S::Stopped, C::GoToSong, Some(Guard::SongInRange), &[Action::GoToSong], Target::Unchanged),
    row(S::Playing, C::GoToSong, Some(Guard::SongInRange), &[Action::GoToSong], Target::Unchanged),
    row(S::Paused, C::GoToSong, Some(Guard::SongInRange), &[Action::GoToSong], Target::Unchanged),
    row(S::Playing, C::GoToSecond, Some(Guard::SecondInRange), &[Action::GoToSecond], Target::Unchanged),
];

/// Find the handler for `event` in `source`, if any
pub fn lookup(source: PlayerState, event: CommandKind) -> Option<&'static Transition> {
    TRANSITIONS
        .iter()
        .find(|t| t.source == source && t.event == event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL_STATES: [PlayerState; 4] = [S::Unloaded, S::Stopped, S::Playing, S::Paused];

    #[test]
    fn test_rows_are_unique() {
        let mut seen = HashSet::new();
        for t in TRANSITIONS {
            assert!(
                seen.insert((t.source, t.event)),
                "duplicate row for {:?}/{:?}",
                t.source,
                t.event
            );
        }
    }

    #[test]
    fn test_load_only_from_unloaded() {
        for state in ALL_STATES {
            assert_eq!(lookup(state, C::Load).is_some(), state == S::Unloaded);
        }
        let load = lookup(S::Unloaded, C::Load).unwrap();
        assert_eq!(load.guard, Some(Guard::SongsValid));
        assert_eq!(load.resolve_target(), S::Stopped);
    }

    #[test]
    fn test_go_to_song_from_every_loaded_state() {
        for state in ALL_STATES {
            let transition = lookup(state, C::GoToSong);
            assert_eq!(transition.is_some(), state.is_loaded());
            if let Some(t) = transition {
                assert!(!t.is_external());
                assert_eq!(t.resolve_target(), state);
            }
        }
    }

    #[test]
    fn test_go_to_second_only_while_playing() {
        for state in ALL_STATES {
            assert_eq!(lookup(state, C::GoToSecond).is_some(), state == S::Playing);
        }
    }

    #[test]
    fn test_pause_and_stop_handlers() {
        assert_eq!(lookup(S::Playing, C::Pause).unwrap().resolve_target(), S::Paused);
        assert!(lookup(S::Paused, C::Pause).is_none());
        assert!(lookup(S::Stopped, C::Pause).is_none());

        assert_eq!(lookup(S::Playing, C::Stop).unwrap().resolve_target(), S::Stopped);
        assert_eq!(lookup(S::Paused, C::Stop).unwrap().resolve_target(), S::Stopped);
        assert!(lookup(S::Stopped, C::Stop).is_none());
    }

    #[test]
    fn test_play_enters_playing() {
        for state in [S::Stopped, S::Paused] {
            let play = lookup(state, C::Play).unwrap();
            assert!(play.is_external());
            assert_eq!(play.resolve_target(), S::Playing);
        }
        assert!(lookup(S::Playing, C::Play).is_none());
        assert!(lookup(S::Unloaded, C::Play).is_none());
    }
}
