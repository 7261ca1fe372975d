//! Playback controller
//!
//! [`PlaybackMachine`] is the finite-state controller over
//! `unloaded -> stopped -> playing <-> paused`. [`PlayerService`] runs it on
//! its own task and hands out [`PlayerHandle`]s.

pub mod activity;
pub mod context;
pub mod events;
pub mod machine;
pub mod service;
pub mod transitions;
pub mod types;

pub use activity::{PlayActivity, TrackEndOutcome};
pub use context::PlaybackContext;
pub use events::ActivitySignal;
pub use machine::{MachineState, PlaybackMachine};
pub use service::{PlayerHandle, PlayerService};
pub use types::{Command, CommandKind, PlayerSnapshot};
