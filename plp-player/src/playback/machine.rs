//! Playback state machine
//!
//! Owns the [`PlaybackContext`], the audio resource and, while `playing`,
//! the [`PlayActivity`]. Commands are looked up in the transition table; a
//! matching row runs in this order:
//!
//! 1. guard (on failure nothing happens)
//! 2. exit of the source state (external rows only; cancels the activity)
//! 3. transition actions
//! 4. entry of the target state (external rows only; `playing` prepares the
//!    resource and then starts a fresh activity)
//! 5. one state notification
//!
//! Every step completes before the next command or signal is looked at.

use plp_common::{EventBus, PlayerEvent, PlayerState, Track};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::activity::{PlayActivity, TrackEndOutcome};
use super::context::PlaybackContext;
use super::events::ActivitySignal;
use super::transitions::{self, Action, Guard, Transition};
use super::types::{Command, PlayerSnapshot};
use crate::audio::{AudioResource, ResourceSignal};

/// Current state, carrying the activity handle while playing
#[derive(Debug)]
pub enum MachineState {
    Unloaded,
    Stopped,
    Playing(PlayActivity),
    Paused,
}

impl MachineState {
    pub fn kind(&self) -> PlayerState {
        match self {
            MachineState::Unloaded => PlayerState::Unloaded,
            MachineState::Stopped => PlayerState::Stopped,
            MachineState::Playing(_) => PlayerState::Playing,
            MachineState::Paused => PlayerState::Paused,
        }
    }

    pub fn activity(&self) -> Option<&PlayActivity> {
        match self {
            MachineState::Playing(activity) => Some(activity),
            _ => None,
        }
    }
}

/// Finite-state playback controller
pub struct PlaybackMachine<R: AudioResource> {
    context: PlaybackContext,
    state: MachineState,
    resource: R,
    events: EventBus,
    /// Handed to each activity's forwarder
    signal_tx: mpsc::UnboundedSender<ActivitySignal>,
    next_generation: u64,
}

impl<R: AudioResource> PlaybackMachine<R> {
    /// Create a machine in `unloaded`
    ///
    /// Activity signals are delivered to the receiving half of `signal_tx`;
    /// the owner feeds them back through [`PlaybackMachine::handle_signal`].
    pub fn new(
        resource: R,
        events: EventBus,
        signal_tx: mpsc::UnboundedSender<ActivitySignal>,
    ) -> Self {
        Self {
            context: PlaybackContext::new(),
            state: MachineState::Unloaded,
            resource,
            events,
            signal_tx,
            next_generation: 0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state.kind()
    }

    pub fn context(&self) -> &PlaybackContext {
        &self.context
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Generation of the running activity, if playing
    pub fn activity_generation(&self) -> Option<u64> {
        self.state.activity().map(PlayActivity::generation)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.state(),
            tracks: self.context.tracks.clone(),
            selected_index: self.context.selected_index,
            saved_position: self.context.saved_position,
        }
    }

    /// Apply one command
    ///
    /// Returns true when a transition completed. Commands without a row for
    /// the current state, or failing their guard, are ignored.
    pub async fn dispatch(&mut self, command: Command) -> bool {
        let source = self.state();
        let Some(transition) = transitions::lookup(source, command.kind()) else {
            debug!("{} ignored in {} state", command.name(), source);
            return false;
        };

        if let Some(guard) = transition.guard {
            if !self.check_guard(guard, &command) {
                return false;
            }
        }

        self.run(transition, &command).await;
        true
    }

    async fn run(&mut self, transition: &Transition, command: &Command) {
        let target = transition.resolve_target();

        if transition.is_external() {
            self.exit().await;
        }

        for action in transition.actions {
            self.run_action(*action, command);
        }

        if transition.is_external() {
            self.enter(target);
            info!(
                "Playback state changed: {} -> {} ({})",
                transition.source,
                target,
                command.name()
            );
        } else {
            debug!("{} handled in {} state", command.name(), target);
        }

        self.publish_state();
    }

    fn check_guard(&self, guard: Guard, command: &Command) -> bool {
        match (guard, command) {
            (Guard::SongsValid, Command::Load { tracks }) => {
                if tracks.is_empty() {
                    debug!("LOAD rejected: empty playlist");
                    return false;
                }
                if let Some(position) = tracks.iter().position(|t| !t.has_location()) {
                    debug!("LOAD rejected: track {} has no location", position);
                    return false;
                }
                true
            }
            (Guard::SongInRange, Command::GoToSong { next_song }) => {
                let in_range = self.context.index_in_range(*next_song).is_some();
                if !in_range {
                    debug!(
                        "GO_TO_SONG {} outside playlist of {} tracks",
                        next_song,
                        self.context.tracks.len()
                    );
                }
                in_range
            }
            (Guard::SecondInRange, Command::GoToSecond { second }) => {
                match validate_second(*second, self.resource.duration()) {
                    Ok(_) => true,
                    Err(reason) => {
                        warn!("GO_TO_SECOND rejected: {}", reason);
                        false
                    }
                }
            }
            (guard, command) => {
                warn!("Guard {:?} does not apply to {}", guard, command.name());
                false
            }
        }
    }

    async fn exit(&mut self) {
        // Placeholder until enter() installs the target
        let previous = std::mem::replace(&mut self.state, MachineState::Stopped);
        if let MachineState::Playing(activity) = previous {
            activity.cancel(&mut self.context, &mut self.resource).await;
        }
    }

    fn enter(&mut self, target: PlayerState) {
        self.state = match target {
            PlayerState::Unloaded => MachineState::Unloaded,
            PlayerState::Stopped => MachineState::Stopped,
            PlayerState::Paused => MachineState::Paused,
            PlayerState::Playing => {
                self.prepare_play();
                self.next_generation += 1;
                MachineState::Playing(PlayActivity::start(
                    self.next_generation,
                    &mut self.context,
                    &self.resource,
                    self.signal_tx.clone(),
                ))
            }
        };
    }

    fn run_action(&mut self, action: Action, command: &Command) {
        match (action, command) {
            (Action::SetSongs, Command::Load { tracks }) => self.set_songs(tracks),
            (Action::Pause, _) => self.pause(),
            (Action::Stop, _) => self.stop(),
            (Action::GoToSong, Command::GoToSong { next_song }) => {
                if let Some(index) = self.context.index_in_range(*next_song) {
                    self.go_to_song(index);
                }
            }
            (Action::GoToSecond, Command::GoToSecond { second: Some(second) }) => {
                self.go_to_second(*second)
            }
            (action, command) => {
                warn!("Action {:?} does not apply to {}", action, command.name());
            }
        }
    }

    /// Replace the playlist; selection and position are left as they are
    fn set_songs(&mut self, tracks: &[Track]) {
        self.context.tracks = tracks.to_vec();
        info!("Loaded playlist of {} tracks", tracks.len());
    }

    /// Render the selected track from the saved position
    fn prepare_play(&mut self) {
        let Some(track) = self.context.selected_track() else {
            self.context.rewind();
            if let Some(first) = self.context.tracks.first() {
                let location = first.location.clone();
                if let Err(e) = self.resource.set_source(&location) {
                    warn!("Failed to assign source {}: {}", location, e);
                }
            }
            return;
        };

        let location = track.location.clone();
        let position = self.context.saved_position;
        if let Err(e) = self.resource.set_source(&location) {
            warn!("Failed to assign source {}: {}", location, e);
            return;
        }
        if let Err(e) = self.resource.seek(position) {
            warn!("Failed to seek {} to {:.3}s: {}", location, position, e);
        }
        if let Err(e) = self.resource.play() {
            warn!("Failed to start {}: {}", location, e);
        }
    }

    fn pause(&mut self) {
        if self.resource.is_rendering() {
            self.context.saved_position = self.resource.position();
        }
    }

    fn stop(&mut self) {
        self.context.saved_position = 0.0;
        if let Err(e) = self.resource.halt() {
            warn!("Failed to halt resource: {}", e);
        }
    }

    fn go_to_song(&mut self, index: usize) {
        self.context.selected_index = index;

        // A playing machine owns rendering even when the track just ran out
        let playing = matches!(self.state, MachineState::Playing(_));
        if !playing && !self.resource.is_rendering() {
            // Source is reassigned by the next PLAY
            self.context.saved_position = 0.0;
            return;
        }

        let location = self.context.tracks[index].location.clone();
        if let Err(e) = self.resource.halt() {
            warn!("Failed to halt resource: {}", e);
        }
        if let Err(e) = self.resource.set_source(&location) {
            warn!("Failed to assign source {}: {}", location, e);
            return;
        }
        if let Err(e) = self.resource.seek(0.0) {
            warn!("Failed to rewind {}: {}", location, e);
        }
        if let Err(e) = self.resource.play() {
            warn!("Failed to start {}: {}", location, e);
        }
    }

    fn go_to_second(&mut self, second: f64) {
        if let Err(e) = self.resource.seek(second) {
            warn!("Failed to seek to {:.3}s: {}", second, e);
        }
    }

    /// Apply a signal forwarded by a play activity
    ///
    /// Signals from an activity that is no longer running, or emitted for a
    /// source that has since been replaced, are dropped.
    pub async fn handle_signal(&mut self, signal: ActivitySignal) {
        let active = self
            .state
            .activity()
            .is_some_and(|activity| activity.generation() == signal.generation);
        if !active {
            debug!(
                "Dropping {:?} from inactive play activity {}",
                signal.signal, signal.generation
            );
            return;
        }

        let current_source = self.resource.source_id();
        if signal.signal.source() != current_source {
            debug!(
                "Dropping {:?}, source {} is now assigned",
                signal.signal, current_source
            );
            return;
        }

        let ended_source = match signal.signal {
            ResourceSignal::PositionAdvanced { .. } => {
                self.publish_time();
                return;
            }
            ResourceSignal::TrackEnded { source } => source,
        };
        let MachineState::Playing(activity) = &mut self.state else {
            return;
        };
        let outcome = activity.on_track_ended(ended_source, &mut self.context, &mut self.resource);

        match outcome {
            TrackEndOutcome::Advanced => {
                info!("Auto-advanced to track {}", self.context.selected_index);
                self.publish_state();
            }
            TrackEndOutcome::PlaylistFinished => {
                info!("End of playlist reached, stopping");
                self.dispatch(Command::Stop).await;
            }
        }
    }

    /// Cancel any running activity and hand back the resource
    pub async fn shutdown(mut self) -> R {
        if let MachineState::Playing(activity) = std::mem::replace(&mut self.state, MachineState::Stopped)
        {
            activity.cancel(&mut self.context, &mut self.resource).await;
        }
        self.resource
    }

    fn publish_state(&self) {
        self.events.emit_lossy(PlayerEvent::state_changed(
            self.state(),
            self.context.tracks.clone(),
            self.context.selected_index,
        ));
    }

    fn publish_time(&self) {
        self.events.emit_lossy(PlayerEvent::time_update(
            self.resource.position(),
            self.resource.duration().unwrap_or(0.0),
        ));
    }
}

/// Check a seek target against the current track's duration
fn validate_second(second: Option<f64>, duration: Option<f64>) -> Result<f64, String> {
    let second = second.ok_or_else(|| "no target second given".to_string())?;
    if !second.is_finite() {
        return Err(format!("{} is not a finite position", second));
    }
    let duration = duration.ok_or_else(|| "current track has no known duration".to_string())?;
    if !(0.0..=duration).contains(&second) {
        return Err(format!("{} is outside 0..={}", second, duration));
    }
    Ok(second)
}
