//! Play activity
//!
//! Lives for exactly one stay in `playing`. Started on entry right after the
//! resource has been told to render, cancelled on exit whatever the cause.
//!
//! While running, a forwarder task holds the only resource listener owned by
//! the machine and relays each signal, tagged with the activity generation,
//! to the event loop. The loop owns the context, so every mutation still
//! happens there, one item at a time.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::context::PlaybackContext;
use super::events::ActivitySignal;
use crate::audio::{AudioResource, ResourceSignal};

/// Outcome of a track-ended signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEndOutcome {
    /// The next track is rendering
    Advanced,
    /// Nothing left to play; the index is back at 0 and the machine must stop
    PlaylistFinished,
}

/// Handle to the running activity
#[derive(Debug)]
pub struct PlayActivity {
    generation: u64,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
    /// Source assignment whose track-ended signal has been applied
    ended_source: Option<u64>,
}

impl PlayActivity {
    /// Start the activity for `generation`
    ///
    /// With the selection out of bounds nothing is subscribed and the index
    /// is reset to 0.
    pub fn start<R: AudioResource>(
        generation: u64,
        context: &mut PlaybackContext,
        resource: &R,
        signal_tx: mpsc::UnboundedSender<ActivitySignal>,
    ) -> Self {
        let token = CancellationToken::new();

        let task = if context.selected_in_bounds() {
            let rx = resource.subscribe();
            Some(tokio::spawn(forward_signals(
                generation,
                rx,
                signal_tx,
                token.clone(),
            )))
        } else {
            debug!("Play activity started without a track, nothing to listen to");
            context.selected_index = 0;
            None
        };

        Self {
            generation,
            token,
            task,
            ended_source: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a resource listener is attached
    pub fn is_listening(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Tear down the activity
    ///
    /// Returns once the listener is detached, rendering is halted and the
    /// current position is saved back into the context.
    ///
    /// A source that finished before its track-ended signal was applied
    /// still counts as ended: the selection moves on and the saved position
    /// is 0, as if the signal had arrived first.
    pub async fn cancel<R: AudioResource>(mut self, context: &mut PlaybackContext, resource: &mut R) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Play activity forwarder ended abnormally: {}", e);
            }
        }

        let pending_end =
            resource.source_finished() && self.ended_source != Some(resource.source_id());

        if let Err(e) = resource.halt() {
            warn!("Failed to halt resource on play activity exit: {}", e);
        }
        context.saved_position = resource.position();

        if pending_end && !context.tracks.is_empty() {
            context.selected_index = (context.selected_index + 1) % context.tracks.len();
            context.saved_position = 0.0;
            debug!(
                "Track ended before play activity {} exit, selecting track {}",
                self.generation, context.selected_index
            );
        }
        debug!(
            "Play activity {} cancelled at {:.3}s",
            self.generation, context.saved_position
        );
    }

    /// Handle a track-ended signal for source assignment `source`
    pub fn on_track_ended<R: AudioResource>(
        &mut self,
        source: u64,
        context: &mut PlaybackContext,
        resource: &mut R,
    ) -> TrackEndOutcome {
        self.ended_source = Some(source);
        context.selected_index += 1;

        let Some(track) = context.selected_track() else {
            context.selected_index = 0;
            return TrackEndOutcome::PlaylistFinished;
        };

        let location = track.location.clone();
        debug!("Advancing to track {} ({})", context.selected_index, location);
        if let Err(e) = resource.set_source(&location) {
            warn!("Failed to assign next track {}: {}", location, e);
        } else if let Err(e) = resource.play() {
            warn!("Failed to start next track {}: {}", location, e);
        }
        TrackEndOutcome::Advanced
    }
}

/// Relay resource signals until cancelled or the stream closes
async fn forward_signals(
    generation: u64,
    mut rx: broadcast::Receiver<ResourceSignal>,
    signal_tx: mpsc::UnboundedSender<ActivitySignal>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            received = rx.recv() => match received {
                Ok(signal) => {
                    if signal_tx.send(ActivitySignal { generation, signal }).is_err() {
                        // Event loop is gone
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Play activity lagged, {} resource signals skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!("Resource signal stream closed, auto-advance disabled until next play");
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SimulatedResource;
    use plp_common::Track;

    fn context_with(len: usize) -> PlaybackContext {
        PlaybackContext {
            tracks: (0..len)
                .map(|i| Track::from_location(format!("{}.mp3", i)))
                .collect(),
            selected_index: 0,
            saved_position: 0.0,
        }
    }

    #[tokio::test]
    async fn test_start_out_of_bounds_skips_subscription() {
        let resource = SimulatedResource::new(10.0);
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut context = context_with(2);
        context.selected_index = 2;

        let activity = PlayActivity::start(1, &mut context, &resource, tx);
        assert_eq!(context.selected_index, 0);
        assert!(!activity.is_listening());
        assert_eq!(resource.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_forwards_tagged_signals() {
        let mut resource = SimulatedResource::new(10.0);
        resource.set_source("0.mp3").unwrap();
        resource.play().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut context = context_with(1);

        let activity = PlayActivity::start(7, &mut context, &resource, tx);
        assert_eq!(resource.listener_count(), 1);

        resource.advance(1.0);
        let forwarded = rx.recv().await.unwrap();
        assert_eq!(
            forwarded,
            ActivitySignal {
                generation: 7,
                signal: ResourceSignal::PositionAdvanced {
                    source: resource.source_id()
                }
            }
        );

        activity.cancel(&mut context, &mut resource).await;
    }

    #[tokio::test]
    async fn test_cancel_detaches_and_saves_position() {
        let mut resource = SimulatedResource::new(10.0);
        resource.set_source("0.mp3").unwrap();
        resource.play().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut context = context_with(1);

        let activity = PlayActivity::start(1, &mut context, &resource, tx);
        resource.advance(3.5);

        activity.cancel(&mut context, &mut resource).await;
        assert_eq!(resource.listener_count(), 0);
        assert!(!resource.is_rendering());
        assert_eq!(context.saved_position, 3.5);
    }

    #[tokio::test]
    async fn test_track_ended_advances_then_finishes() {
        let mut resource = SimulatedResource::new(10.0);
        resource.set_source("0.mp3").unwrap();
        resource.play().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut context = context_with(2);

        let mut activity = PlayActivity::start(1, &mut context, &resource, tx);

        resource.advance(10.0);
        assert_eq!(
            activity.on_track_ended(resource.source_id(), &mut context, &mut resource),
            TrackEndOutcome::Advanced
        );
        assert_eq!(context.selected_index, 1);
        assert_eq!(resource.source().as_deref(), Some("1.mp3"));
        assert!(resource.is_rendering());

        resource.advance(10.0);
        assert_eq!(
            activity.on_track_ended(resource.source_id(), &mut context, &mut resource),
            TrackEndOutcome::PlaylistFinished
        );
        assert_eq!(context.selected_index, 0);

        // Already applied, so leaving does not move the selection again
        activity.cancel(&mut context, &mut resource).await;
        assert_eq!(context.selected_index, 0);
    }

    #[tokio::test]
    async fn test_cancel_applies_unhandled_track_end() {
        let mut resource = SimulatedResource::new(10.0);
        resource.set_source("0.mp3").unwrap();
        resource.play().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut context = context_with(3);

        let activity = PlayActivity::start(1, &mut context, &resource, tx);
        resource.advance(10.0);
        assert!(resource.source_finished());

        activity.cancel(&mut context, &mut resource).await;
        assert_eq!(context.selected_index, 1);
        assert_eq!(context.saved_position, 0.0);
    }

    #[tokio::test]
    async fn test_cancel_after_last_track_wraps_selection() {
        let mut resource = SimulatedResource::new(10.0);
        resource.set_source("1.mp3").unwrap();
        resource.play().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut context = context_with(2);
        context.selected_index = 1;

        let activity = PlayActivity::start(1, &mut context, &resource, tx);
        resource.advance(10.0);

        activity.cancel(&mut context, &mut resource).await;
        assert_eq!(context.selected_index, 0);
        assert_eq!(context.saved_position, 0.0);
    }
}
