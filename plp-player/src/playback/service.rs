//! Player service: event loop and handle
//!
//! The loop task owns the [`PlaybackMachine`] and processes, one at a time,
//! inbound messages from any number of [`PlayerHandle`]s and signals forwarded
//! by the play activity. After each item the current snapshot is published on
//! a watch channel, which is what the handle's queries read.

use plp_common::{EventBus, PlayerEvent, PlayerState, Track};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::events::ActivitySignal;
use super::machine::PlaybackMachine;
use super::types::{Command, PlayerSnapshot};
use crate::audio::AudioResource;
use crate::error::{Error, Result};

/// Messages accepted by the loop
#[derive(Debug)]
enum Message {
    Command(Command),
    /// GO_TO_SONG relative to the selection at processing time
    Relative(i64),
    /// Acknowledged once everything queued before it is processed
    Flush(oneshot::Sender<()>),
    Shutdown,
}

pub struct PlayerService;

impl PlayerService {
    /// Start a player over `resource`, publishing notifications on `events`
    pub fn spawn<R: AudioResource>(resource: R, events: EventBus) -> (PlayerHandle, JoinHandle<()>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlayerSnapshot::default());

        let machine = PlaybackMachine::new(resource, events.clone(), signal_tx);
        let task = tokio::spawn(run_loop(machine, message_rx, signal_rx, snapshot_tx));

        let handle = PlayerHandle {
            tx: message_tx,
            snapshot: snapshot_rx,
            events,
        };
        (handle, task)
    }
}

async fn run_loop<R: AudioResource>(
    mut machine: PlaybackMachine<R>,
    mut message_rx: mpsc::UnboundedReceiver<Message>,
    mut signal_rx: mpsc::UnboundedReceiver<ActivitySignal>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
) {
    info!("Player service started");

    loop {
        tokio::select! {
            message = message_rx.recv() => match message {
                Some(Message::Command(command)) => {
                    machine.dispatch(command).await;
                }
                Some(Message::Relative(offset)) => {
                    let next_song = machine.context().selected_index() as i64 + offset;
                    machine.dispatch(Command::GoToSong { next_song }).await;
                }
                Some(Message::Flush(ack)) => {
                    let _ = ack.send(());
                }
                Some(Message::Shutdown) | None => break,
            },
            Some(signal) = signal_rx.recv() => {
                machine.handle_signal(signal).await;
            }
        }

        snapshot_tx.send_replace(machine.snapshot());
    }

    debug!("Player service shutting down");
    machine.shutdown().await;
    info!("Player service stopped");
}

/// Cloneable front end to a running player
///
/// Senders are fire-and-forget: a command that the current state does not
/// accept is dropped by the loop. Use [`PlayerHandle::flush`] to wait until
/// everything sent so far has been applied.
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<Message>,
    snapshot: watch::Receiver<PlayerSnapshot>,
    events: EventBus,
}

impl PlayerHandle {
    /// Queue a command
    pub fn send(&self, command: Command) -> Result<()> {
        self.post(Message::Command(command))
    }

    fn post(&self, message: Message) -> Result<()> {
        self.tx.send(message).map_err(|_| Error::ServiceStopped)
    }

    pub fn load(&self, tracks: Vec<Track>) -> Result<()> {
        self.send(Command::Load { tracks })
    }

    pub fn play(&self) -> Result<()> {
        self.send(Command::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    pub fn go_to_song(&self, index: i64) -> Result<()> {
        self.send(Command::GoToSong { next_song: index })
    }

    pub fn go_to_second(&self, second: f64) -> Result<()> {
        self.send(Command::GoToSecond {
            second: Some(second),
        })
    }

    /// Select the following track; a no-op on the last one
    pub fn next(&self) -> Result<()> {
        self.post(Message::Relative(1))
    }

    /// Select the preceding track; a no-op on the first one
    pub fn previous(&self) -> Result<()> {
        self.post(Message::Relative(-1))
    }

    /// Wait until every message sent before this call has been processed
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.post(Message::Flush(ack_tx))?;
        ack_rx.await.map_err(|_| Error::ServiceStopped)
    }

    /// Ask the loop to stop after the messages already queued
    pub fn shutdown(&self) -> Result<()> {
        self.post(Message::Shutdown)
    }

    /// Subscribe to notifications emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// State as of the last processed message
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> PlayerState {
        self.snapshot.borrow().state
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.snapshot.borrow().tracks.clone()
    }

    pub fn selected_index(&self) -> usize {
        self.snapshot.borrow().selected_index
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.snapshot.borrow().contains(track)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.snapshot.borrow().last_index()
    }

    /// Whether the loop has exited
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
