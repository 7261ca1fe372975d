//! Test helpers for plp-player integration tests
//!
//! - `TestPlayer`: a running service over a `SimulatedResource`
//! - Resources that misbehave: every primitive failing, or a closed signal stream
//! - Notification helpers with timeouts

#![allow(dead_code)]

use std::time::Duration;

use plp_common::{EventBus, PlayerEvent, PlayerState, Track};
use plp_player::audio::{AudioResource, ResourceSignal, SimulatedResource};
use plp_player::{Error, PlayerHandle, PlayerService, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Upper bound on any wait for a notification
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Running player plus the resource clone used to drive its clock
pub struct TestPlayer {
    pub handle: PlayerHandle,
    pub resource: SimulatedResource,
    pub events: broadcast::Receiver<PlayerEvent>,
    task: JoinHandle<()>,
}

impl TestPlayer {
    /// Start a player where every track lasts `duration` seconds
    pub fn start(duration: f64) -> Self {
        Self::with_resource(SimulatedResource::new(duration))
    }

    pub fn with_resource(resource: SimulatedResource) -> Self {
        let (handle, task) = PlayerService::spawn(resource.clone(), EventBus::new(256));
        let events = handle.subscribe();
        Self {
            handle,
            resource,
            events,
            task,
        }
    }

    /// Load `count` tracks named 0.mp3, 1.mp3, ... and wait for the load
    pub async fn load(&mut self, count: usize) {
        self.handle.load(tracks(count)).unwrap();
        self.handle.flush().await.unwrap();
        expect_state(&mut self.events, PlayerState::Stopped).await;
    }

    /// Wait until everything sent so far has been processed
    pub async fn settle(&self) {
        self.handle.flush().await.unwrap();
    }

    pub async fn shutdown(self) {
        self.handle.shutdown().unwrap();
        timeout(EVENT_TIMEOUT, self.task)
            .await
            .expect("service did not stop")
            .unwrap();
    }
}

pub fn tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| Track::from_location(format!("{}.mp3", i)))
        .collect()
}

/// Next notification, failing the test after `EVENT_TIMEOUT`
pub async fn next_event(rx: &mut broadcast::Receiver<PlayerEvent>) -> PlayerEvent {
    timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a notification")
        .expect("notification channel failed")
}

/// Next state notification, skipping time updates
pub async fn next_state_change(
    rx: &mut broadcast::Receiver<PlayerEvent>,
) -> (PlayerState, Vec<Track>, usize) {
    loop {
        if let PlayerEvent::StateChanged {
            state,
            tracks,
            selected_index,
            ..
        } = next_event(rx).await
        {
            return (state, tracks, selected_index);
        }
    }
}

/// Next state notification must report `expected`; returns its selected index
pub async fn expect_state(rx: &mut broadcast::Receiver<PlayerEvent>, expected: PlayerState) -> usize {
    let (state, _, selected_index) = next_state_change(rx).await;
    assert_eq!(state, expected, "unexpected state notification");
    selected_index
}

/// Next notification must be a time update; returns (position, duration)
pub async fn expect_time_update(rx: &mut broadcast::Receiver<PlayerEvent>) -> (f64, f64) {
    match next_event(rx).await {
        PlayerEvent::TimeUpdate {
            position, duration, ..
        } => (position, duration),
        other => panic!("Expected TimeUpdate, got {:?}", other),
    }
}

/// Nothing has been published since the last receive
pub fn assert_no_event(rx: &mut broadcast::Receiver<PlayerEvent>) {
    if let Ok(event) = rx.try_recv() {
        panic!("Unexpected notification: {:?}", event);
    }
}

/// Resource whose every primitive fails
///
/// Signals can still be injected through `signals`.
#[derive(Clone)]
pub struct FailingResource {
    pub signals: broadcast::Sender<ResourceSignal>,
}

impl FailingResource {
    pub fn new() -> Self {
        let (signals, _) = broadcast::channel(16);
        Self { signals }
    }

    fn fail(primitive: &str) -> Result<()> {
        Err(Error::Resource(format!("{} unavailable", primitive)))
    }
}

impl AudioResource for FailingResource {
    fn set_source(&mut self, _location: &str) -> Result<()> {
        Self::fail("set_source")
    }

    fn play(&mut self) -> Result<()> {
        Self::fail("play")
    }

    fn halt(&mut self) -> Result<()> {
        Self::fail("halt")
    }

    fn seek(&mut self, _position: f64) -> Result<()> {
        Self::fail("seek")
    }

    fn position(&self) -> f64 {
        0.0
    }

    fn duration(&self) -> Option<f64> {
        None
    }

    fn is_rendering(&self) -> bool {
        false
    }

    fn source_id(&self) -> u64 {
        // No assignment ever succeeds
        0
    }

    fn subscribe(&self) -> broadcast::Receiver<ResourceSignal> {
        self.signals.subscribe()
    }
}

/// Simulated resource whose listeners see a closed signal stream
#[derive(Clone)]
pub struct SilentResource {
    pub inner: SimulatedResource,
}

impl SilentResource {
    pub fn new(duration: f64) -> Self {
        Self {
            inner: SimulatedResource::new(duration),
        }
    }
}

impl AudioResource for SilentResource {
    fn set_source(&mut self, location: &str) -> Result<()> {
        self.inner.set_source(location)
    }

    fn play(&mut self) -> Result<()> {
        self.inner.play()
    }

    fn halt(&mut self) -> Result<()> {
        self.inner.halt()
    }

    fn seek(&mut self, position: f64) -> Result<()> {
        self.inner.seek(position)
    }

    fn position(&self) -> f64 {
        self.inner.position()
    }

    fn duration(&self) -> Option<f64> {
        self.inner.duration()
    }

    fn is_rendering(&self) -> bool {
        self.inner.is_rendering()
    }

    fn source_id(&self) -> u64 {
        self.inner.source_id()
    }

    fn subscribe(&self) -> broadcast::Receiver<ResourceSignal> {
        // Sender dropped on return
        let (_tx, rx) = broadcast::channel(1);
        rx
    }
}
