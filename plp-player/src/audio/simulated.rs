//! Simulated audio resource
//!
//! A clock-only stand-in for a real renderer. Nothing is decoded: position
//! moves forward when [`SimulatedResource::advance`] is called, either by a
//! test or by the ticker task started with [`spawn_ticker`].
//!
//! Clones share the same underlying state, so the player can own one clone
//! while a driver holds another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use plp_common::config::SimulationConfig;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::resource::{AudioResource, ResourceSignal};
use crate::error::{Error, Result};

/// Signal buffer per listener
const SIGNAL_CAPACITY: usize = 64;

#[derive(Debug)]
struct SimulatedInner {
    source: Option<String>,
    source_id: u64,
    position: f64,
    rendering: bool,
    default_duration: f64,
    durations: HashMap<String, f64>,
}

impl SimulatedInner {
    fn current_duration(&self) -> Option<f64> {
        self.source.as_ref().map(|source| {
            self.durations
                .get(source)
                .copied()
                .unwrap_or(self.default_duration)
        })
    }
}

/// Clock-driven audio resource
#[derive(Debug, Clone)]
pub struct SimulatedResource {
    inner: Arc<Mutex<SimulatedInner>>,
    signals: broadcast::Sender<ResourceSignal>,
}

impl SimulatedResource {
    /// Create a resource where every track lasts `default_duration` seconds
    pub fn new(default_duration: f64) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(SimulatedInner {
                source: None,
                source_id: 0,
                position: 0.0,
                rendering: false,
                default_duration,
                durations: HashMap::new(),
            })),
            signals,
        }
    }

    /// Create a resource from the `[simulation]` config section
    pub fn from_config(config: &SimulationConfig) -> Self {
        let resource = Self::new(config.track_duration_secs);
        for (location, secs) in &config.durations {
            resource.set_duration(location, *secs);
        }
        resource
    }

    /// Override the duration of one location
    pub fn with_duration(self, location: &str, secs: f64) -> Self {
        self.set_duration(location, secs);
        self
    }

    pub fn set_duration(&self, location: &str, secs: f64) {
        self.lock().durations.insert(location.to_string(), secs);
    }

    /// Currently assigned source
    pub fn source(&self) -> Option<String> {
        self.lock().source.clone()
    }

    /// Number of attached signal listeners
    pub fn listener_count(&self) -> usize {
        self.signals.receiver_count()
    }

    /// Move the clock forward by `secs` while rendering
    ///
    /// Emits one position-advanced signal. When the end of the source is
    /// reached, rendering halts and a single track-ended signal follows.
    /// Does nothing while halted.
    pub fn advance(&self, secs: f64) {
        let (source, ended) = {
            let mut inner = self.lock();
            if !inner.rendering {
                return;
            }
            let Some(duration) = inner.current_duration() else {
                return;
            };

            inner.position = (inner.position + secs.max(0.0)).min(duration);
            let ended = inner.position >= duration;
            if ended {
                inner.rendering = false;
            }
            (inner.source_id, ended)
        };

        let _ = self.signals.send(ResourceSignal::PositionAdvanced { source });
        if ended {
            debug!("Simulated source {} reached its end", source);
            let _ = self.signals.send(ResourceSignal::TrackEnded { source });
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioResource for SimulatedResource {
    fn set_source(&mut self, location: &str) -> Result<()> {
        if location.trim().is_empty() {
            return Err(Error::Resource("empty source location".to_string()));
        }
        let mut inner = self.lock();
        inner.source = Some(location.to_string());
        inner.source_id += 1;
        inner.position = 0.0;
        inner.rendering = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut inner = self.lock();
        let Some(duration) = inner.current_duration() else {
            return Err(Error::Resource("no source assigned".to_string()));
        };
        // Playing a finished source starts it over
        if inner.position >= duration {
            inner.position = 0.0;
        }
        inner.rendering = true;
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        self.lock().rendering = false;
        Ok(())
    }

    fn seek(&mut self, position: f64) -> Result<()> {
        if !position.is_finite() || position < 0.0 {
            return Err(Error::Resource(format!("invalid seek position {}", position)));
        }
        let mut inner = self.lock();
        let Some(duration) = inner.current_duration() else {
            return Err(Error::Resource("no source assigned".to_string()));
        };
        inner.position = position.min(duration);
        Ok(())
    }

    fn position(&self) -> f64 {
        self.lock().position
    }

    fn duration(&self) -> Option<f64> {
        self.lock().current_duration()
    }

    fn is_rendering(&self) -> bool {
        self.lock().rendering
    }

    fn source_id(&self) -> u64 {
        self.lock().source_id
    }

    fn subscribe(&self) -> broadcast::Receiver<ResourceSignal> {
        self.signals.subscribe()
    }
}

/// Drive a simulated resource in real time
///
/// Advances the clock by `tick` on every tick until `token` is cancelled.
pub fn spawn_ticker(
    resource: SimulatedResource,
    tick: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Simulated clock started ({}ms ticks)", tick.as_millis());
        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => resource.advance(tick.as_secs_f64()),
            }
        }
        info!("Simulated clock stopped");
    })
}
