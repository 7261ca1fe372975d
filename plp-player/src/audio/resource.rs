//! Audio resource trait

use tokio::sync::broadcast;

use crate::error::Result;

/// Asynchronous signals emitted by an audio resource
///
/// Each signal carries the id of the source assignment it was emitted for
/// (see [`AudioResource::source_id`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSignal {
    /// Rendering position moved forward (cadence is resource-defined)
    PositionAdvanced { source: u64 },
    /// The source finished rendering (once per completed track)
    TrackEnded { source: u64 },
}

impl ResourceSignal {
    /// Source assignment the signal belongs to
    pub fn source(&self) -> u64 {
        match self {
            ResourceSignal::PositionAdvanced { source } | ResourceSignal::TrackEnded { source } => {
                *source
            }
        }
    }
}

/// The audio-rendering collaborator driven by the playback machine
///
/// Positions and durations are in seconds. The machine is the only caller of
/// the mutating primitives; failures are reported back as
/// [`crate::Error::Resource`] and logged by the caller.
///
/// Listeners attach with [`AudioResource::subscribe`] and detach by dropping
/// the returned receiver.
pub trait AudioResource: Send + 'static {
    /// Assign the source to render; resets position to the start
    fn set_source(&mut self, location: &str) -> Result<()>;

    /// Start (or resume) rendering the assigned source
    fn play(&mut self) -> Result<()>;

    /// Halt rendering, keeping the current position
    fn halt(&mut self) -> Result<()>;

    /// Move to an absolute position
    fn seek(&mut self, position: f64) -> Result<()>;

    /// Current rendering position
    fn position(&self) -> f64;

    /// Total duration of the assigned source, if known
    fn duration(&self) -> Option<f64>;

    /// Whether rendering is currently active
    fn is_rendering(&self) -> bool;

    /// Id of the current source assignment, bumped by every successful
    /// [`AudioResource::set_source`]
    fn source_id(&self) -> u64;

    /// The assigned source rendered to its end and is halted there
    fn source_finished(&self) -> bool {
        !self.is_rendering() && self.duration().is_some_and(|duration| self.position() >= duration)
    }

    /// Attach a listener for position-advanced / track-ended signals
    fn subscribe(&self) -> broadcast::Receiver<ResourceSignal>;
}
