//! Internal playback events (not broadcast to observers)
//!
//! Signals forwarded from a running play activity to the event loop. They
//! are converted to [`plp_common::PlayerEvent`]s by the machine before
//! anything is broadcast.

use crate::audio::ResourceSignal;

/// A resource signal tagged with the activity that received it
///
/// The generation lets the machine discard signals that were already in
/// flight when their activity was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySignal {
    pub generation: u64,
    pub signal: ResourceSignal,
}
