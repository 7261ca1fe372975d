//! Audio rendering resource boundary
//!
//! The controller never renders audio itself. It drives an [`AudioResource`]
//! and listens to the [`ResourceSignal`]s the resource emits.

pub mod resource;
pub mod simulated;

pub use resource::{AudioResource, ResourceSignal};
pub use simulated::{spawn_ticker, SimulatedResource};
