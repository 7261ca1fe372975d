//! # PLP Common Library
//!
//! Shared code for the playlist player:
//! - Track value type
//! - Player state names and outbound notifications (PlayerEvent enum)
//! - EventBus for broadcasting notifications to observers
//! - Bootstrap configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod track;

pub use error::{Error, Result};
pub use events::{EventBus, PlayerEvent, PlayerState};
pub use track::Track;
