//! plp-player library
//!
//! Playlist playback controller driving an [`audio::AudioResource`].

pub mod audio;
pub mod console;
pub mod error;
pub mod playback;

pub use error::{Error, Result};
pub use playback::{Command, PlayerHandle, PlayerService, PlayerSnapshot};
