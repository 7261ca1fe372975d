//! Error types for plp-player
//!
//! None of these are fatal to the controller: resource failures are logged
//! by the state machine and playback continues with whatever state the
//! resource is left in.

use thiserror::Error;

/// Main error type for plp-player
#[derive(Error, Debug)]
pub enum Error {
    /// An audio resource primitive failed
    #[error("Audio resource error: {0}")]
    Resource(String),

    /// The player service loop is no longer running
    #[error("Player service stopped")]
    ServiceStopped,

    /// Console input could not be parsed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

/// Convenience Result type using plp-player Error
pub type Result<T> = std::result::Result<T, Error>;
