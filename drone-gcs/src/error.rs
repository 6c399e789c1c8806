use std::time::Duration;

use crate::{config::ConfigError, messages::Command};

/// What went wrong on the link to a vehicle
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("Frame of {0} bytes is over the size limit")]
    FrameTooLarge(usize),

    #[error("Link closed")]
    Closed,

    #[error("No reply within {0:?}")]
    ReplyTimeout(Duration),
}

/// Why a mission was aborted
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("No connection to the vehicle within {0:?}")]
    ConnectionTimeout(Duration),

    #[error("Vehicle rejected {0}")]
    CommandRejected(Command),

    /// `command` is `None` when a setpoint publish faulted
    #[error(
        "Transport fault during {}: {source}",
        .command.as_ref().map_or_else(|| "setpoint".to_string(), |c| c.to_string())
    )]
    TransportFault {
        command: Option<Command>,
        #[source]
        source: LinkError,
    },

    #[error("Invalid mission config: {0}")]
    Config(#[from] ConfigError),
}
