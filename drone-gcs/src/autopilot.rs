use async_trait::async_trait;
use flight_core::Pose;

use crate::{error::LinkError, messages::Command};

/// The trait a vehicle backend must implement to be flown by a mission.
///
/// `call` performs one remote procedure and reports whether the vehicle accepted it.
/// An `Err` means the request or its reply never made it across.
#[async_trait]
pub trait Autopilot: Send + Sync {
    async fn call(&self, command: Command) -> Result<bool, LinkError>;
    /// Streams a position target to the vehicle. There is no acknowledgement
    async fn publish_setpoint(&self, setpoint: Pose) -> Result<(), LinkError>;
}
