use std::sync::Arc;

use flight_core::{Pose, Waypoint};
use log::{error, info, trace, warn};

use crate::{autopilot::Autopilot, error::MissionError, messages::Command};

/// Issues the vehicle's remote calls and turns their outcome into a [MissionError].
/// Nothing is retried, the caller decides what a failure means
#[derive(Clone)]
pub struct CommandIssuer {
    autopilot: Arc<dyn Autopilot>,
}

impl CommandIssuer {
    pub fn new(autopilot: Arc<dyn Autopilot>) -> CommandIssuer {
        Self { autopilot }
    }
    pub async fn arm(&self, arm: bool) -> Result<(), MissionError> {
        self.issue(Command::Arm(arm)).await
    }
    pub async fn set_mode(&self, mode: &str) -> Result<(), MissionError> {
        self.issue(Command::SetMode(mode.into())).await
    }
    pub async fn takeoff(&self, altitude: f32) -> Result<(), MissionError> {
        self.issue(Command::Takeoff { altitude }).await
    }
    pub async fn land(&self) -> Result<(), MissionError> {
        self.issue(Command::Land).await
    }
    pub async fn publish(&self, setpoint: Pose) -> Result<(), MissionError> {
        trace!("Setpoint {:?}", setpoint.position);
        match self.autopilot.publish_setpoint(setpoint).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Setpoint publish failed: {}", e);
                Err(MissionError::TransportFault {
                    command: None,
                    source: e,
                })
            }
        }
    }
    /// Publishes `waypoint` as a setpoint, heading converted to a quaternion
    pub async fn move_to(&self, waypoint: &Waypoint) -> Result<(), MissionError> {
        self.publish(waypoint.to_pose()).await
    }

    async fn issue(&self, command: Command) -> Result<(), MissionError> {
        match self.autopilot.call(command.clone()).await {
            Ok(true) => {
                info!("Vehicle accepted {}", command);
                Ok(())
            }
            Ok(false) => {
                warn!("Vehicle rejected {}", command);
                Err(MissionError::CommandRejected(command))
            }
            Err(e) => {
                error!("{} failed: {}", command, e);
                Err(MissionError::TransportFault {
                    command: Some(command),
                    source: e,
                })
            }
        }
    }
}
