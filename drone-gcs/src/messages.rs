use std::fmt;

use flight_core::{ConnectionState, ImuReading, Pose};
use serde::{Deserialize, Serialize};

/// The remote procedures a vehicle answers with a success flag
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Command {
    Arm(bool),
    SetMode(String),
    Takeoff { altitude: f32 },
    Land,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Arm(true) => "arm",
            Command::Arm(false) => "disarm",
            Command::SetMode(_) => "set_mode",
            Command::Takeoff { .. } => "takeoff",
            Command::Land => "land",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetMode(mode) => write!(f, "set_mode({})", mode),
            Command::Takeoff { altitude } => write!(f, "takeoff({} m)", altitude),
            _ => f.write_str(self.name()),
        }
    }
}

/// Everything that travels between the ground and a vehicle.
/// Telemetry flows up, setpoints and requests flow down
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum VehicleMessage {
    Heart,
    Beat,
    State(ConnectionState),
    Pose(Pose),
    Imu(ImuReading),
    Setpoint(Pose),
    Request { id: u32, command: Command },
    Reply { id: u32, success: bool },
}

impl VehicleMessage {
    pub fn is_telemetry(&self) -> bool {
        matches!(
            self,
            VehicleMessage::State(_) | VehicleMessage::Pose(_) | VehicleMessage::Imu(_)
        )
    }
}
