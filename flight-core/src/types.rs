use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// The control mode in which setpoints are streamed by an external process
pub const OFFBOARD_MODE: &str = "OFFBOARD";

/// Link and mode status as last reported by the vehicle
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub armed: bool,
    pub mode: String,
}

impl ConnectionState {
    pub fn is_offboard(&self) -> bool {
        self.mode == OFFBOARD_MODE
    }
}

/// Position in the local map frame (meters) and attitude
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Pose {
        Self {
            position,
            orientation,
        }
    }
    /// Position hold at `position` with a level, north facing attitude
    pub fn hold(position: Vec3) -> Pose {
        Self::new(position, Quat::IDENTITY)
    }
    /// Heading in degrees, extracted from the orientation quaternion
    pub fn yaw_deg(&self) -> f32 {
        let q = self.orientation;
        let siny_cosp = 2.0 * (q.w * q.z + q.x * q.y);
        let cosy_cosp = 1.0 - 2.0 * (q.y * q.y + q.z * q.z);
        siny_cosp.atan2(cosy_cosp).to_degrees()
    }
}

/// Inertial measurement as delivered by the flight controller
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ImuReading {
    pub orientation: Quat,
    /// rad/s
    pub angular_velocity: Vec3,
    /// m/s^2
    pub linear_acceleration: Vec3,
}

impl Default for ImuReading {
    fn default() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            linear_acceleration: Vec3::ZERO,
        }
    }
}

/// A target position with a heading in degrees
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
}

impl Waypoint {
    pub fn new(x: f32, y: f32, z: f32, yaw: f32) -> Waypoint {
        Self { x, y, z, yaw }
    }
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
    /// Heading as a rotation about the z axis: z = sin(yaw/2), w = cos(yaw/2)
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_z(self.yaw.to_radians())
    }
    pub fn to_pose(&self) -> Pose {
        Pose::new(self.position(), self.orientation())
    }
}

impl From<Waypoint> for Pose {
    fn from(waypoint: Waypoint) -> Self {
        waypoint.to_pose()
    }
}
