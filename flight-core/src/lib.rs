//! Flight-core holds the vehicle facing data model shared by the ground control
//! code: poses, waypoints, connection state, mission stages and the canned
//! trajectory generators.
//!
//! Nothing in here touches the network or the clock. Trajectories are described
//! by their sample index so they can be checked without flying anything.

/// Poses, waypoints and the telemetry records the vehicle reports.
pub mod types;
/// The stages a mission moves through.
pub mod stage;
/// Circle and square trajectory generators.
pub mod trajectory;

pub use stage::MissionStage;
pub use types::{ConnectionState, ImuReading, Pose, Waypoint};
