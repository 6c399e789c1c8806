//! Drone-GCS is the ground side of an offboard flight: it connects to a vehicle, streams
//! position setpoints to it and walks it through a fixed mission.
//!
//! It is highly recommended to familiarize yourself with the following crates:
//! * [Tokio](https://docs.rs/tokio/latest/tokio)
//! * [Glam](https://docs.rs/glam/latest/glam)
//! * [Bincode](https://docs.rs/bincode/latest/bincode)
//!
//! The mission is a linear script:
//! connect -> offboard -> arm -> take off -> circle, hover, square, hover -> land -> disarm.
//! Every maneuver is bounded by elapsed ticks, not by feedback from the vehicle.
//!
//! Telemetry coming from the vehicle is put on a [tokio::sync::broadcast] bus. The
//! [telemetry::TelemetryCache] folds it into snapshots that the [mission::MissionRunner]
//! reads without waiting. Commands go out through the [autopilot::Autopilot] seam, which is
//! implemented by [network::client::LinkAutopilot] for a vehicle across a socket and by
//! [sim::SimulatedVehicle] for an in-process one.

/// Mission tuning and the default flight plan.
pub mod config;
/// Error types for the link and the mission.
pub mod error;
/// The messages exchanged with a vehicle.
pub mod messages;
/// The seam between the mission and whatever is flying.
pub mod autopilot;
/// Last known vehicle state, updated in the background.
pub mod telemetry;
/// Remote calls with uniform success handling.
pub mod commands;
/// The mission state machine and its maneuvers.
pub mod mission;
/// The framed tcp link to a vehicle endpoint.
pub mod network;
/// A simulated vehicle that can be flown in process or across the link.
pub mod sim;
