use tokio::time::Duration;

/// The port a vehicle endpoint listens on
pub const VEHICLE_PORT: u16 = 14540;
/// How many heartbeats can go unanswered before a link closes
pub const TIMEOUT_BUDGET: u8 = 10;
/// How long a link can stay silent before a heartbeat is sent
pub const TIMEOUT_TIME: Duration = Duration::from_secs(5);
/// How long a remote call waits for its reply
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(3);
/// Largest frame accepted off the wire
pub const MAX_FRAME_SIZE: usize = 64 * 1024;
/// Capacity of the telemetry bus fed by a link
pub const BUS_CAPACITY: usize = 1024;

/// The framed tcp connection.
pub mod link;

/// The [crate::autopilot::Autopilot] that speaks to a vehicle over a link.
pub mod client;
