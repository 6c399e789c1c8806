use flight_core::{ConnectionState, ImuReading, Pose};
use log::{debug, trace};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    watch,
};

use crate::messages::VehicleMessage;

/// Everything known about the vehicle at one instant.
/// Fields that were never reported hold their defaults
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub state: ConnectionState,
    pub pose: Pose,
    pub imu: ImuReading,
    /// Number of telemetry messages folded in so far
    pub sequence: u64,
}

impl TelemetrySnapshot {
    /// The snapshot that results from receiving `msg`, or None if it carries no telemetry
    pub fn apply(&self, msg: &VehicleMessage) -> Option<TelemetrySnapshot> {
        let mut next = self.clone();
        match msg {
            VehicleMessage::State(state) => next.state = state.clone(),
            VehicleMessage::Pose(pose) => next.pose = *pose,
            VehicleMessage::Imu(imu) => next.imu = *imu,
            _ => return None,
        }
        next.sequence += 1;
        Some(next)
    }
}

/// The write side of the telemetry mailbox
pub struct TelemetryFeed {
    tx: watch::Sender<TelemetrySnapshot>,
}

impl TelemetryFeed {
    pub fn channel() -> (TelemetryFeed, TelemetryCache) {
        let (tx, rx) = watch::channel(TelemetrySnapshot::default());
        (Self { tx }, TelemetryCache { rx })
    }
    /// Folds one message into the mailbox. Returns false if the message was not telemetry
    pub fn push(&self, msg: &VehicleMessage) -> bool {
        let next = match self.tx.borrow().apply(msg) {
            Some(next) => next,
            None => return false,
        };
        self.tx.send_replace(next);
        true
    }
    pub fn subscribe(&self) -> TelemetryCache {
        TelemetryCache {
            rx: self.tx.subscribe(),
        }
    }
    /// Feeds every telemetry message from the bus into the mailbox until the bus closes
    pub async fn follow(self, mut rx: broadcast::Receiver<VehicleMessage>) {
        debug!("Telemetry feed started");
        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                Err(RecvError::Lagged(skipped)) => {
                    trace!("Telemetry feed skipped {} stale messages", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            self.push(&msg);
        }
        debug!("Telemetry bus closed, feed stopping");
    }
}

/// Read side of the telemetry mailbox. Reads never wait
#[derive(Clone)]
pub struct TelemetryCache {
    rx: watch::Receiver<TelemetrySnapshot>,
}

impl TelemetryCache {
    /// Starts a background feed from `bus` and returns the cache it writes into
    pub fn listen(bus: &broadcast::Sender<VehicleMessage>) -> TelemetryCache {
        let (feed, cache) = TelemetryFeed::channel();
        tokio::spawn(feed.follow(bus.subscribe()));
        cache
    }
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.rx.borrow().clone()
    }
    pub fn connection(&self) -> ConnectionState {
        self.rx.borrow().state.clone()
    }
    pub fn is_connected(&self) -> bool {
        self.rx.borrow().state.connected
    }
    pub fn pose(&self) -> Pose {
        self.rx.borrow().pose
    }
    pub fn imu(&self) -> ImuReading {
        self.rx.borrow().imu
    }
    /// Waits for a newer snapshot. Returns false once the feed is gone
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
