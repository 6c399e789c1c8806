use flight_core::{MissionStage, Waypoint};
use log::{error, info};
use tokio::sync::broadcast::{self, error::RecvError};

pub const EVENT_BUS_CAPACITY: usize = 256;

/// Progress reports published by a running mission
#[derive(Clone, Debug, PartialEq)]
pub enum MissionEvent {
    Stage(MissionStage),
    Waypoint { index: usize, waypoint: Waypoint },
    Completed,
    Aborted(String),
}

/// An empty struct that can be put on the event bus to log mission progress
pub struct MissionLogger {}

impl MissionLogger {
    pub fn monitor(bus: &broadcast::Sender<MissionEvent>) {
        tokio::spawn(Self::log(bus.subscribe()));
    }
    async fn log(mut rx: broadcast::Receiver<MissionEvent>) {
        loop {
            match rx.recv().await {
                Ok(MissionEvent::Stage(stage)) => info!("Mission stage: {}", stage),
                Ok(MissionEvent::Waypoint { index, waypoint }) => info!(
                    "Waypoint {}: ({}, {}, {})",
                    index + 1,
                    waypoint.x,
                    waypoint.y,
                    waypoint.z
                ),
                Ok(MissionEvent::Completed) => info!("Mission complete"),
                Ok(MissionEvent::Aborted(reason)) => error!("Mission aborted: {}", reason),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return,
            }
        }
    }
}
