#![allow(dead_code)]

use std::{collections::HashMap, sync::{Arc, Mutex}};

use async_trait::async_trait;
use drone_gcs::{
    autopilot::Autopilot,
    config::MissionConfig,
    error::LinkError,
    messages::{Command, VehicleMessage},
    mission::{MissionContext, MissionRunner},
    telemetry::{TelemetryCache, TelemetryFeed},
};
use flight_core::{ConnectionState, Pose};

#[derive(Clone, Copy, Debug)]
pub enum Response{
    Accept,
    Reject,
    Fault,
}

/// Records every call and setpoint, answers according to a per command table.
/// Setpoint publishes are looked up under "setpoint"
#[derive(Default)]
pub struct MockAutopilot{
    calls: Mutex<Vec<Command>>,
    setpoints: Mutex<Vec<Pose>>,
    responses: Mutex<HashMap<&'static str, Response>>,
}

impl MockAutopilot{
    pub fn new() -> Arc<MockAutopilot> {
        Arc::new(Self::default())
    }
    pub fn respond(&self, command: &'static str, response: Response){
        self.responses.lock().unwrap().insert(command, response);
    }
    pub fn calls(&self) -> Vec<Command> {
        self.calls.lock().unwrap().clone()
    }
    pub fn setpoints(&self) -> Vec<Pose> {
        self.setpoints.lock().unwrap().clone()
    }
}

#[async_trait]
impl Autopilot for MockAutopilot{
    async fn call(&self, command: Command) -> Result<bool, LinkError> {
        let response = self.responses.lock().unwrap().get(command.name()).copied().unwrap_or(Response::Accept);
        self.calls.lock().unwrap().push(command);
        match response{
            Response::Accept => Ok(true),
            Response::Reject => Ok(false),
            Response::Fault => Err(LinkError::Closed),
        }
    }

    async fn publish_setpoint(&self, setpoint: Pose) -> Result<(), LinkError> {
        if let Some(Response::Fault) = self.responses.lock().unwrap().get("setpoint").copied(){
            return Err(LinkError::Closed);
        }
        self.setpoints.lock().unwrap().push(setpoint);
        Ok(())
    }
}

pub fn connected(mode: &str) -> VehicleMessage {
    VehicleMessage::State(ConnectionState{
        connected: true,
        armed: false,
        mode: mode.into(),
    })
}

/// A runner wired to `mock` and a telemetry feed the test controls
pub fn runner(config: MissionConfig, mock: &Arc<MockAutopilot>) -> (MissionRunner, TelemetryFeed) {
    let (feed, cache): (TelemetryFeed, TelemetryCache) = TelemetryFeed::channel();
    let ctx = MissionContext::new(config, mock.clone(), cache);
    (MissionRunner::new(ctx), feed)
}
