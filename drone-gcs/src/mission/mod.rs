//! The mission runner walks a vehicle through a fixed script.
//!
//! Only two things are ever checked against the vehicle: that it connected in time and that
//! each remote call was accepted. Every other transition happens because enough ticks went by.

use std::sync::Arc;

use flight_core::{MissionStage, Pose};
use log::{error, info, warn};
use tokio::{
    sync::broadcast,
    time::{sleep, Instant},
};

use crate::{
    autopilot::Autopilot, commands::CommandIssuer, config::MissionConfig, error::MissionError,
    telemetry::TelemetryCache,
};

use self::events::{MissionEvent, EVENT_BUS_CAPACITY};

/// Progress events and the logger that listens to them.
pub mod events;
/// The setpoint streaming loops for each maneuver.
pub mod maneuvers;

/// Everything a mission needs, handed to it explicitly
pub struct MissionContext {
    pub config: MissionConfig,
    pub commands: CommandIssuer,
    pub telemetry: TelemetryCache,
    pub events: broadcast::Sender<MissionEvent>,
}

impl MissionContext {
    pub fn new(
        config: MissionConfig,
        autopilot: Arc<dyn Autopilot>,
        telemetry: TelemetryCache,
    ) -> MissionContext {
        let (events, _rx) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            config,
            commands: CommandIssuer::new(autopilot),
            telemetry,
            events,
        }
    }
    pub fn emit(&self, event: MissionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

pub struct MissionRunner {
    ctx: MissionContext,
    stage: MissionStage,
    history: Vec<MissionStage>,
}

impl MissionRunner {
    pub fn new(ctx: MissionContext) -> MissionRunner {
        Self {
            ctx,
            stage: MissionStage::Connecting,
            history: vec![],
        }
    }
    pub fn stage(&self) -> MissionStage {
        self.stage
    }
    /// Every stage entered so far, in order
    pub fn history(&self) -> &[MissionStage] {
        &self.history
    }
    pub fn context(&self) -> &MissionContext {
        &self.ctx
    }

    /// Runs the mission to Disarmed, or to Failed on the first error.
    /// Nothing is undone on failure, the vehicle is left wherever it is
    pub async fn run(&mut self) -> Result<(), MissionError> {
        if self.stage.is_terminal() {
            warn!("Mission already finished in stage {}", self.stage);
            return Ok(());
        }
        match self.fly().await {
            Ok(_) => {
                info!("Mission finished");
                self.ctx.emit(MissionEvent::Completed);
                Ok(())
            }
            Err(e) => {
                error!("Mission failed while {}: {}", self.stage, e);
                self.enter(MissionStage::Failed);
                self.ctx.emit(MissionEvent::Aborted(e.to_string()));
                Err(e)
            }
        }
    }

    async fn fly(&mut self) -> Result<(), MissionError> {
        self.ctx.config.validate()?;
        let settle = self.ctx.config.settle.clone();

        self.enter(MissionStage::Connecting);
        self.wait_for_connection().await?;
        sleep(settle.after_connect).await;

        self.enter(MissionStage::SettingMode);
        self.set_offboard_mode().await?;
        sleep(settle.after_mode).await;

        self.enter(MissionStage::Arming);
        self.ctx.commands.arm(true).await?;
        sleep(settle.after_arm).await;

        self.enter(MissionStage::TakingOff);
        self.ctx
            .commands
            .takeoff(self.ctx.config.takeoff_altitude)
            .await?;
        sleep(settle.after_takeoff).await;

        let plan = self.ctx.config.plan.clone();
        for maneuver in plan.iter() {
            self.enter(maneuver.stage());
            maneuvers::fly(&self.ctx, maneuver).await?;
        }

        self.enter(MissionStage::Landing);
        self.ctx.commands.land().await?;
        sleep(settle.after_land).await;

        if let Err(e) = self.ctx.commands.arm(false).await {
            warn!("Disarm failed after landing: {}", e);
        }
        self.enter(MissionStage::Disarmed);
        Ok(())
    }

    async fn wait_for_connection(&self) -> Result<(), MissionError> {
        let timeout = self.ctx.config.connection_timeout;
        let deadline = Instant::now() + timeout;
        let mut poll = maneuvers::rate(
            "connection_poll_hz",
            self.ctx.config.connection_poll_hz,
        )?;

        loop {
            if self.ctx.telemetry.is_connected() {
                info!("Vehicle connected");
                return Ok(());
            }
            if Instant::now() >= deadline {
                error!("Vehicle did not connect within {:?}", timeout);
                return Err(MissionError::ConnectionTimeout(timeout));
            }
            poll.tick().await;
        }
    }

    /// Streams hold position setpoints so the vehicle will accept offboard, then asks for it
    async fn set_offboard_mode(&self) -> Result<(), MissionError> {
        let mode = &self.ctx.config.offboard_mode;
        let mut ticker =
            maneuvers::rate("priming_rate_hz", self.ctx.config.priming_rate_hz)?;

        for _ in 0..self.ctx.config.priming_setpoints {
            ticker.tick().await;
            if self.ctx.telemetry.connection().mode != *mode {
                let hold = Pose::hold(self.ctx.telemetry.pose().position);
                self.ctx.commands.publish(hold).await?;
            }
        }

        self.ctx.commands.set_mode(mode).await
    }

    fn enter(&mut self, stage: MissionStage) {
        if self.stage.is_terminal() {
            return;
        }
        self.stage = stage;
        self.history.push(stage);
        self.ctx.emit(MissionEvent::Stage(stage));
    }
}
