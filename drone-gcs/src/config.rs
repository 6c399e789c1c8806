use std::time::Duration;

use flight_core::{
    trajectory::{Circle, Square},
    types::OFFBOARD_MODE,
    MissionStage,
};
use serde::{Deserialize, Serialize};

/// How long to wait for the vehicle to report a connection
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECTION_POLL_HZ: f32 = 10.0;
/// Offboard refuses to engage without a recent setpoint stream, so this many are sent first
pub const PRIMING_SETPOINTS: usize = 100;
pub const PRIMING_RATE_HZ: f32 = 20.0;
pub const PUBLISH_RATE_HZ: f32 = 30.0;
/// meters
pub const TAKEOFF_ALTITUDE: f32 = 3.0;

pub const CIRCLE_RADIUS: f32 = 5.0;
pub const CIRCLE_HEIGHT: f32 = 3.0;
pub const CIRCLE_DURATION: Duration = Duration::from_secs(30);
pub const SQUARE_SIDE: f32 = 4.0;
pub const SQUARE_HEIGHT: f32 = 3.0;
pub const SQUARE_HOLD: Duration = Duration::from_secs(5);
pub const FIRST_HOVER: Duration = Duration::from_secs(3);
pub const FINAL_HOVER: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a positive rate with a usable tick period")]
    NonPositiveRate(&'static str),

    #[error("Takeoff altitude {0} m is not above the ground")]
    TakeoffAltitude(f32),
}

/// The tick period of a `hz` rate, if the rate is positive and its period is neither zero nor
/// too long to represent
pub fn tick_period(hz: f32) -> Option<Duration> {
    if !hz.is_finite() || hz <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f32(1.0 / hz)
        .ok()
        .filter(|period| !period.is_zero())
}

/// One step of the flight plan
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Maneuver {
    Circle(Circle),
    Hover(Duration),
    Square(Square),
}

impl Maneuver {
    pub fn stage(&self) -> MissionStage {
        match self {
            Maneuver::Circle(_) => MissionStage::Circling,
            Maneuver::Hover(_) => MissionStage::Hovering,
            Maneuver::Square(_) => MissionStage::Squaring,
        }
    }
    /// Circle, hover, square, hover
    pub fn standard_plan(circle: Circle, square: Square) -> Vec<Maneuver> {
        vec![
            Maneuver::Circle(circle),
            Maneuver::Hover(FIRST_HOVER),
            Maneuver::Square(square),
            Maneuver::Hover(FINAL_HOVER),
        ]
    }
}

/// Fixed pauses between the stages of a mission
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SettleDelays {
    pub after_connect: Duration,
    pub after_mode: Duration,
    pub after_arm: Duration,
    pub after_takeoff: Duration,
    pub after_land: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_connect: Duration::from_secs(1),
            after_mode: Duration::from_secs(1),
            after_arm: Duration::from_secs(2),
            after_takeoff: Duration::from_secs(5),
            after_land: Duration::from_secs(5),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MissionConfig {
    pub connection_timeout: Duration,
    pub connection_poll_hz: f32,
    pub offboard_mode: String,
    pub priming_setpoints: usize,
    pub priming_rate_hz: f32,
    pub publish_rate_hz: f32,
    pub takeoff_altitude: f32,
    pub settle: SettleDelays,
    pub plan: Vec<Maneuver>,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            connection_timeout: CONNECTION_TIMEOUT,
            connection_poll_hz: CONNECTION_POLL_HZ,
            offboard_mode: OFFBOARD_MODE.into(),
            priming_setpoints: PRIMING_SETPOINTS,
            priming_rate_hz: PRIMING_RATE_HZ,
            publish_rate_hz: PUBLISH_RATE_HZ,
            takeoff_altitude: TAKEOFF_ALTITUDE,
            settle: SettleDelays::default(),
            plan: Maneuver::standard_plan(
                Circle::new(CIRCLE_RADIUS, CIRCLE_HEIGHT, CIRCLE_DURATION),
                Square::new(SQUARE_SIDE, SQUARE_HEIGHT, SQUARE_HOLD),
            ),
        }
    }
}

impl MissionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("connection_poll_hz", self.connection_poll_hz),
            ("priming_rate_hz", self.priming_rate_hz),
            ("publish_rate_hz", self.publish_rate_hz),
        ];
        for (name, rate) in rates {
            if tick_period(rate).is_none() {
                return Err(ConfigError::NonPositiveRate(name));
            }
        }
        if self.takeoff_altitude.is_nan() || self.takeoff_altitude <= 0.0 {
            return Err(ConfigError::TakeoffAltitude(self.takeoff_altitude));
        }
        Ok(())
    }
}
