//! A point mass vehicle that behaves enough like a flight controller to fly a mission against.
//!
//! It follows the same rules a real offboard controller enforces: offboard is refused unless
//! setpoints have been streaming recently, takeoff needs the motors armed, and disarming is
//! refused while airborne.

use std::sync::Arc;

use async_trait::async_trait;
use flight_core::{types::OFFBOARD_MODE, ConnectionState, ImuReading, Pose};
use glam::Vec3;
use log::{debug, info, warn};
use rand::{thread_rng, Rng};
use tokio::{
    sync::{broadcast, Mutex},
    time::{Duration, Instant},
};

use crate::{
    autopilot::Autopilot,
    config::{tick_period, ConfigError},
    error::LinkError,
    messages::Command,
    messages::VehicleMessage,
};

/// Serving the simulator across a link.
pub mod server;

pub const SIM_RATE_HZ: f32 = 50.0;
/// Connection state is reported on every Nth physics step
pub const STATE_DIVIDER: u64 = 10;
/// m/s
pub const MAX_SPEED: f32 = 2.0;
pub const SETPOINT_TIMEOUT: Duration = Duration::from_millis(500);
/// Below this altitude the vehicle counts as landed
pub const GROUND_TOLERANCE: f32 = 0.1;
pub const IMU_NOISE: f32 = 0.02;
pub const GRAVITY: f32 = 9.81;

pub const LAND_MODE: &str = "AUTO.LAND";
pub const KNOWN_MODES: [&str; 6] = [
    "MANUAL",
    "POSCTL",
    "AUTO.LOITER",
    "AUTO.TAKEOFF",
    LAND_MODE,
    OFFBOARD_MODE,
];

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub rate_hz: f32,
    pub max_speed: f32,
    pub setpoint_timeout: Duration,
    pub imu_noise: f32,
    pub initial_mode: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rate_hz: SIM_RATE_HZ,
            max_speed: MAX_SPEED,
            setpoint_timeout: SETPOINT_TIMEOUT,
            imu_noise: IMU_NOISE,
            initial_mode: "MANUAL".into(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        tick_period(self.rate_hz)
            .map(|_| ())
            .ok_or(ConfigError::NonPositiveRate("rate_hz"))
    }
}

struct SimState {
    armed: bool,
    mode: String,
    pose: Pose,
    target: Option<Pose>,
    last_setpoint: Option<Instant>,
    velocity: Vec3,
}

pub struct SimulatedVehicle {
    config: SimConfig,
    bus: broadcast::Sender<VehicleMessage>,
    state: Mutex<SimState>,
}

impl SimulatedVehicle {
    /// A vehicle that only moves when [SimulatedVehicle::step] is called
    pub fn new(bus: broadcast::Sender<VehicleMessage>, config: SimConfig) -> Arc<SimulatedVehicle> {
        let state = SimState {
            armed: false,
            mode: config.initial_mode.clone(),
            pose: Pose::default(),
            target: None,
            last_setpoint: None,
            velocity: Vec3::ZERO,
        };
        Arc::new(Self {
            config,
            bus,
            state: Mutex::new(state),
        })
    }
    /// A vehicle with its physics and telemetry running in the background
    pub fn spawn(bus: broadcast::Sender<VehicleMessage>, config: SimConfig) -> Arc<SimulatedVehicle> {
        let vehicle = Self::new(bus, config);
        tokio::spawn(vehicle.clone().physics_task());
        vehicle
    }

    pub fn bus(&self) -> broadcast::Sender<VehicleMessage> {
        self.bus.clone()
    }
    pub async fn pose(&self) -> Pose {
        self.state.lock().await.pose
    }
    pub async fn mode(&self) -> String {
        self.state.lock().await.mode.clone()
    }
    pub async fn armed(&self) -> bool {
        self.state.lock().await.armed
    }
    pub async fn connection(&self) -> ConnectionState {
        let state = self.state.lock().await;
        ConnectionState {
            connected: true,
            armed: state.armed,
            mode: state.mode.clone(),
        }
    }

    /// Answers one remote procedure the way a flight controller would
    pub async fn handle(&self, command: Command) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        match command {
            Command::SetMode(mode) => {
                if mode == OFFBOARD_MODE {
                    let streaming = state
                        .last_setpoint
                        .map(|last| now.duration_since(last) <= self.config.setpoint_timeout)
                        .unwrap_or(false);
                    if !streaming {
                        warn!("Sim refusing offboard, no setpoint stream");
                        return false;
                    }
                } else if !KNOWN_MODES.contains(&mode.as_str()) {
                    warn!("Sim has no mode {}", mode);
                    return false;
                }
                if mode == LAND_MODE {
                    let position = state.pose.position;
                    state.target = Some(Pose::hold(Vec3::new(position.x, position.y, 0.0)));
                }
                info!("Sim mode {} -> {}", state.mode, mode);
                state.mode = mode;
                true
            }
            Command::Arm(true) => {
                state.armed = true;
                info!("Sim armed");
                true
            }
            Command::Arm(false) => {
                if state.pose.position.z > GROUND_TOLERANCE {
                    warn!("Sim refusing to disarm at {} m", state.pose.position.z);
                    return false;
                }
                state.armed = false;
                state.target = None;
                info!("Sim disarmed");
                true
            }
            Command::Takeoff { altitude } => {
                if !state.armed || altitude <= 0.0 {
                    return false;
                }
                let position = state.pose.position;
                state.target = Some(Pose::hold(Vec3::new(position.x, position.y, altitude)));
                info!("Sim taking off to {} m", altitude);
                true
            }
            Command::Land => {
                if !state.armed {
                    return false;
                }
                let position = state.pose.position;
                state.target = Some(Pose::hold(Vec3::new(position.x, position.y, 0.0)));
                state.mode = LAND_MODE.into();
                info!("Sim landing");
                true
            }
        }
    }

    /// Setpoints steer the vehicle only while it is armed in offboard
    pub async fn setpoint(&self, setpoint: Pose) {
        let mut state = self.state.lock().await;
        state.last_setpoint = Some(Instant::now());
        if state.armed && state.mode == OFFBOARD_MODE {
            state.target = Some(setpoint);
        }
    }

    /// Advances the vehicle by `dt` seconds toward its target
    pub async fn step(&self, dt: f32) -> (Pose, ImuReading) {
        let mut state = self.state.lock().await;

        let mut velocity = Vec3::ZERO;
        if let (true, Some(target)) = (state.armed, state.target) {
            let offset = target.position - state.pose.position;
            let reach = self.config.max_speed * dt;
            let travel = if offset.length() <= reach {
                offset
            } else {
                offset.normalize() * reach
            };
            state.pose.position += travel;
            state.pose.orientation = target.orientation;
            if dt > 0.0 {
                velocity = travel / dt;
            }
        }
        if state.pose.position.z < 0.0 {
            state.pose.position.z = 0.0;
        }

        let acceleration = if dt > 0.0 {
            (velocity - state.velocity) / dt
        } else {
            Vec3::ZERO
        };
        state.velocity = velocity;

        let imu = ImuReading {
            orientation: state.pose.orientation,
            angular_velocity: noise(self.config.imu_noise),
            linear_acceleration: acceleration
                + Vec3::new(0.0, 0.0, GRAVITY)
                + noise(self.config.imu_noise),
        };
        (state.pose, imu)
    }

    async fn physics_task(self: Arc<Self>) {
        let period = match tick_period(self.config.rate_hz) {
            Some(period) => period,
            None => {
                warn!(
                    "Sim physics not started, {} Hz has no usable period",
                    self.config.rate_hz
                );
                return;
            }
        };
        debug!("Sim physics started at {} Hz", self.config.rate_hz);
        let dt = period.as_secs_f32();
        let mut ticker = tokio::time::interval(period);
        let mut step: u64 = 0;

        loop {
            ticker.tick().await;
            let (pose, imu) = self.step(dt).await;

            if step % STATE_DIVIDER == 0 {
                let _ = self.bus.send(VehicleMessage::State(self.connection().await));
            }
            let _ = self.bus.send(VehicleMessage::Pose(pose));
            let _ = self.bus.send(VehicleMessage::Imu(imu));
            step += 1;
        }
    }
}

fn noise(amplitude: f32) -> Vec3 {
    if amplitude <= 0.0 {
        return Vec3::ZERO;
    }
    let mut rng = thread_rng();
    Vec3::new(
        rng.gen_range(-amplitude..amplitude),
        rng.gen_range(-amplitude..amplitude),
        rng.gen_range(-amplitude..amplitude),
    )
}

#[async_trait]
impl Autopilot for SimulatedVehicle {
    async fn call(&self, command: Command) -> Result<bool, LinkError> {
        Ok(self.handle(command).await)
    }

    async fn publish_setpoint(&self, setpoint: Pose) -> Result<(), LinkError> {
        self.setpoint(setpoint).await;
        Ok(())
    }
}
