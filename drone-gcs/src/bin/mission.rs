use std::{sync::Arc, time::Duration};

use clap::Parser;
use drone_gcs::{
    autopilot::Autopilot,
    config::{self, Maneuver, MissionConfig},
    mission::{events::MissionLogger, MissionContext, MissionRunner},
    network::{client::LinkAutopilot, BUS_CAPACITY, VEHICLE_PORT},
    sim::{SimConfig, SimulatedVehicle},
    telemetry::TelemetryCache,
};
use flight_core::trajectory::{Circle, Square};
use log::error;
use tokio::sync::broadcast;

#[derive(Parser)]
struct MissionArgs{
    /// Vehicle endpoint to fly, defaults to the local vehicle port
    #[arg(short, long)]
    connect: Option<String>,
    /// Fly an in-process simulated vehicle instead
    #[arg(short, long)]
    simulate: bool,
    #[arg(long, default_value_t = config::TAKEOFF_ALTITUDE)]
    takeoff_altitude: f32,
    #[arg(long, default_value_t = config::CIRCLE_RADIUS)]
    circle_radius: f32,
    #[arg(long, default_value_t = config::CIRCLE_HEIGHT)]
    circle_height: f32,
    /// seconds
    #[arg(long, default_value_t = config::CIRCLE_DURATION.as_secs_f32())]
    circle_duration: f32,
    #[arg(long, default_value_t = config::SQUARE_SIDE)]
    square_side: f32,
    #[arg(long, default_value_t = config::SQUARE_HEIGHT)]
    square_height: f32,
    /// seconds
    #[arg(long, default_value_t = config::CONNECTION_TIMEOUT.as_secs_f32())]
    connection_timeout: f32,
    /// Setpoint publish rate in Hz
    #[arg(long, default_value_t = config::PUBLISH_RATE_HZ)]
    rate: f32,
}

impl MissionArgs{
    fn config(&self) -> MissionConfig {
        let circle = Circle::new(self.circle_radius, self.circle_height, seconds(self.circle_duration));
        let square = Square::new(self.square_side, self.square_height, config::SQUARE_HOLD);
        MissionConfig{
            connection_timeout: seconds(self.connection_timeout),
            publish_rate_hz: self.rate,
            takeoff_altitude: self.takeoff_altitude,
            plan: Maneuver::standard_plan(circle, square),
            ..Default::default()
        }
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::ZERO)
}

async fn run(args: MissionArgs) -> i32 {
    let config = args.config();
    if let Err(e) = config.validate(){
        error!("{}", e);
        return 2;
    }

    let (bus, _rx) = broadcast::channel(BUS_CAPACITY);
    let telemetry = TelemetryCache::listen(&bus);

    let autopilot: Arc<dyn Autopilot> = if args.simulate{
        SimulatedVehicle::spawn(bus.clone(), SimConfig::default())
    }
    else{
        let tgt = args.connect.clone().unwrap_or_else(|| format!("127.0.0.1:{}", VEHICLE_PORT));
        match LinkAutopilot::connect(&tgt, bus.clone()).await{
            Ok(a) => a,
            Err(e) => {
                error!("Could not reach vehicle at {}: {}", tgt, e);
                return 1;
            }
        }
    };

    let ctx = MissionContext::new(config, autopilot, telemetry);
    MissionLogger::monitor(&ctx.events);

    let mut runner = MissionRunner::new(ctx);
    match runner.run().await{
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn main(){
    pretty_env_logger::init();
    let args = MissionArgs::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().expect("Could not build tokio runtime");
    let code = runtime.block_on(run(args));
    std::process::exit(code);
}
