use std::time::Duration;

use drone_gcs::{
    config::{Maneuver, MissionConfig},
    mission::{events::MissionLogger, MissionContext, MissionRunner},
    network::{client::LinkAutopilot, BUS_CAPACITY},
    sim::{server, SimConfig, SimulatedVehicle},
    telemetry::TelemetryCache,
};
use flight_core::trajectory::{Circle, Square};
use tokio::{net::TcpListener, sync::broadcast};

/// Flies a short mission against a simulated vehicle served on a loopback socket
fn main(){
    pretty_env_logger::init();
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().expect("Could not build tokio runtime");
    runtime.block_on(async{
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Could not bind loopback");
        let addr = listener.local_addr().expect("No local addr");
        let (sim_bus, _) = broadcast::channel(BUS_CAPACITY);
        let vehicle = SimulatedVehicle::spawn(sim_bus, SimConfig::default());
        tokio::spawn(server::serve(listener, vehicle));

        let (bus, _rx) = broadcast::channel(BUS_CAPACITY);
        let telemetry = TelemetryCache::listen(&bus);
        let autopilot = LinkAutopilot::connect(addr, bus.clone()).await.expect("Could not reach sim vehicle");

        let config = MissionConfig{
            plan: Maneuver::standard_plan(
                Circle::new(2.0, 2.0, Duration::from_secs(8)),
                Square::new(2.0, 2.0, Duration::from_secs(2)),
            ),
            takeoff_altitude: 2.0,
            ..Default::default()
        };
        let ctx = MissionContext::new(config, autopilot, telemetry);
        MissionLogger::monitor(&ctx.events);

        let mut runner = MissionRunner::new(ctx);
        let result = runner.run().await;
        println!("Mission ended {} after {:?}: {:?}", runner.stage(), runner.history(), result.map_err(|e| e.to_string()));
    });
}
