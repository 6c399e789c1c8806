use clap::Parser;
use drone_gcs::{
    network::{BUS_CAPACITY, VEHICLE_PORT},
    sim::{server, SimConfig, SimulatedVehicle},
};
use log::error;
use tokio::{net::TcpListener, sync::broadcast};

#[derive(Parser)]
struct SimArgs{
    /// Address to accept ground stations on
    #[arg(short, long)]
    listen: Option<String>,
    /// Physics rate in Hz
    #[arg(long, default_value_t = drone_gcs::sim::SIM_RATE_HZ)]
    rate: f32,
}

async fn run(args: SimArgs){
    let addr = args.listen.unwrap_or_else(|| format!("127.0.0.1:{}", VEHICLE_PORT));
    let listener = match TcpListener::bind(&addr).await{
        Ok(l) => l,
        Err(e) => {
            error!("Could not bind {}: {}", addr, e);
            return;
        }
    };

    let (bus, _rx) = broadcast::channel(BUS_CAPACITY);
    let config = SimConfig{
        rate_hz: args.rate,
        ..Default::default()
    };
    if let Err(e) = config.validate(){
        error!("{}", e);
        return;
    }
    let vehicle = SimulatedVehicle::spawn(bus, config);

    if let Err(e) = server::serve(listener, vehicle).await{
        error!("Sim vehicle stopped: {}", e);
    }
}

fn main(){
    pretty_env_logger::init();
    let args = SimArgs::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().expect("Could not build tokio runtime");
    runtime.block_on(run(args));
}
