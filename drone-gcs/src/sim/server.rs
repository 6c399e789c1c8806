use std::sync::Arc;

use log::{debug, info, trace, warn};
use tokio::{
    net::TcpListener,
    sync::broadcast::{self, error::RecvError},
};

use crate::{error::LinkError, messages::VehicleMessage, network::link::Link};

use super::SimulatedVehicle;

/// Accepts ground stations on `listener` forever, one session each
pub async fn serve(listener: TcpListener, vehicle: Arc<SimulatedVehicle>) -> Result<(), LinkError> {
    info!("Sim vehicle listening on {}", listener.local_addr()?);
    loop {
        let link = Link::accept(&listener).await?;
        info!("Ground station connected from {}", link.peer_addr());
        tokio::spawn(session(link, vehicle.clone()));
    }
}

async fn session(link: Arc<Link>, vehicle: Arc<SimulatedVehicle>) {
    let forwarder = tokio::spawn(forward_telemetry(link.clone(), vehicle.bus().subscribe()));

    loop {
        match link.recv().await {
            Ok(VehicleMessage::Request { id, command }) => {
                debug!("Request {}: {}", id, command);
                let success = vehicle.handle(command).await;
                if let Err(e) = link.send(&VehicleMessage::Reply { id, success }).await {
                    warn!("Could not reply to {}: {}", link.peer_addr(), e);
                    break;
                }
            }
            Ok(VehicleMessage::Setpoint(setpoint)) => vehicle.setpoint(setpoint).await,
            Ok(msg) => trace!("Sim ignoring {:?}", msg),
            Err(e) => {
                info!("Ground station {} left: {}", link.peer_addr(), e);
                break;
            }
        }
    }

    forwarder.abort();
}

async fn forward_telemetry(link: Arc<Link>, mut rx: broadcast::Receiver<VehicleMessage>) {
    loop {
        match rx.recv().await {
            Ok(msg) => {
                if link.send(&msg).await.is_err() {
                    return;
                }
            }
            Err(RecvError::Lagged(skipped)) => debug!("Telemetry forwarder skipped {}", skipped),
            Err(RecvError::Closed) => return,
        }
    }
}
