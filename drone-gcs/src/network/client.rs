use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use flight_core::{ConnectionState, Pose};
use log::{debug, info, trace, warn};
use tokio::{
    net::ToSocketAddrs,
    sync::{broadcast, oneshot, Mutex},
    time::{timeout, Duration},
};

use crate::{
    autopilot::Autopilot,
    error::LinkError,
    messages::{Command, VehicleMessage},
};

use super::{link::Link, REPLY_TIMEOUT};

/// Flies a vehicle on the far side of a [Link].
///
/// Telemetry received on the link is put on `bus`. Requests carry an id so their replies can
/// be matched up, a call waits at most `reply_timeout` for its reply
pub struct LinkAutopilot {
    link: Arc<Link>,
    bus: broadcast::Sender<VehicleMessage>,
    next_id: AtomicU32,
    pending: Mutex<HashMap<u32, oneshot::Sender<bool>>>,
    reply_timeout: Duration,
}

impl LinkAutopilot {
    pub async fn connect(
        tgt: impl ToSocketAddrs,
        bus: broadcast::Sender<VehicleMessage>,
    ) -> Result<Arc<LinkAutopilot>, LinkError> {
        let link = Link::connect(tgt).await?;
        Ok(Self::over(link, bus, REPLY_TIMEOUT))
    }
    pub fn over(
        link: Arc<Link>,
        bus: broadcast::Sender<VehicleMessage>,
        reply_timeout: Duration,
    ) -> Arc<LinkAutopilot> {
        let autopilot = Arc::new(Self {
            link,
            bus,
            next_id: AtomicU32::new(0),
            pending: Mutex::new(HashMap::new()),
            reply_timeout,
        });

        tokio::spawn(autopilot.clone().listen());

        autopilot
    }
    pub fn link(&self) -> &Arc<Link> {
        &self.link
    }

    async fn listen(self: Arc<Self>) {
        info!("Vehicle link to {} started", self.link.peer_addr());
        loop {
            let msg = match self.link.recv().await {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("Vehicle link to {} closed: {}", self.link.peer_addr(), e);
                    break;
                }
            };

            match msg {
                VehicleMessage::Reply { id, success } => {
                    match self.pending.lock().await.remove(&id) {
                        Some(tx) => {
                            let _ = tx.send(success);
                        }
                        None => debug!("Reply {} arrived with nobody waiting", id),
                    }
                }
                msg if msg.is_telemetry() => {
                    let _ = self.bus.send(msg);
                }
                msg => trace!("Ignoring {:?} from vehicle", msg),
            }
        }

        // Dropping the senders wakes every caller still waiting
        self.pending.lock().await.clear();
        let _ = self.bus.send(VehicleMessage::State(ConnectionState::default()));
    }
}

#[async_trait]
impl Autopilot for LinkAutopilot {
    async fn call(&self, command: Command) -> Result<bool, LinkError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        if let Err(e) = self.link.send(&VehicleMessage::Request { id, command }).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        match timeout(self.reply_timeout, rx).await {
            Ok(Ok(success)) => Ok(success),
            Ok(Err(_)) => Err(LinkError::Closed),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(LinkError::ReplyTimeout(self.reply_timeout))
            }
        }
    }

    async fn publish_setpoint(&self, setpoint: Pose) -> Result<(), LinkError> {
        self.link.send(&VehicleMessage::Setpoint(setpoint)).await
    }
}
