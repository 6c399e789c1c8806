use std::{io::ErrorKind, net::SocketAddr, sync::Arc};

use log::{debug, info, trace};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{tcp::OwnedReadHalf, tcp::OwnedWriteHalf, TcpListener, TcpStream, ToSocketAddrs},
    sync::{mpsc, Mutex, RwLock},
    time::sleep,
};

use crate::{error::LinkError, messages::VehicleMessage};

use super::{MAX_FRAME_SIZE, TIMEOUT_BUDGET, TIMEOUT_TIME};

const INBOX_DEPTH: usize = 64;

/// The state of a link
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkState {
    Active,
    Error(String),
    Stale,
}

type Inbox = mpsc::Receiver<Result<VehicleMessage, LinkError>>;

/// A tcp stream carrying length prefixed bincode frames.
///
/// Frames are read by a background task so a silent peer can be pinged without losing a
/// partially read frame. Heart and Beat frames are answered here and never handed out
pub struct Link {
    state: RwLock<LinkState>,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
    inbox: Mutex<Inbox>,
    write_socket: Mutex<OwnedWriteHalf>,
}

impl Link {
    pub fn from_stream(stream: TcpStream) -> Result<Arc<Link>, LinkError> {
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable nagle on link to {}: {}", peer_addr, e);
        }
        let (rd, wr) = stream.into_split();
        let (tx, rx) = mpsc::channel(INBOX_DEPTH);

        tokio::spawn(Self::read_frames(rd, tx));
        info!("Link streaming on {} to {}", local_addr, peer_addr);

        Ok(Arc::new(Self {
            state: RwLock::new(LinkState::Active),
            local_addr,
            peer_addr,
            inbox: Mutex::new(rx),
            write_socket: Mutex::new(wr),
        }))
    }
    pub async fn connect(tgt: impl ToSocketAddrs) -> Result<Arc<Link>, LinkError> {
        let stream = TcpStream::connect(tgt).await?;
        Self::from_stream(stream)
    }
    /// Waits for the next peer on `listener`
    pub async fn accept(listener: &TcpListener) -> Result<Arc<Link>, LinkError> {
        let (stream, peer) = listener.accept().await?;
        debug!("Accepted link from {}", peer);
        Self::from_stream(stream)
    }

    pub async fn state(&self) -> LinkState {
        self.state.read().await.clone()
    }
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub async fn send(&self, msg: &VehicleMessage) -> Result<(), LinkError> {
        let frame = Self::encode(msg)?;
        let mut write = self.write_socket.lock().await;
        write.write_all(&frame).await?;
        write.flush().await?;
        Ok(())
    }

    /// Next message from the peer. Fails once the peer is gone or stops answering heartbeats
    pub async fn recv(&self) -> Result<VehicleMessage, LinkError> {
        let mut inbox = self.inbox.lock().await;
        let mut timeout_budget = TIMEOUT_BUDGET;

        loop {
            let frame = tokio::select! {
                _ = sleep(TIMEOUT_TIME) => {
                    if timeout_budget == 0 {
                        info!("Link to {} stopped answering", self.peer_addr);
                        *self.state.write().await = LinkState::Stale;
                        return Err(LinkError::Closed);
                    }
                    timeout_budget -= 1;
                    self.send(&VehicleMessage::Heart).await?;
                    continue;
                }
                frame = inbox.recv() => frame,
            };

            timeout_budget = TIMEOUT_BUDGET;
            match frame {
                Some(Ok(VehicleMessage::Heart)) => {
                    self.send(&VehicleMessage::Beat).await?;
                }
                Some(Ok(VehicleMessage::Beat)) => {}
                Some(Ok(msg)) => return Ok(msg),
                Some(Err(LinkError::Closed)) | None => {
                    *self.state.write().await = LinkState::Stale;
                    return Err(LinkError::Closed);
                }
                Some(Err(e)) => {
                    *self.state.write().await = LinkState::Error(e.to_string());
                    return Err(e);
                }
            }
        }
    }

    pub fn encode(msg: &VehicleMessage) -> Result<Vec<u8>, LinkError> {
        let body = bincode::serialize(msg)?;
        if body.len() > MAX_FRAME_SIZE {
            return Err(LinkError::FrameTooLarge(body.len()));
        }
        let mut frame = Vec::with_capacity(body.len() + 4);
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    async fn read_frames(
        mut rd: OwnedReadHalf,
        tx: mpsc::Sender<Result<VehicleMessage, LinkError>>,
    ) {
        loop {
            let frame = Self::read_frame(&mut rd).await;
            let failed = frame.is_err();
            if tx.send(frame).await.is_err() || failed {
                trace!("Link reader stopping");
                return;
            }
        }
    }

    async fn read_frame(rd: &mut OwnedReadHalf) -> Result<VehicleMessage, LinkError> {
        let length = match rd.read_u32().await {
            Ok(length) => length as usize,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(LinkError::Closed),
            Err(e) => return Err(e.into()),
        };
        if length > MAX_FRAME_SIZE {
            return Err(LinkError::FrameTooLarge(length));
        }
        let mut data = vec![0u8; length];
        rd.read_exact(&mut data).await?;
        Ok(bincode::deserialize(&data)?)
    }
}
