//! Server network layer handling TCP connections and the authority event loop

use crate::authority::{Authority, Dispatch, WorldConfig};
use crate::client_manager::ClientManager;
use log::{debug, error, info, warn};
use shared::framing::{read_packet, write_packet, FrameError};
use shared::Packet;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Placeholder wake-up when no respawn is pending; the timer branch is
/// disabled in that case so it never actually fires.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Accepted {
        stream: TcpStream,
        addr: SocketAddr,
    },
    PacketReceived {
        client_id: u32,
        packet: Packet,
    },
    ClientDisconnected {
        client_id: u32,
    },
    Shutdown,
}

/// Stops a running [`Server`] from another task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.server_tx.send(ServerMessage::Shutdown).is_err() {
            debug!("Server already stopped");
        }
    }
}

/// Main server coordinating connections and the authority
///
/// Every network task funnels into one channel, and the loop in [`Server::run`]
/// is the only code that touches the authority. Packets, disconnects and
/// respawn timers are therefore applied strictly one at a time.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    authority: Authority,
    started: Instant,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        max_clients: usize,
        world: WorldConfig,
    ) -> Result<Self, ServerError> {
        world.validate(max_clients)?;

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(max_clients),
            authority: Authority::from_config(&world),
            started: Instant::now(),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Milliseconds since the server started; the authority's clock.
    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Spawns task that accepts connections and hands them to the main loop
    fn spawn_acceptor(&self, listener: TcpListener) {
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if server_tx
                            .send(ServerMessage::Accepted { stream, addr })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that decodes inbound frames for one connection
    fn spawn_reader(
        client_id: u32,
        mut reader: OwnedReadHalf,
        server_tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        tokio::spawn(async move {
            loop {
                match read_packet(&mut reader).await {
                    Ok(packet) => {
                        if server_tx
                            .send(ServerMessage::PacketReceived { client_id, packet })
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(e) if e.is_recoverable() => {
                        warn!("Dropping malformed packet from client {}: {}", client_id, e);
                    }
                    Err(FrameError::ConnectionClosed) => break,
                    Err(e) => {
                        warn!("Closing client {}: {}", client_id, e);
                        break;
                    }
                }
            }

            if server_tx
                .send(ServerMessage::ClientDisconnected { client_id })
                .is_err()
            {
                debug!("Server gone before client {} disconnect", client_id);
            }
        });
    }

    /// Spawns task that drains one connection's outbound queue
    fn spawn_writer(
        client_id: u32,
        mut writer: OwnedWriteHalf,
        mut outbound: mpsc::UnboundedReceiver<Packet>,
    ) {
        tokio::spawn(async move {
            while let Some(packet) = outbound.recv().await {
                if let Err(e) = write_packet(&mut writer, &packet).await {
                    error!("Failed to send packet to client {}: {}", client_id, e);
                    break;
                }
            }
        });
    }

    fn handle_accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }

        let (reader, mut writer) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        match self.clients.add_client(addr, outbound_tx) {
            Some(client_id) => {
                Self::spawn_reader(client_id, reader, self.server_tx.clone());
                Self::spawn_writer(client_id, writer, outbound_rx);
            }
            None => {
                warn!(
                    "Rejecting {}: server full ({} clients)",
                    addr,
                    self.clients.max_clients()
                );
                tokio::spawn(async move {
                    let response = Packet::Disconnected {
                        reason: "Server full".to_string(),
                    };
                    if let Err(e) = write_packet(&mut writer, &response).await {
                        debug!("Failed to notify {} of full server: {}", addr, e);
                    }
                });
            }
        }
    }

    fn handle_packet(&mut self, client_id: u32, packet: Packet) {
        // The reader task outlives an explicit leave; its session is over
        if !self.clients.contains(client_id) {
            debug!("Dropping {:?} from departed client {}", packet, client_id);
            return;
        }

        // An explicit leave is handled like the socket closing
        if matches!(packet, Packet::Leave) {
            self.handle_disconnect(client_id);
            return;
        }

        let now = self.now_ms();
        let dispatches = self.authority.handle(client_id, packet, now);
        self.dispatch(dispatches);
    }

    fn handle_disconnect(&mut self, client_id: u32) {
        self.clients.remove_client(client_id);
        let dispatches = self.authority.on_leave(client_id);
        self.dispatch(dispatches);
    }

    fn handle_timer(&mut self) {
        let now = self.now_ms();
        let dispatches = self.authority.on_timer(now);
        self.dispatch(dispatches);
    }

    fn dispatch(&self, dispatches: Vec<Dispatch>) {
        for dispatch in dispatches {
            match dispatch {
                Dispatch::Send { client_id, packet } => {
                    self.clients.send_to(client_id, packet);
                }
                Dispatch::Broadcast { packet, exclude } => {
                    self.clients.broadcast(&packet, exclude);
                }
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), ServerError> {
        let listener = self
            .listener
            .take()
            .ok_or("server loop already started")?;
        self.spawn_acceptor(listener);

        info!("Server started successfully");

        loop {
            let deadline = self
                .authority
                .next_deadline()
                .map(|ms| self.started + Duration::from_millis(ms));
            let wake_at = deadline.unwrap_or_else(|| Instant::now() + IDLE_WAIT);

            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Accepted { stream, addr }) => {
                            self.handle_accept(stream, addr);
                        },
                        Some(ServerMessage::PacketReceived { client_id, packet }) => {
                            self.handle_packet(client_id, packet);
                        },
                        Some(ServerMessage::ClientDisconnected { client_id }) => {
                            self.handle_disconnect(client_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            self.clients.broadcast(
                                &Packet::Disconnected { reason: "Server shutting down".to_string() },
                                None,
                            );
                            break;
                        }
                    }
                },

                // Fire due respawns
                _ = sleep_until(wake_at), if deadline.is_some() => {
                    self.handle_timer();
                },
            }
        }

        Ok(())
    }
}
