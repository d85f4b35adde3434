//! Background connection to the authority.
//!
//! The render loop is synchronous, so the socket lives on its own thread
//! with a single-threaded tokio runtime. Packets cross between the two over
//! channels: the frame loop drains inbound events with [`NetworkClient::poll`]
//! and queues intents with [`NetworkClient::send`].

use log::{debug, info, warn};
use shared::framing::{read_packet, write_packet, FrameError};
use shared::Packet;
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to start network thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Something the network thread wants the frame loop to know.
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    Connected,
    Packet(Packet),
    Disconnected(String),
}

pub struct NetworkClient {
    outbound: mpsc::UnboundedSender<Packet>,
    inbound: std_mpsc::Receiver<NetEvent>,
    thread: Option<JoinHandle<()>>,
}

impl NetworkClient {
    /// Starts the network thread, which connects to `server` and sends the
    /// join intent for `name`. Connection failures arrive later as
    /// [`NetEvent::Disconnected`].
    pub fn connect(server: &str, name: &str) -> Result<Self, ClientError> {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound) = std_mpsc::channel();
        let server = server.to_string();
        let name = name.to_string();

        let thread = std::thread::Builder::new()
            .name("network".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = inbound_tx.send(NetEvent::Disconnected(e.to_string()));
                        return;
                    }
                };

                let events = inbound_tx.clone();
                let result = runtime.block_on(run_connection(server, name, outbound_rx, events));
                if let Err(e) = result {
                    let _ = inbound_tx.send(NetEvent::Disconnected(e.to_string()));
                }
            })?;

        Ok(Self {
            outbound,
            inbound,
            thread: Some(thread),
        })
    }

    /// Queues a packet for the server. Returns false once the connection is
    /// gone.
    pub fn send(&self, packet: Packet) -> bool {
        self.outbound.send(packet).is_ok()
    }

    /// Everything received since the last call, in arrival order.
    pub fn poll(&self) -> Vec<NetEvent> {
        self.inbound.try_iter().collect()
    }

    /// Says goodbye and waits for the network thread to finish.
    pub fn shutdown(mut self) {
        if self.send(Packet::Leave) {
            debug!("Sent leave");
        }

        // Closing the queue ends the writer loop and with it the runtime
        let (closed, _) = mpsc::unbounded_channel();
        self.outbound = closed;

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Network thread panicked");
            }
        }
    }
}

async fn run_connection(
    server: String,
    name: String,
    mut outbound: mpsc::UnboundedReceiver<Packet>,
    events: std_mpsc::Sender<NetEvent>,
) -> Result<(), FrameError> {
    let stream = TcpStream::connect(&server).await?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", server);

    let (reader, mut writer) = stream.into_split();
    write_packet(&mut writer, &Packet::Join { name }).await?;
    let _ = events.send(NetEvent::Connected);

    tokio::spawn(read_loop(reader, events));

    while let Some(packet) = outbound.recv().await {
        write_packet(&mut writer, &packet).await?;
    }

    Ok(())
}

/// Forwards decoded packets until the server closes the stream.
async fn read_loop(mut reader: OwnedReadHalf, events: std_mpsc::Sender<NetEvent>) {
    let reason = loop {
        match read_packet(&mut reader).await {
            Ok(packet) => {
                if events.send(NetEvent::Packet(packet)).is_err() {
                    return;
                }
            }
            Err(e) if e.is_recoverable() => warn!("Dropping malformed packet: {}", e),
            Err(FrameError::ConnectionClosed) => break "connection closed".to_string(),
            Err(e) => break e.to_string(),
        }
    };

    info!("Server connection ended: {}", reason);
    let _ = events.send(NetEvent::Disconnected(reason));
}
