//! Live connection bookkeeping for the server transport
//!
//! This module tracks which TCP connections are open and how to reach them:
//! - Connection id assignment (ids start at 1 and are never reused)
//! - Capacity enforcement against `max_clients`
//! - Outbound packet routing, either to one connection or fanned out
//!
//! Game state lives in the authority; a connection here may or may not have
//! joined the world yet.

use log::{debug, info};
use shared::Packet;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// One open connection and the queue feeding its writer task
#[derive(Debug)]
pub struct Client {
    /// Connection id assigned by the server
    pub id: u32,
    /// Remote address, kept for logging
    pub addr: SocketAddr,
    pub connected_at: Instant,
    outbound: UnboundedSender<Packet>,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, outbound: UnboundedSender<Packet>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            outbound,
        }
    }

    /// Queues a packet for the writer task. Returns false once the writer
    /// has gone away.
    pub fn send(&self, packet: Packet) -> bool {
        self.outbound.send(packet).is_ok()
    }
}

/// Manages all open connections
///
/// Dropping a [`Client`] drops its outbound sender, which ends the writer
/// task and closes the write half of the socket.
pub struct ClientManager {
    clients: HashMap<u32, Client>,
    next_client_id: u32,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a new connection
    ///
    /// Returns Some(client_id) if successful, None if the server is at
    /// capacity.
    pub fn add_client(&mut self, addr: SocketAddr, outbound: UnboundedSender<Packet>) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, outbound));

        Some(client_id)
    }

    /// Forgets a connection. Returns false if it was already gone, which
    /// happens when an explicit leave is followed by the socket closing.
    pub fn remove_client(&mut self, client_id: u32) -> bool {
        match self.clients.remove(&client_id) {
            Some(client) => {
                info!(
                    "Client {} ({}) disconnected after {:.1}s",
                    client.id,
                    client.addr,
                    client.connected_at.elapsed().as_secs_f32()
                );
                true
            }
            None => false,
        }
    }

    pub fn send_to(&self, client_id: u32, packet: Packet) -> bool {
        match self.clients.get(&client_id) {
            Some(client) => client.send(packet),
            None => {
                debug!("Dropping packet for departed client {}", client_id);
                false
            }
        }
    }

    /// Sends a copy of `packet` to every connection except `exclude` and
    /// returns how many were queued.
    pub fn broadcast(&self, packet: &Packet, exclude: Option<u32>) -> usize {
        self.clients
            .values()
            .filter(|client| Some(client.id) != exclude)
            .filter(|client| client.send(packet.clone()))
            .count()
    }

    pub fn contains(&self, client_id: u32) -> bool {
        self.clients.contains_key(&client_id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}
