//! Client connection management for the simulation server
//!
//! This module tracks every connected client:
//! - Connection lifecycle (connect, disconnect, timeout)
//! - The most recent input each client sent, guarded by sequence number
//! - The player body each client controls
//! - Capacity limits and address lookup
//!
//! Inputs are not queued. The simulation re-applies the latest input of every
//! client on each poll until a newer one arrives, so a lost datagram only delays
//! a change of direction instead of dropping it.

use log::{debug, info};
use shared::{BodyId, InputState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Inactivity window after which a client is dropped.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected client and the player body it controls
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier assigned by the server
    pub id: u32,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
    /// Body spawned for this client, once the game has created it
    pub body: Option<BodyId>,
    /// Newest input received so far
    pub latest_input: InputState,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            body: None,
            latest_input: InputState::default(),
        }
    }

    /// Stores `input` if it is newer than the one we hold
    ///
    /// Any packet counts as activity, even a stale input. Returns whether the
    /// input replaced the stored one.
    pub fn record_input(&mut self, input: InputState) -> bool {
        self.last_seen = Instant::now();
        if input.sequence <= self.latest_input.sequence && self.latest_input.sequence != 0 {
            debug!(
                "Client {} sent stale input {} (latest {})",
                self.id, input.sequence, self.latest_input.sequence
            );
            return false;
        }
        self.latest_input = input;
        true
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Checks if the client has exceeded the connection timeout
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages all connected clients
///
/// Enforces the server capacity, hands out client ids and answers the
/// simulation's question "what is every player pressing right now".
pub struct ClientManager {
    /// Connected clients indexed by their unique ID
    clients: HashMap<u32, Client>,
    /// Next available client ID for new connections
    next_client_id: u32,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
    timeout: Duration,
}

impl ClientManager {
    /// Creates a new client manager with the specified capacity limit
    ///
    /// Client IDs start from 1 and increment for each new connection.
    pub fn new(max_clients: usize) -> Self {
        Self::with_timeout(max_clients, CLIENT_TIMEOUT)
    }

    pub fn with_timeout(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
            timeout,
        }
    }

    /// Attempts to add a new client connection
    ///
    /// Returns Some(client_id) if successful, None if server is at capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Removes a client from the server
    ///
    /// Returns the removed client so the caller can despawn its body, or None
    /// if it was already gone.
    pub fn remove_client(&mut self, client_id: u32) -> Option<Client> {
        let client = self.clients.remove(&client_id)?;
        info!("Client {} disconnected", client.id);
        Some(client)
    }

    pub fn get(&self, client_id: u32) -> Option<&Client> {
        self.clients.get(&client_id)
    }

    /// Associates the client with the body the game spawned for it
    pub fn assign_body(&mut self, client_id: u32, body: BodyId) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => {
                client.body = Some(body);
                true
            }
            None => false,
        }
    }

    /// Finds a client ID by their network address
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Records an input for a specific client
    ///
    /// Returns false if the client ID is unknown or the input is stale.
    pub fn record_input(&mut self, client_id: u32, input: InputState) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => client.record_input(input),
            None => false,
        }
    }

    /// Refreshes the activity timestamp of a client
    pub fn touch(&mut self, client_id: u32) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.touch();
        }
    }

    /// Latest input of every client that owns a body, ordered by client id
    pub fn latest_inputs(&self) -> Vec<(BodyId, InputState)> {
        let mut inputs: Vec<(u32, BodyId, InputState)> = self
            .clients
            .values()
            .filter_map(|client| client.body.map(|body| (client.id, body, client.latest_input)))
            .collect();

        inputs.sort_by_key(|(client_id, _, _)| *client_id);
        inputs
            .into_iter()
            .map(|(_, body, input)| (body, input))
            .collect()
    }

    /// Checks for and removes timed-out clients
    ///
    /// Returns the removed clients so their bodies can be cleaned up.
    pub fn check_timeouts(&mut self) -> Vec<Client> {
        let timeout = self.timeout;
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        timed_out
            .into_iter()
            .filter_map(|client_id| self.remove_client(client_id))
            .collect()
    }

    /// Gets all client IDs and their network addresses for broadcasting
    pub fn get_client_addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
