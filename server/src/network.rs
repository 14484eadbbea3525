//! Server network layer handling UDP communications and game loop coordination

use crate::client_manager::{ClientManager, CLIENT_TIMEOUT};
use crate::game::{GameConfig, GameState};
use log::{debug, error, info, warn};
use shared::{BodyId, Packet, PhysicsError, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{sleep_until, Instant};

/// Ticks between periodic status lines.
const STATUS_INTERVAL_TICKS: u64 = 600;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: u32,
        body: Option<BodyId>,
    },
    Shutdown,
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<u32>,
    },
}

/// Main server coordinating networking and the physics simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState,
    client_timeout: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        config: GameConfig,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_timeout(addr, config, max_clients, CLIENT_TIMEOUT).await
    }

    pub async fn with_timeout(
        addr: &str,
        config: GameConfig,
        max_clients: usize,
        client_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let game_state = GameState::new(config)?;
        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::with_timeout(
                max_clients,
                client_timeout,
            ))),
            game_state,
            client_timeout,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Sender that can stop [`Server::run`] with [`ServerMessage::Shutdown`]
    pub fn control(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match Packet::decode(&buffer[..len]) {
                        Ok(packet) => {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping malformed packet from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        send_to(&socket, &packet, addr).await;
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }
                            send_to(&socket, &packet, addr).await;
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let period = (self.client_timeout / 5).clamp(Duration::from_millis(10), Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client in timed_out {
                    let message = ServerMessage::ClientTimeout {
                        client_id: client.id,
                        body: client.body,
                    };
                    if let Err(e) = server_tx.send(message) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet, exclude: Option<u32>) {
        if let Err(e) = self
            .game_tx
            .send(GameMessage::BroadcastPacket { packet, exclude })
        {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Processes one datagram from a client
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    self.send_packet(
                        Packet::Disconnected {
                            reason: format!(
                                "Protocol version mismatch (server {}, client {})",
                                PROTOCOL_VERSION, client_version
                            ),
                        },
                        addr,
                    );
                    return;
                }

                // A reconnect from the same address replaces the old session
                let existing = {
                    let mut clients = self.clients.write().await;
                    clients
                        .find_client_by_addr(addr)
                        .and_then(|id| clients.remove_client(id))
                };
                if let Some(client) = existing {
                    info!("Replacing existing client {} from {}", client.id, addr);
                    self.despawn(client.id, client.body);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };
                let Some(client_id) = client_id else {
                    self.send_packet(
                        Packet::Disconnected {
                            reason: "Server full".to_string(),
                        },
                        addr,
                    );
                    return;
                };

                match self.game_state.add_player() {
                    Ok(body_id) => {
                        self.clients.write().await.assign_body(client_id, body_id);
                        self.send_packet(Packet::Connected { client_id, body_id }, addr);
                        self.send_packet(
                            Packet::Snapshot {
                                tick: self.game_state.tick(),
                                snapshot: self.game_state.snapshot(),
                            },
                            addr,
                        );
                    }
                    Err(e) => {
                        error!("Failed to spawn player for client {}: {}", client_id, e);
                        self.clients.write().await.remove_client(client_id);
                        self.send_packet(
                            Packet::Disconnected {
                                reason: spawn_failure_reason(&e),
                            },
                            addr,
                        );
                    }
                }
            }

            Packet::Input(input) => {
                let mut clients = self.clients.write().await;
                match clients.find_client_by_addr(addr) {
                    Some(client_id) => {
                        clients.record_input(client_id, input);
                    }
                    None => debug!("Input from unknown address {}", addr),
                }
            }

            Packet::Disconnect => {
                let removed = {
                    let mut clients = self.clients.write().await;
                    clients
                        .find_client_by_addr(addr)
                        .and_then(|id| clients.remove_client(id))
                };
                if let Some(client) = removed {
                    self.despawn(client.id, client.body);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Removes a departed client's body and tells everyone else
    fn despawn(&mut self, client_id: u32, body: Option<BodyId>) {
        let Some(body_id) = body else {
            return;
        };
        self.game_state.remove_player(body_id);
        self.broadcast_packet(Packet::PlayerLeft { client_id, body_id }, Some(client_id));
    }

    /// Feeds the elapsed time to the stepper and broadcasts the result
    async fn poll_simulation(&mut self, elapsed: Duration) {
        let inputs = {
            let clients = self.clients.read().await;
            clients.latest_inputs()
        };

        let outcome = self.game_state.advance(elapsed.as_secs_f64(), inputs);
        let Some(snapshot) = outcome.snapshot else {
            return;
        };

        let tick = self.game_state.tick();
        let client_count = self.clients.read().await.len();
        if client_count > 0 {
            self.broadcast_packet(Packet::Snapshot { tick, snapshot }, None);
        }

        let crossed_status = tick / STATUS_INTERVAL_TICKS
            != (tick - u64::from(outcome.poll.steps)) / STATUS_INTERVAL_TICKS;
        if crossed_status {
            debug!(
                "Tick {}: {} clients, {} bodies, {} new contacts this poll",
                tick,
                client_count,
                self.game_state.world.body_count(),
                outcome.poll.events.len()
            );
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut last_poll = Instant::now();

        info!("Server started successfully");

        loop {
            let deadline = last_poll + self.game_state.stepper.time_until_next_step();

            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id, body }) => {
                            self.despawn(client_id, body);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = sleep_until(deadline) => {
                    let now = Instant::now();
                    let elapsed = now.duration_since(last_poll);
                    last_poll = now;

                    self.poll_simulation(elapsed).await;
                },
            }
        }

        Ok(())
    }
}

async fn send_to(socket: &UdpSocket, packet: &Packet, addr: SocketAddr) {
    let data = match packet.encode() {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to encode packet for {}: {}", addr, e);
            return;
        }
    };
    if let Err(e) = socket.send_to(&data, addr).await {
        error!("Failed to send packet to {}: {}", addr, e);
    }
}

fn spawn_failure_reason(error: &PhysicsError) -> String {
    format!("Could not spawn player: {}", error)
}
