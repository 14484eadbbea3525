//! # Arena Server Library
//!
//! Authoritative host for the shared physics [`World`](shared::World). The
//! server owns the only copy of the simulation, steps it on a fixed timestep and
//! broadcasts a snapshot of every category of body to connected clients.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Tracks connected clients:
//! - Client id assignment and the server capacity limit
//! - The newest input of each client, guarded by sequence number
//! - The player body owned by each client
//! - Timeout detection
//!
//! ### Game Module (`game`)
//! Builds the arena and drives it:
//! - World bounds, obstacles and the disc
//! - Body groups and the colliders between them
//! - Player spawning and input application
//! - Snapshots grouped into players, obstacles and discs
//!
//! ### Network Module (`network`)
//! UDP transport and the main loop:
//! - Packet decoding and the connect/disconnect handshake
//! - Waking the stepper when the next step is due
//! - Snapshot broadcast after every poll that advanced the world
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::GameConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:8080", GameConfig::default(), 16).await?;
//!
//!     // Receives packets, steps the world at 60Hz and broadcasts snapshots
//!     // until a Shutdown message arrives on `server.control()`.
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Internally the server runs three tasks next to the main loop:
//! - **Network Receiver**: decodes incoming datagrams
//! - **Network Sender**: drains the outgoing queue and fans out broadcasts
//! - **Timeout Checker**: drops clients that went silent

pub mod client_manager;
pub mod game;
pub mod network;
