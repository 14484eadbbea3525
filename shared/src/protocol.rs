//! Datagram types exchanged between the server and its clients.
//!
//! Every datagram is a single bincode-encoded [`Packet`]. Clients send their
//! latest [`InputState`]; the server answers every tick with a [`Snapshot`] of
//! the bodies it tracks per category.

use crate::body::{Body, BodyId, Shape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bumped whenever the packet layout changes.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Input(InputState),
    Disconnect,

    Connected {
        client_id: u32,
        body_id: BodyId,
    },
    Snapshot {
        tick: u64,
        snapshot: Snapshot,
    },
    PlayerLeft {
        client_id: u32,
        body_id: BodyId,
    },
    Disconnected {
        reason: String,
    },
}

impl Packet {
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Packet, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Direction keys held by a client. Higher sequence numbers replace lower ones.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub sequence: u32,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Size of a body as sent to clients.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum Extent {
    Rect { width: f64, height: f64 },
    Round { radius: f64 },
}

/// Position and size of one body. `x`/`y` follow [`Body::position`].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub x: f64,
    pub y: f64,
    pub extent: Extent,
}

impl From<&Body> for BodyState {
    fn from(body: &Body) -> Self {
        let extent = match body.shape() {
            Shape::Box { width, height } => Extent::Rect { width, height },
            Shape::Disc { radius } => Extent::Round { radius },
        };

        Self {
            x: body.position.x,
            y: body.position.y,
            extent,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub players: BTreeMap<BodyId, BodyState>,
    pub obstacles: BTreeMap<BodyId, BodyState>,
    pub discs: BTreeMap<BodyId, BodyState>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.players.len() + self.obstacles.len() + self.discs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
