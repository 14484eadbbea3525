//! Authoritative 2D rigid-body simulation shared by the server and its tools.
//!
//! Boxes and discs live in a [`World`], which advances them on a fixed timestep:
//! integrate, detect overlaps between registered body groups, resolve them with
//! impulses and positional correction, then report fresh contacts. A [`Stepper`]
//! drives the world from wall-clock time and the [`protocol`] module carries the
//! resulting snapshots over the wire.

pub mod arena;
pub mod body;
pub mod collider;
pub mod error;
pub mod protocol;
pub mod resolve;
pub mod spawner;
pub mod stepper;
pub mod vector;
pub mod world;

pub use body::{Aabb, Body, BodyId, BodyOptions, Contact, ContactFlags, Shape};
pub use collider::{ColliderId, Collision, GroupId};
pub use error::{PhysicsError, PhysicsResult};
pub use protocol::{BodyState, Extent, InputState, Packet, Snapshot, PROTOCOL_VERSION};
pub use spawner::Spawner;
pub use stepper::{PollOutcome, StepHooks, Stepper, StepperState};
pub use vector::Vector;
pub use world::{ContactEvent, World, WorldBounds};

/// Simulation step in seconds (60 Hz).
pub const DEFAULT_TIMESTEP: f64 = 1.0 / 60.0;
/// Upper bound on full steps per stepper poll before the catch-up jump.
pub const MAX_SUBSTEPS: u32 = 240;
/// Ticks a contact pair stays remembered after it was last seen.
pub const DEBOUNCE_TICKS: u32 = 5;
/// Penetration tolerated before positions are corrected.
pub const POSITION_SLOP: f64 = 0.1;
pub const CORRECTION_PERCENT: f64 = 0.8;
/// Decimal digits kept on positions, velocities and accelerations.
pub const ROUND_DECIMALS: i32 = 5;
/// How far the boundary walls reach past the play area.
pub const WORLD_BUFFER: f64 = 1_000_000.0;
