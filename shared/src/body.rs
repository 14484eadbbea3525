//! Rigid-body records and their shape-level intersection tests.
//!
//! A [`Body`] is either an axis-aligned box or a disc. For a box `position` is its
//! top-left corner (minimum bound); for a disc it is the center. Shape pairs are
//! dispatched through [`Shape`] rather than through virtual calls, and the box/disc
//! test keeps the nearest point on the box so the resolver can reuse it.

use crate::error::{PhysicsError, PhysicsResult};
use crate::vector::Vector;
use crate::ROUND_DECIMALS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_BODY_ID: AtomicU32 = AtomicU32::new(0);

/// Process-unique body identifier. Ids increase monotonically and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    fn next() -> Self {
        BodyId(NEXT_BODY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-aligned bounds, `min` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector,
    pub max: Vector,
}

impl Aabb {
    pub fn new(min: Vector, max: Vector) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Strict overlap: boxes that only share an edge do not intersect.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Nearest point of the box to `point` (the point itself when inside).
    pub fn closest_point(&self, point: Vector) -> Vector {
        point.clamp(self.min, self.max)
    }

    pub fn contains(&self, point: Vector) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }
}

/// Geometry of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box { width: f64, height: f64 },
    Disc { radius: f64 },
}

/// Narrow-phase result for an intersecting pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    BoxBox,
    DiscDisc,
    /// `point` is the nearest point on the box to the disc center.
    BoxDisc { point: Vector },
}

/// Which sides of a body touched something during the last resolved tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactFlags {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl ContactFlags {
    pub fn clear(&mut self) {
        *self = ContactFlags::default();
    }

    pub fn any(&self) -> bool {
        self.top || self.bottom || self.left || self.right
    }
}

/// Creation-time settings shared by every shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyOptions {
    /// Zero mass means infinitely heavy.
    pub mass: f64,
    pub is_static: bool,
    /// Trigger volume: detected and reported, never pushed.
    pub overlap_only: bool,
    pub restitution: f64,
    pub friction: f64,
    /// Skip the automatic pairing against the world walls.
    pub ignore_world_bounds: bool,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            mass: 1.0,
            is_static: false,
            overlap_only: false,
            restitution: 0.0,
            friction: 0.0,
            ignore_world_bounds: false,
        }
    }
}

/// A simulated rigid body.
#[derive(Debug, Clone)]
pub struct Body {
    id: BodyId,
    shape: Shape,
    pub position: Vector,
    pub velocity: Vector,
    pub acceleration: Vector,
    is_static: bool,
    overlap_only: bool,
    inverse_mass: f64,
    ignore_world_bounds: bool,
    pub restitution: f64,
    pub friction: f64,
    /// Speed cap. `None` or a negative value means unconstrained.
    pub max_speed: Option<f64>,
    pub max_velocity_x: Option<f64>,
    pub max_velocity_y: Option<f64>,
    pub contacts: ContactFlags,
}

impl Body {
    /// Creates a box spanning `min`..`max`.
    pub fn new_box(min: Vector, max: Vector, options: BodyOptions) -> PhysicsResult<Body> {
        let width = max.x - min.x;
        let height = max.y - min.y;
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(PhysicsError::InvalidDimensions { width, height });
        }
        Ok(Self::with_shape(Shape::Box { width, height }, min, options))
    }

    /// Creates a disc centered on `center`.
    pub fn new_disc(center: Vector, radius: f64, options: BodyOptions) -> PhysicsResult<Body> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(PhysicsError::InvalidRadius { radius });
        }
        Ok(Self::with_shape(Shape::Disc { radius }, center, options))
    }

    fn with_shape(shape: Shape, position: Vector, options: BodyOptions) -> Body {
        let inverse_mass = if options.is_static || options.mass == 0.0 {
            0.0
        } else {
            1.0 / options.mass
        };

        Body {
            id: BodyId::next(),
            shape,
            position,
            velocity: Vector::ZERO,
            acceleration: Vector::ZERO,
            is_static: options.is_static,
            overlap_only: options.overlap_only,
            inverse_mass,
            ignore_world_bounds: options.ignore_world_bounds,
            restitution: options.restitution.clamp(0.0, 1.0),
            friction: options.friction.max(0.0),
            max_speed: None,
            max_velocity_x: None,
            max_velocity_y: None,
            contacts: ContactFlags::default(),
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn is_box(&self) -> bool {
        matches!(self.shape, Shape::Box { .. })
    }

    pub fn is_disc(&self) -> bool {
        matches!(self.shape, Shape::Disc { .. })
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_overlap_only(&self) -> bool {
        self.overlap_only
    }

    pub fn ignores_world_bounds(&self) -> bool {
        self.ignore_world_bounds
    }

    /// Fixed at construction; zero means immovable by impulses.
    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    pub fn is_immovable(&self) -> bool {
        self.inverse_mass == 0.0
    }

    /// Current bounds, derived from `position` every time.
    pub fn bounds(&self) -> Aabb {
        match self.shape {
            Shape::Box { width, height } => Aabb::new(
                self.position,
                Vector::new(self.position.x + width, self.position.y + height),
            ),
            Shape::Disc { radius } => Aabb::new(
                Vector::new(self.position.x - radius, self.position.y - radius),
                Vector::new(self.position.x + radius, self.position.y + radius),
            ),
        }
    }

    pub fn center(&self) -> Vector {
        match self.shape {
            Shape::Box { width, height } => {
                Vector::new(self.position.x + width / 2.0, self.position.y + height / 2.0)
            }
            Shape::Disc { .. } => self.position,
        }
    }

    pub fn intersects(&self, other: &Body) -> bool {
        self.contact_with(other).is_some()
    }

    /// Runs the narrow-phase test for this shape pair.
    pub fn contact_with(&self, other: &Body) -> Option<Contact> {
        match (self.shape, other.shape) {
            (Shape::Box { .. }, Shape::Box { .. }) => {
                self.bounds().overlaps(&other.bounds()).then_some(Contact::BoxBox)
            }
            (Shape::Disc { radius: ra }, Shape::Disc { radius: rb }) => {
                let reach = ra + rb;
                (self.position.distance_squared(other.position) < reach * reach)
                    .then_some(Contact::DiscDisc)
            }
            (Shape::Box { .. }, Shape::Disc { radius }) => {
                box_disc_contact(&self.bounds(), other.position, radius)
            }
            (Shape::Disc { radius }, Shape::Box { .. }) => {
                box_disc_contact(&other.bounds(), self.position, radius)
            }
        }
    }

    /// Advances velocity and position by one step. Static bodies never move,
    /// but their contact flags are reset like everyone else's.
    pub fn integrate(&mut self, gravity: Vector, dt: f64) {
        self.contacts.clear();
        if self.is_static {
            return;
        }

        let mut velocity = self.velocity + (self.acceleration + gravity) * dt;
        if let Some(max) = self.max_velocity_x.filter(|max| *max >= 0.0) {
            velocity.x = velocity.x.clamp(-max, max);
        }
        if let Some(max) = self.max_velocity_y.filter(|max| *max >= 0.0) {
            velocity.y = velocity.y.clamp(-max, max);
        }
        if let Some(max) = self.max_speed.filter(|max| *max >= 0.0) {
            velocity = velocity.clamp_length(max);
        }

        self.velocity = velocity;
        self.position = self.position + velocity * dt;
        self.round_values();
    }

    fn round_values(&mut self) {
        self.position = self.position.round(ROUND_DECIMALS);
        self.velocity = self.velocity.round(ROUND_DECIMALS);
        self.acceleration = self.acceleration.round(ROUND_DECIMALS);
    }
}

fn box_disc_contact(bounds: &Aabb, center: Vector, radius: f64) -> Option<Contact> {
    let point = bounds.closest_point(center);
    (point.distance_squared(center) < radius * radius).then_some(Contact::BoxDisc { point })
}
