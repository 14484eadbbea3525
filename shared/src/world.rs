//! The simulation world and its fixed tick.
//!
//! [`World::step`] runs four phases in order: integrate every non-static body,
//! gather collisions from every collider, resolve them one by one, and report the
//! pairs that were not already touching. A pair stays "remembered" for
//! [`DEBOUNCE_TICKS`] ticks after it was last seen, so bodies resting on each other
//! produce one event rather than one per tick.

use crate::arena::BodyArena;
use crate::body::{Body, BodyId};
use crate::collider::{Collider, ColliderId, Collision, GroupId, GroupSet};
use crate::error::PhysicsResult;
use crate::resolve::resolve_pair;
use crate::spawner::Spawner;
use crate::vector::Vector;
use crate::DEBOUNCE_TICKS;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A pair that started touching this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub a: BodyId,
    pub b: BodyId,
    pub collider: ColliderId,
}

/// Boundary walls installed by [`Spawner::configure_world_bounds`].
#[derive(Debug, Clone)]
pub struct WorldBounds {
    pub width: f64,
    pub height: f64,
    pub(crate) walls: Vec<BodyId>,
    pub(crate) wall_group: GroupId,
    pub(crate) bounded_group: GroupId,
    pub(crate) collider: ColliderId,
}

impl WorldBounds {
    pub fn walls(&self) -> &[BodyId] {
        &self.walls
    }

    /// Group holding every body that is kept inside the walls.
    pub fn bounded_group(&self) -> GroupId {
        self.bounded_group
    }

    pub fn collider(&self) -> ColliderId {
        self.collider
    }
}

#[derive(Debug)]
pub struct World {
    bodies: BodyArena,
    groups: GroupSet,
    colliders: Vec<Collider>,
    gravity: Vector,
    tick: u64,
    touching: HashMap<(BodyId, BodyId), u32>,
    bounds: Option<WorldBounds>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Vector::ZERO)
    }
}

impl World {
    pub fn new(gravity: Vector) -> Self {
        Self {
            bodies: BodyArena::new(),
            groups: GroupSet::new(),
            colliders: Vec::new(),
            gravity,
            tick: 0,
            touching: HashMap::new(),
            bounds: None,
        }
    }

    pub fn gravity(&self) -> Vector {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vector) {
        self.gravity = gravity;
    }

    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Creation helpers bound to this world.
    pub fn add(&mut self) -> Spawner<'_> {
        Spawner::new(self)
    }

    /// Registers a body. When world bounds are configured the body is paired
    /// against the walls unless it opted out.
    pub fn insert_body(&mut self, body: Body) -> BodyId {
        let bounded = !body.ignores_world_bounds();
        let id = self.bodies.insert(body);

        if bounded {
            if let Some(bounds) = &self.bounds {
                if let Err(e) = self.groups.insert(bounds.bounded_group, id) {
                    warn!("Body {} not kept inside world bounds: {}", id, e);
                }
            }
        }
        id
    }

    /// Removes a body from the world, every group and the contact memory.
    ///
    /// Returns `false` if the id was unknown or already removed.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        if self.bodies.remove(id).is_none() {
            return false;
        }

        self.groups.remove_everywhere(id);
        self.touching.retain(|(a, b), _| *a != id && *b != id);
        if let Some(bounds) = &mut self.bounds {
            bounds.walls.retain(|wall| *wall != id);
        }

        info!("Removed body {}", id);
        true
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains(id)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn create_group(&mut self, members: &[BodyId]) -> GroupId {
        self.groups.create(members)
    }

    pub fn add_to_group(&mut self, group: GroupId, id: BodyId) -> PhysicsResult<()> {
        self.groups.insert(group, id)
    }

    pub fn remove_from_group(&mut self, group: GroupId, id: BodyId) -> bool {
        self.groups.remove(group, id)
    }

    pub fn group(&self, group: GroupId) -> PhysicsResult<&[BodyId]> {
        self.groups.get(group)
    }

    /// Pairs two groups. Both must already exist.
    pub fn add_collider(&mut self, group_a: GroupId, group_b: GroupId) -> PhysicsResult<ColliderId> {
        self.groups.get(group_a)?;
        self.groups.get(group_b)?;

        let id = ColliderId(self.colliders.len());
        self.colliders.push(Collider::new(id, group_a, group_b));
        Ok(id)
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(id.0)
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// Takes `id` out of both groups of one collider, leaving the body alive.
    pub fn detach_from_collider(&mut self, collider: ColliderId, id: BodyId) -> bool {
        match self.colliders.get(collider.0) {
            Some(collider) => collider.remove_body(&mut self.groups, id),
            None => false,
        }
    }

    pub fn bounds(&self) -> Option<&WorldBounds> {
        self.bounds.as_ref()
    }

    pub(crate) fn bounds_mut(&mut self) -> Option<&mut WorldBounds> {
        self.bounds.as_mut()
    }

    pub(crate) fn set_bounds(&mut self, bounds: WorldBounds) {
        self.bounds = Some(bounds);
    }

    /// Whether `a` and `b` are inside the debounce window.
    pub fn is_touching(&self, a: BodyId, b: BodyId) -> bool {
        self.touching.contains_key(&(a, b))
    }

    /// Advances the world by `dt` seconds and returns the new contacts.
    pub fn step(&mut self, dt: f64) -> Vec<ContactEvent> {
        self.tick += 1;

        self.integrate(dt);
        let collisions = self.detect();
        for collision in &collisions {
            self.resolve(collision);
        }
        let events = self.notify(&collisions);

        if !events.is_empty() {
            debug!(
                "Tick {}: {} collisions, {} new contacts",
                self.tick,
                collisions.len(),
                events.len()
            );
        }
        events
    }

    fn integrate(&mut self, dt: f64) {
        let gravity = self.gravity;
        for body in self.bodies.iter_mut() {
            body.integrate(gravity, dt);
        }
    }

    fn detect(&self) -> Vec<Collision> {
        let mut collisions = Vec::new();
        for collider in &self.colliders {
            match collider.find_collisions(&self.bodies, &self.groups) {
                Ok(found) => collisions.extend(found),
                Err(e) => warn!("Collider {:?} skipped: {}", collider.id(), e),
            }
        }
        collisions
    }

    fn resolve(&mut self, collision: &Collision) {
        if let Some((a, b)) = self.bodies.pair_mut(collision.a, collision.b) {
            resolve_pair(a, b, collision.contact);
        }
    }

    fn notify(&mut self, collisions: &[Collision]) -> Vec<ContactEvent> {
        self.touching.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });

        let mut events = Vec::new();
        for collision in collisions {
            let (a, b) = (collision.a, collision.b);
            if !self.touching.contains_key(&(a, b)) {
                events.push(ContactEvent {
                    a,
                    b,
                    collider: collision.collider,
                });
            }
            self.touching.insert((a, b), DEBOUNCE_TICKS);
            self.touching.insert((b, a), DEBOUNCE_TICKS);
        }
        events
    }
}
