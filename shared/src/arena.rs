use crate::body::{Body, BodyId};
use std::collections::HashMap;

/// Dense body storage addressed by [`BodyId`].
///
/// Bodies live in a single vector; removal swaps the last body into the freed
/// slot and patches its index, so iteration stays cache-friendly.
#[derive(Debug, Default)]
pub struct BodyArena {
    bodies: Vec<Body>,
    slots: HashMap<BodyId, usize>,
}

impl BodyArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: Body) -> BodyId {
        let id = body.id();
        if let Some(&slot) = self.slots.get(&id) {
            self.bodies[slot] = body;
        } else {
            self.slots.insert(id, self.bodies.len());
            self.bodies.push(body);
        }
        id
    }

    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let slot = self.slots.remove(&id)?;
        let body = self.bodies.swap_remove(slot);
        if let Some(moved) = self.bodies.get(slot) {
            self.slots.insert(moved.id(), slot);
        }
        Some(body)
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.slots.get(&id).map(|&slot| &self.bodies[slot])
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        match self.slots.get(&id) {
            Some(&slot) => Some(&mut self.bodies[slot]),
            None => None,
        }
    }

    /// Borrows two distinct bodies mutably at once.
    pub fn pair_mut(&mut self, a: BodyId, b: BodyId) -> Option<(&mut Body, &mut Body)> {
        let slot_a = *self.slots.get(&a)?;
        let slot_b = *self.slots.get(&b)?;
        if slot_a == slot_b {
            return None;
        }

        if slot_a < slot_b {
            let (head, tail) = self.bodies.split_at_mut(slot_b);
            Some((&mut head[slot_a], &mut tail[0]))
        } else {
            let (head, tail) = self.bodies.split_at_mut(slot_a);
            Some((&mut tail[0], &mut head[slot_b]))
        }
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
