//! Body groups and the pairwise broad phase that runs between them.
//!
//! A collider binds two groups (possibly the same one, for self-collision) and
//! reports every intersecting pair it finds. Groups are plain id lists owned by
//! the world; colliders never hold bodies themselves.

use crate::arena::BodyArena;
use crate::body::{BodyId, Contact};
use crate::error::{PhysicsError, PhysicsResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Handle to a group of bodies registered with a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub usize);

/// Handle to a collider registered with a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColliderId(pub usize);

/// An intersecting pair found during detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub a: BodyId,
    pub b: BodyId,
    pub collider: ColliderId,
    pub contact: Contact,
}

/// Registry of dynamic body sets.
#[derive(Debug, Default)]
pub struct GroupSet {
    groups: Vec<Vec<BodyId>>,
}

impl GroupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, members: &[BodyId]) -> GroupId {
        let mut group = Vec::with_capacity(members.len());
        for id in members {
            if !group.contains(id) {
                group.push(*id);
            }
        }
        self.groups.push(group);
        GroupId(self.groups.len() - 1)
    }

    pub fn get(&self, group: GroupId) -> PhysicsResult<&[BodyId]> {
        self.groups
            .get(group.0)
            .map(Vec::as_slice)
            .ok_or(PhysicsError::UnknownGroup { group: group.0 })
    }

    /// Adds `id` unless it is already a member.
    pub fn insert(&mut self, group: GroupId, id: BodyId) -> PhysicsResult<()> {
        let members = self
            .groups
            .get_mut(group.0)
            .ok_or(PhysicsError::UnknownGroup { group: group.0 })?;
        if !members.contains(&id) {
            members.push(id);
        }
        Ok(())
    }

    pub fn remove(&mut self, group: GroupId, id: BodyId) -> bool {
        match self.groups.get_mut(group.0) {
            Some(members) => {
                let before = members.len();
                members.retain(|member| *member != id);
                members.len() != before
            }
            None => false,
        }
    }

    /// Drops `id` from every group. Returns how many groups contained it.
    pub fn remove_everywhere(&mut self, id: BodyId) -> usize {
        let mut removed = 0;
        for members in &mut self.groups {
            let before = members.len();
            members.retain(|member| *member != id);
            removed += before - members.len();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Pairs two groups for collision detection.
#[derive(Debug, Clone)]
pub struct Collider {
    id: ColliderId,
    group_a: GroupId,
    group_b: GroupId,
}

impl Collider {
    pub fn new(id: ColliderId, group_a: GroupId, group_b: GroupId) -> Self {
        Self {
            id,
            group_a,
            group_b,
        }
    }

    pub fn id(&self) -> ColliderId {
        self.id
    }

    pub fn groups(&self) -> (GroupId, GroupId) {
        (self.group_a, self.group_b)
    }

    /// Removes `id` from both bound groups.
    pub fn remove_body(&self, groups: &mut GroupSet, id: BodyId) -> bool {
        let from_a = groups.remove(self.group_a, id);
        let from_b = groups.remove(self.group_b, id);
        from_a || from_b
    }

    /// Scans every (a, b) pair of the bound groups.
    ///
    /// Self-pairs and pairs of two immovable bodies are skipped, and each
    /// unordered pair is tested at most once per call even when the groups
    /// overlap. Ids that are no longer in `bodies` are ignored.
    pub fn find_collisions(
        &self,
        bodies: &BodyArena,
        groups: &GroupSet,
    ) -> PhysicsResult<Vec<Collision>> {
        let group_a = groups.get(self.group_a)?;
        let group_b = groups.get(self.group_b)?;

        let mut collisions = Vec::new();
        let mut seen: HashSet<(BodyId, BodyId)> = HashSet::new();

        for &id_a in group_a {
            let Some(a) = bodies.get(id_a) else {
                continue;
            };
            for &id_b in group_b {
                if id_a == id_b {
                    continue;
                }
                let key = (id_a.min(id_b), id_a.max(id_b));
                if !seen.insert(key) {
                    continue;
                }
                let Some(b) = bodies.get(id_b) else {
                    continue;
                };
                if a.is_immovable() && b.is_immovable() {
                    continue;
                }
                if let Some(contact) = a.contact_with(b) {
                    collisions.push(Collision {
                        a: id_a,
                        b: id_b,
                        collider: self.id,
                        contact,
                    });
                }
            }
        }

        Ok(collisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Body, BodyOptions};
    use crate::vector::Vector;

    fn square(arena: &mut BodyArena, x: f64, options: BodyOptions) -> BodyId {
        let body = Body::new_box(Vector::new(x, 0.0), Vector::new(x + 10.0, 10.0), options).unwrap();
        arena.insert(body)
    }

    #[test]
    fn test_group_set_membership() {
        let mut groups = GroupSet::new();
        let id = BodyId(9_000_001);
        let group = groups.create(&[id, id]);

        assert_eq!(groups.get(group).unwrap(), &[id]);
        groups.insert(group, id).unwrap();
        assert_eq!(groups.get(group).unwrap().len(), 1);

        assert!(groups.remove(group, id));
        assert!(!groups.remove(group, id));
        assert!(groups.get(GroupId(42)).is_err());
        assert!(groups.insert(GroupId(42), id).is_err());
    }

    #[test]
    fn test_self_collision_group_reports_each_pair_once() {
        let mut arena = BodyArena::new();
        let a = square(&mut arena, 0.0, BodyOptions::default());
        let b = square(&mut arena, 5.0, BodyOptions::default());
        let c = square(&mut arena, 100.0, BodyOptions::default());

        let mut groups = GroupSet::new();
        let all = groups.create(&[a, b, c]);
        let collider = Collider::new(ColliderId(0), all, all);

        let collisions = collider.find_collisions(&arena, &groups).unwrap();
        assert_eq!(collisions.len(), 1);
        assert_eq!((collisions[0].a, collisions[0].b), (a, b));
        assert_eq!(collisions[0].contact, Contact::BoxBox);
    }

    #[test]
    fn test_overlapping_groups_do_not_duplicate_pairs() {
        let mut arena = BodyArena::new();
        let a = square(&mut arena, 0.0, BodyOptions::default());
        let b = square(&mut arena, 5.0, BodyOptions::default());

        let mut groups = GroupSet::new();
        let left = groups.create(&[a, b]);
        let right = groups.create(&[b, a]);
        let collider = Collider::new(ColliderId(0), left, right);

        assert_eq!(collider.find_collisions(&arena, &groups).unwrap().len(), 1);
    }

    #[test]
    fn test_immovable_pairs_are_skipped() {
        let fixed = BodyOptions {
            is_static: true,
            ..Default::default()
        };
        let mut arena = BodyArena::new();
        let a = square(&mut arena, 0.0, fixed);
        let b = square(&mut arena, 5.0, fixed);
        let c = square(&mut arena, 2.0, BodyOptions::default());

        let mut groups = GroupSet::new();
        let walls = groups.create(&[a, b]);
        let movers = groups.create(&[c]);

        let pair_of_walls = Collider::new(ColliderId(0), walls, walls);
        assert!(pair_of_walls.find_collisions(&arena, &groups).unwrap().is_empty());

        let walls_vs_movers = Collider::new(ColliderId(1), walls, movers);
        assert_eq!(walls_vs_movers.find_collisions(&arena, &groups).unwrap().len(), 2);
    }

    #[test]
    fn test_overlap_only_bodies_are_still_detected() {
        let trigger = BodyOptions {
            overlap_only: true,
            ..Default::default()
        };
        let mut arena = BodyArena::new();
        let a = square(&mut arena, 0.0, trigger);
        let b = square(&mut arena, 5.0, BodyOptions::default());

        let mut groups = GroupSet::new();
        let ga = groups.create(&[a]);
        let gb = groups.create(&[b]);
        let collider = Collider::new(ColliderId(3), ga, gb);

        let collisions = collider.find_collisions(&arena, &groups).unwrap();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].collider, ColliderId(3));
    }

    #[test]
    fn test_remove_body_from_both_groups() {
        let mut arena = BodyArena::new();
        let a = square(&mut arena, 0.0, BodyOptions::default());
        let b = square(&mut arena, 5.0, BodyOptions::default());

        let mut groups = GroupSet::new();
        let ga = groups.create(&[a, b]);
        let gb = groups.create(&[a]);
        let collider = Collider::new(ColliderId(0), ga, gb);

        assert!(collider.remove_body(&mut groups, a));
        assert_eq!(groups.get(ga).unwrap(), &[b]);
        assert!(groups.get(gb).unwrap().is_empty());
        assert!(!collider.remove_body(&mut groups, a));
    }

    #[test]
    fn test_stale_ids_are_ignored() {
        let mut arena = BodyArena::new();
        let a = square(&mut arena, 0.0, BodyOptions::default());
        let b = square(&mut arena, 5.0, BodyOptions::default());

        let mut groups = GroupSet::new();
        let all = groups.create(&[a, b]);
        arena.remove(b);

        let collider = Collider::new(ColliderId(0), all, all);
        assert!(collider.find_collisions(&arena, &groups).unwrap().is_empty());
    }
}
