use crate::body::{Body, BodyId, BodyOptions};
use crate::collider::{ColliderId, GroupId};
use crate::error::{PhysicsError, PhysicsResult};
use crate::vector::Vector;
use crate::world::{World, WorldBounds};
use crate::WORLD_BUFFER;
use log::{info, warn};

/// Convenience layer for populating a [`World`]. Obtained from [`World::add`].
pub struct Spawner<'a> {
    world: &'a mut World,
}

impl<'a> Spawner<'a> {
    pub(crate) fn new(world: &'a mut World) -> Self {
        Self { world }
    }

    /// Creates a box spanning `(min_x, min_y)`..`(max_x, max_y)`.
    pub fn spawn_box(
        &mut self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        options: BodyOptions,
    ) -> PhysicsResult<BodyId> {
        let body = Body::new_box(Vector::new(min_x, min_y), Vector::new(max_x, max_y), options)?;
        Ok(self.world.insert_body(body))
    }

    pub fn spawn_disc(
        &mut self,
        center_x: f64,
        center_y: f64,
        radius: f64,
        options: BodyOptions,
    ) -> PhysicsResult<BodyId> {
        let body = Body::new_disc(Vector::new(center_x, center_y), radius, options)?;
        Ok(self.world.insert_body(body))
    }

    pub fn group(&mut self, members: &[BodyId]) -> GroupId {
        self.world.create_group(members)
    }

    pub fn collider(&mut self, group_a: GroupId, group_b: GroupId) -> PhysicsResult<ColliderId> {
        self.world.add_collider(group_a, group_b)
    }

    /// Walls the play area `(0, 0)`..`(width, height)` in with four static boxes
    /// reaching [`WORLD_BUFFER`] units outward. The side walls also cover the
    /// corners.
    ///
    /// Bodies already in the world and every body spawned afterwards are kept
    /// inside unless they set `ignore_world_bounds`. Calling this again moves the
    /// walls; the bounded group and its collider are kept.
    pub fn configure_world_bounds(&mut self, width: f64, height: f64) -> PhysicsResult<WorldBounds> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(PhysicsError::InvalidDimensions { width, height });
        }

        let walls = self.spawn_walls(width, height)?;

        if let Some(old_walls) = self.world.bounds().map(|bounds| bounds.walls.clone()) {
            warn!("World bounds reconfigured to {}x{}", width, height);
            for wall in old_walls {
                self.world.remove_body(wall);
            }
            if let Some(bounds) = self.world.bounds_mut() {
                bounds.width = width;
                bounds.height = height;
                bounds.walls = walls.clone();
            }
            let wall_group = self.world.bounds().map(|bounds| bounds.wall_group);
            if let Some(wall_group) = wall_group {
                for wall in walls {
                    self.world.add_to_group(wall_group, wall)?;
                }
            }
        } else {
            let bounded: Vec<BodyId> = self
                .world
                .bodies()
                .filter(|body| !body.ignores_world_bounds())
                .map(|body| body.id())
                .collect();

            let wall_group = self.world.create_group(&walls);
            let bounded_group = self.world.create_group(&bounded);
            let collider = self.world.add_collider(bounded_group, wall_group)?;

            self.world.set_bounds(WorldBounds {
                width,
                height,
                walls,
                wall_group,
                bounded_group,
                collider,
            });
            info!("World bounds set to {}x{}", width, height);
        }

        self.world
            .bounds()
            .cloned()
            .ok_or(PhysicsError::InvalidDimensions { width, height })
    }

    fn spawn_walls(&mut self, width: f64, height: f64) -> PhysicsResult<Vec<BodyId>> {
        let wall = BodyOptions {
            mass: 0.0,
            is_static: true,
            ignore_world_bounds: true,
            ..Default::default()
        };

        Ok(vec![
            self.spawn_box(-WORLD_BUFFER, -WORLD_BUFFER, 0.0, height + WORLD_BUFFER, wall)?,
            self.spawn_box(0.0, -WORLD_BUFFER, width, 0.0, wall)?,
            self.spawn_box(width, -WORLD_BUFFER, width + WORLD_BUFFER, height + WORLD_BUFFER, wall)?,
            self.spawn_box(0.0, height, width, height + WORLD_BUFFER, wall)?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_registers_bodies() {
        let mut world = World::default();
        let mut add = world.add();
        let crate_box = add.spawn_box(0.0, 0.0, 10.0, 20.0, BodyOptions::default()).unwrap();
        let ball = add.spawn_disc(50.0, 50.0, 5.0, BodyOptions::default()).unwrap();
        let group = add.group(&[crate_box, ball]);
        let collider = add.collider(group, group).unwrap();

        assert_eq!(world.body_count(), 2);
        assert!(world.body(crate_box).unwrap().is_box());
        assert_eq!(world.body(ball).unwrap().position, Vector::new(50.0, 50.0));
        assert!(world.collider(collider).is_some());
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        let mut world = World::default();
        let mut add = world.add();

        assert!(add.spawn_box(10.0, 0.0, 10.0, 5.0, BodyOptions::default()).is_err());
        assert!(add.spawn_disc(0.0, 0.0, 0.0, BodyOptions::default()).is_err());
        assert!(add.configure_world_bounds(0.0, 600.0).is_err());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_world_bounds_wire_new_bodies() {
        let mut world = World::default();
        let early = world.add().spawn_disc(10.0, 10.0, 5.0, BodyOptions::default()).unwrap();

        let bounds = world.add().configure_world_bounds(800.0, 600.0).unwrap();
        let walls = bounds.walls().to_vec();
        let bounded = bounds.bounded_group();
        assert_eq!(walls.len(), 4);

        let late = world.add().spawn_box(100.0, 100.0, 116.0, 132.0, BodyOptions::default()).unwrap();
        let ghost = world
            .add()
            .spawn_disc(
                400.0,
                300.0,
                5.0,
                BodyOptions {
                    ignore_world_bounds: true,
                    ..Default::default()
                },
            )
            .unwrap();

        let members = world.group(bounded).unwrap();
        assert!(members.contains(&early));
        assert!(members.contains(&late));
        assert!(!members.contains(&ghost));
        assert!(walls.iter().all(|wall| !members.contains(wall)));
        assert!(walls.iter().all(|wall| world.body(*wall).unwrap().is_immovable()));

        let right = world.body(walls[2]).unwrap().bounds();
        assert_eq!(right.min, Vector::new(800.0, -WORLD_BUFFER));
        assert_eq!(right.max, Vector::new(800.0 + WORLD_BUFFER, 600.0 + WORLD_BUFFER));
    }

    #[test]
    fn test_reconfiguring_bounds_replaces_walls() {
        let mut world = World::default();
        let old_walls = world.add().configure_world_bounds(800.0, 600.0).unwrap().walls().to_vec();
        let collider = world.bounds().unwrap().collider();

        let new_walls = world.add().configure_world_bounds(400.0, 300.0).unwrap().walls().to_vec();

        assert!(old_walls.iter().all(|wall| !world.contains(*wall)));
        assert_eq!(world.body_count(), 4);
        assert_eq!(world.colliders().len(), 1);
        assert_eq!(world.bounds().unwrap().collider(), collider);
        assert_eq!(world.bounds().unwrap().width, 400.0);

        let bottom = world.body(new_walls[3]).unwrap().bounds();
        assert_eq!(bottom.min, Vector::new(0.0, 300.0));
    }

    #[test]
    fn test_disc_stays_inside_bounds_under_large_velocity() {
        let mut world = World::default();
        world.add().configure_world_bounds(800.0, 600.0).unwrap();
        let ball = world
            .add()
            .spawn_disc(
                400.0,
                300.0,
                25.0,
                BodyOptions {
                    restitution: 1.0,
                    ..Default::default()
                },
            )
            .unwrap();

        world.body_mut(ball).unwrap().velocity = Vector::new(2000.0, -1500.0);
        for _ in 0..300 {
            world.step(1.0 / 60.0);
            let center = world.body(ball).unwrap().position;
            assert!(center.x >= 0.0 && center.x <= 800.0, "x escaped: {}", center.x);
            assert!(center.y >= 0.0 && center.y <= 600.0, "y escaped: {}", center.y);
        }
    }

    #[test]
    fn test_disc_deep_inside_wall_is_pushed_back_into_arena() {
        for speed in [5_000.0, 10_000.0, 20_000.0, -20_000.0] {
            let mut world = World::default();
            world.add().configure_world_bounds(800.0, 600.0).unwrap();
            let ball = world
                .add()
                .spawn_disc(400.0, 300.0, 25.0, BodyOptions::default())
                .unwrap();

            world.body_mut(ball).unwrap().velocity = Vector::new(speed, 0.0);
            for _ in 0..120 {
                world.step(1.0 / 60.0);
                let x = world.body(ball).unwrap().position.x;
                assert!((0.0..=800.0).contains(&x), "x escaped to {} at {}", x, speed);
            }
        }
    }
}
