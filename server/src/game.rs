use log::{debug, info};
use rand::Rng;
use shared::{
    Body, BodyId, BodyOptions, BodyState, ContactEvent, GroupId, InputState, PhysicsResult,
    PollOutcome, Snapshot, StepHooks, Stepper, Vector, World,
};
use std::collections::BTreeMap;

pub const WORLD_WIDTH: f64 = 800.0;
pub const WORLD_HEIGHT: f64 = 600.0;
pub const GRAVITY: f64 = 500.0;

pub const PLAYER_WIDTH: f64 = 16.0;
pub const PLAYER_HEIGHT: f64 = 32.0;
pub const PLAYER_MASS: f64 = 1.2;
pub const PLAYER_MAX_VELOCITY_X: f64 = 250.0;
pub const PLAYER_RESTITUTION: f64 = 0.1;
pub const PLAYER_FRICTION: f64 = 0.05;

/// Horizontal acceleration while left or right is held.
pub const RUN_ACCELERATION: f64 = 200.0;
pub const JUMP_VELOCITY: f64 = -250.0;
pub const FAST_FALL_VELOCITY: f64 = 210.0;

const OBSTACLES: [(f64, f64, f64, f64); 3] = [
    (300.0, 250.0, 340.0, 270.0),
    (350.0, 250.0, 390.0, 270.0),
    (400.0, 250.0, 440.0, 270.0),
];

/// Size of the arena and the pull of gravity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub width: f64,
    pub height: f64,
    pub gravity: f64,
    pub tick_rate: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            gravity: GRAVITY,
            tick_rate: 60,
        }
    }
}

/// Groups that make up each snapshot category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categories {
    pub players: GroupId,
    pub obstacles: GroupId,
    pub discs: GroupId,
}

/// The authoritative arena: a physics world populated with obstacles, a disc
/// and one box per connected player.
#[derive(Debug)]
pub struct GameState {
    pub world: World,
    pub stepper: Stepper,
    categories: Categories,
    config: GameConfig,
}

impl GameState {
    pub fn new(config: GameConfig) -> PhysicsResult<Self> {
        let mut world = World::new(Vector::new(0.0, config.gravity));
        let mut add = world.add();
        add.configure_world_bounds(config.width, config.height)?;

        let mut obstacle_ids = Vec::with_capacity(OBSTACLES.len());
        for (min_x, min_y, max_x, max_y) in OBSTACLES {
            obstacle_ids.push(add.spawn_box(
                min_x,
                min_y,
                max_x,
                max_y,
                BodyOptions {
                    restitution: 1.0,
                    friction: 0.05,
                    ..Default::default()
                },
            )?);
        }
        let disc = add.spawn_disc(
            400.0,
            300.0,
            25.0,
            BodyOptions {
                restitution: 1.0,
                friction: 0.01,
                ..Default::default()
            },
        )?;

        let players = add.group(&[]);
        let obstacles = add.group(&obstacle_ids);
        let discs = add.group(&[disc]);

        add.collider(players, players)?;
        add.collider(obstacles, obstacles)?;
        add.collider(obstacles, players)?;
        add.collider(discs, discs)?;
        add.collider(obstacles, discs)?;
        add.collider(players, discs)?;

        let mut stepper = Stepper::with_rate(config.tick_rate);
        stepper.start();

        info!(
            "Arena ready: {}x{}, gravity {}, {} bodies",
            config.width,
            config.height,
            config.gravity,
            world.body_count()
        );

        Ok(Self {
            world,
            stepper,
            categories: Categories {
                players,
                obstacles,
                discs,
            },
            config,
        })
    }

    pub fn categories(&self) -> Categories {
        self.categories
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Spawns a player box at a random spot in the upper half of the arena.
    pub fn add_player(&mut self) -> PhysicsResult<BodyId> {
        let mut rng = rand::thread_rng();
        let margin = 50.0_f64.min(self.config.width / 4.0);
        let max_x = (self.config.width - margin).max(margin + 1.0);
        let x = rng.gen_range(margin..max_x).round();
        let y = rng.gen_range(0.0..=self.config.height / 2.0).round();

        self.spawn_player_at(x, y)
    }

    pub fn spawn_player_at(&mut self, x: f64, y: f64) -> PhysicsResult<BodyId> {
        let id = self.world.add().spawn_box(
            x,
            y,
            x + PLAYER_WIDTH,
            y + PLAYER_HEIGHT,
            BodyOptions {
                mass: PLAYER_MASS,
                restitution: PLAYER_RESTITUTION,
                friction: PLAYER_FRICTION,
                ..Default::default()
            },
        )?;

        if let Some(body) = self.world.body_mut(id) {
            body.max_velocity_x = Some(PLAYER_MAX_VELOCITY_X);
        }
        self.world.add_to_group(self.categories.players, id)?;

        info!("Added player {} at ({}, {})", id, x, y);
        Ok(id)
    }

    pub fn remove_player(&mut self, id: BodyId) -> bool {
        self.world.remove_body(id)
    }

    /// Runs every step that is due, applying `inputs` once beforehand.
    pub fn advance(&mut self, elapsed: f64, inputs: Vec<(BodyId, InputState)>) -> TickOutcome {
        let mut hooks = TickHooks::new(inputs, self.categories);
        let poll = self.stepper.poll(&mut self.world, elapsed, &mut hooks);

        TickOutcome {
            poll,
            snapshot: hooks.snapshot,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        snapshot_of(&self.world, self.categories)
    }

    pub fn tick(&self) -> u64 {
        self.world.tick()
    }
}

/// Result of [`GameState::advance`]. `snapshot` is only set when the world moved.
#[derive(Debug)]
pub struct TickOutcome {
    pub poll: PollOutcome,
    pub snapshot: Option<Snapshot>,
}

/// Applies buffered input before the steps and captures a snapshot after them.
pub struct TickHooks {
    inputs: Vec<(BodyId, InputState)>,
    categories: Categories,
    pub snapshot: Option<Snapshot>,
}

impl TickHooks {
    pub fn new(inputs: Vec<(BodyId, InputState)>, categories: Categories) -> Self {
        Self {
            inputs,
            categories,
            snapshot: None,
        }
    }
}

impl StepHooks for TickHooks {
    fn pre_step(&mut self, world: &mut World) {
        for (id, input) in &self.inputs {
            if let Some(body) = world.body_mut(*id) {
                apply_input(body, input);
            }
        }
    }

    fn post_step(&mut self, world: &World, events: &[ContactEvent]) {
        for event in events {
            debug!(
                "Contact {} <-> {} (collider {})",
                event.a, event.b, event.collider.0
            );
        }
        self.snapshot = Some(snapshot_of(world, self.categories));
    }
}

/// Translates held keys into the player's acceleration and velocity.
///
/// Jumping needs ground contact from the previous tick; fast fall works any time.
pub fn apply_input(body: &mut Body, input: &InputState) {
    let run = match (input.left, input.right) {
        (true, _) => -RUN_ACCELERATION,
        (false, true) => RUN_ACCELERATION,
        (false, false) => 0.0,
    };
    body.acceleration = body.acceleration.with_x(run);

    if input.up && body.contacts.bottom {
        body.velocity = body.velocity.with_y(JUMP_VELOCITY);
    } else if input.down {
        body.velocity = body.velocity.with_y(FAST_FALL_VELOCITY);
    }
}

pub fn snapshot_of(world: &World, categories: Categories) -> Snapshot {
    let collect = |group: GroupId| -> BTreeMap<BodyId, BodyState> {
        world
            .group(group)
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| world.body(*id))
            .map(|body| (body.id(), BodyState::from(body)))
            .collect()
    };

    Snapshot {
        players: collect(categories.players),
        obstacles: collect(categories.obstacles),
        discs: collect(categories.discs),
    }
}
