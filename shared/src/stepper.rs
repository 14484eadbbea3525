//! Fixed-timestep driver.
//!
//! The host loop (a timer, a game loop, a test) calls [`Stepper::poll`] with the
//! real time that passed since the last call. Elapsed time accumulates and is
//! consumed in whole timesteps, at most [`MAX_SUBSTEPS`] per poll. If that is not
//! enough to catch up, the rest is simulated in one final jump so the backlog
//! never grows.

use crate::world::{ContactEvent, World};
use crate::{DEFAULT_TIMESTEP, MAX_SUBSTEPS};
use log::{trace, warn};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperState {
    Stopped,
    Running,
    Paused,
}

/// Callbacks run around the stepping loop of a poll that advances the world.
pub trait StepHooks {
    /// Runs once before the first step. Drain buffered input here.
    fn pre_step(&mut self, _world: &mut World) {}

    /// Runs once after the last step with every new contact of the poll.
    fn post_step(&mut self, _world: &World, _events: &[ContactEvent]) {}
}

/// Hooks that do nothing.
impl StepHooks for () {}

/// What one call to [`Stepper::poll`] did.
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub steps: u32,
    /// The substep cap was hit and the remainder was simulated in one step.
    pub forced_catch_up: bool,
    pub events: Vec<ContactEvent>,
}

#[derive(Debug)]
pub struct Stepper {
    timestep: f64,
    accumulated: f64,
    state: StepperState,
}

impl Default for Stepper {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTEP)
    }
}

impl Stepper {
    /// Creates a stopped stepper. A non-positive `timestep` falls back to the default.
    pub fn new(timestep: f64) -> Self {
        let timestep = if timestep > 0.0 && timestep.is_finite() {
            timestep
        } else {
            DEFAULT_TIMESTEP
        };

        Self {
            timestep,
            accumulated: 0.0,
            state: StepperState::Stopped,
        }
    }

    /// Timestep for a target rate in ticks per second.
    pub fn with_rate(ticks_per_second: u32) -> Self {
        Self::new(1.0 / f64::from(ticks_per_second.max(1)))
    }

    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    pub fn state(&self) -> StepperState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == StepperState::Running
    }

    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    pub fn start(&mut self) {
        self.state = StepperState::Running;
    }

    /// Freezes the accumulator. Polls do nothing until resumed.
    pub fn pause(&mut self) {
        if self.state == StepperState::Running {
            self.state = StepperState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == StepperState::Paused {
            self.state = StepperState::Running;
        }
    }

    pub fn stop(&mut self) {
        self.state = StepperState::Stopped;
        self.accumulated = 0.0;
    }

    /// How long the host can sleep before the next poll has a full step to run.
    pub fn time_until_next_step(&self) -> Duration {
        let remaining = (self.timestep - self.accumulated).max(0.0);
        Duration::from_secs_f64(remaining)
    }

    /// Adds `elapsed` seconds and runs every timestep that became due.
    ///
    /// Hooks only run when at least one step is taken.
    pub fn poll<H: StepHooks + ?Sized>(
        &mut self,
        world: &mut World,
        elapsed: f64,
        hooks: &mut H,
    ) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        if self.state != StepperState::Running {
            return outcome;
        }

        if elapsed > 0.0 && elapsed.is_finite() {
            self.accumulated += elapsed;
        }
        if self.accumulated < self.timestep {
            return outcome;
        }

        hooks.pre_step(world);

        while self.accumulated >= self.timestep && outcome.steps < MAX_SUBSTEPS {
            outcome.events.extend(world.step(self.timestep));
            self.accumulated -= self.timestep;
            outcome.steps += 1;
        }

        if outcome.steps == MAX_SUBSTEPS && self.accumulated > 0.0 {
            warn!(
                "Stepper fell behind by {:.3}s after {} steps, catching up in one step",
                self.accumulated, outcome.steps
            );
            outcome.events.extend(world.step(self.accumulated));
            self.accumulated = 0.0;
            outcome.steps += 1;
            outcome.forced_catch_up = true;
        }

        trace!("Poll ran {} steps, tick {}", outcome.steps, world.tick());
        hooks.post_step(world, &outcome.events);
        outcome
    }
}
