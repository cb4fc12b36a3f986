//! Scheduled steps
//!
//! A [`ScheduledStep`] is a countdown plus the actions to run once it reaches
//! zero. Draw actions are handed to the draw executor; control actions run
//! on the tick thread with access to the scheduler, which is how composite
//! animators start their children.

use crate::error::{AnimationError, Result};
use crate::scheduler::Scheduler;
use smallvec::SmallVec;
use std::fmt;

/// Work that draws particles; runs on the draw executor
pub type DrawJob = Box<dyn FnOnce() + Send + 'static>;

/// Work that drives the scheduler; runs on the tick thread after the pass
pub type ControlJob = Box<dyn FnOnce(&mut Scheduler) -> Result<()> + Send + 'static>;

/// A single action carried by a step
pub enum StepAction {
    Draw(DrawJob),
    Control(ControlJob),
}

impl StepAction {
    pub fn draw<F>(job: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        StepAction::Draw(Box::new(job))
    }

    pub fn control<F>(job: F) -> Self
    where
        F: FnOnce(&mut Scheduler) -> Result<()> + Send + 'static,
    {
        StepAction::Control(Box::new(job))
    }
}

impl fmt::Debug for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Draw(_) => f.write_str("Draw"),
            StepAction::Control(_) => f.write_str("Control"),
        }
    }
}

/// Actions fired together by one step
pub type StepActions = SmallVec<[StepAction; 1]>;

/// Countdown of ticks followed by one or more actions
#[derive(Debug)]
pub struct ScheduledStep {
    delay: u32,
    actions: StepActions,
}

impl ScheduledStep {
    /// Create a step firing after `delay` ticks
    ///
    /// The delay must be at least one tick and there must be at least one
    /// action; zero-delay work is run directly instead of being scheduled.
    pub fn new(delay: u32, actions: impl IntoIterator<Item = StepAction>) -> Result<Self> {
        if delay == 0 {
            return Err(AnimationError::validation(
                "scheduled step delay must be at least 1 tick",
            ));
        }
        let actions: StepActions = actions.into_iter().collect();
        if actions.is_empty() {
            return Err(AnimationError::validation(
                "scheduled step needs at least one action",
            ));
        }
        Ok(Self { delay, actions })
    }

    /// Step with a single draw action
    pub fn draw<F>(delay: u32, job: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(delay, [StepAction::draw(job)])
    }

    /// Step with a single control action
    pub fn control<F>(delay: u32, job: F) -> Result<Self>
    where
        F: FnOnce(&mut Scheduler) -> Result<()> + Send + 'static,
    {
        Self::new(delay, [StepAction::control(job)])
    }

    /// Ticks left before the step fires
    pub fn remaining(&self) -> u32 {
        self.delay
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Advance one tick; returns `true` once the countdown reaches zero
    pub fn tick(&mut self) -> bool {
        self.delay = self.delay.saturating_sub(1);
        self.delay == 0
    }

    pub fn into_actions(self) -> StepActions {
        self.actions
    }
}
