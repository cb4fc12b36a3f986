//! Per-animator FIFO of scheduled steps

use crate::step::{ScheduledStep, StepActions};
use std::collections::VecDeque;

/// Ordered steps belonging to one animator
///
/// Only the head step is ticked. A sequence counts as finished once it has
/// received at least one step and every step has fired; a sequence that never
/// received a step is not finished. A held sequence is never finished until
/// it is released.
#[derive(Debug, Default)]
pub struct ScheduledSequence {
    steps: VecDeque<ScheduledStep>,
    has_allocated: bool,
    held: bool,
}

impl ScheduledSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: VecDeque::with_capacity(capacity),
            has_allocated: false,
            held: false,
        }
    }

    /// A sequence that stays registered while empty until released
    pub fn held(capacity: usize) -> Self {
        Self {
            held: true,
            ..Self::with_capacity(capacity)
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn release(&mut self) {
        self.held = false;
    }

    pub fn allocate_step(&mut self, step: ScheduledStep) {
        self.steps.push_back(step);
        self.has_allocated = true;
    }

    /// Tick the head step, returning its actions if it fired
    pub fn tick(&mut self) -> Option<StepActions> {
        let head = self.steps.front_mut()?;
        if !head.tick() {
            return None;
        }
        self.steps.pop_front().map(ScheduledStep::into_actions)
    }

    pub fn is_finished(&self) -> bool {
        self.steps.is_empty() && self.has_allocated && !self.held
    }

    pub fn has_allocated(&self) -> bool {
        self.has_allocated
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(delay: u32) -> ScheduledStep {
        ScheduledStep::draw(delay, || {}).unwrap()
    }

    #[test]
    fn test_empty_sequence_is_not_finished() {
        let mut sequence = ScheduledSequence::new();
        assert!(!sequence.is_finished());
        assert!(sequence.tick().is_none());
        assert!(!sequence.is_finished());
    }

    #[test]
    fn test_fifo_firing_ticks() {
        let mut sequence = ScheduledSequence::new();
        for delay in [2, 1, 3] {
            sequence.allocate_step(step(delay));
        }

        let fired: Vec<u32> = (1..=6)
            .filter(|_| sequence.tick().is_some())
            .collect();
        assert_eq!(fired, vec![2, 3, 6]);
        assert!(sequence.is_finished());
    }

    #[test]
    fn test_only_head_is_ticked() {
        let mut sequence = ScheduledSequence::with_capacity(2);
        sequence.allocate_step(step(2));
        sequence.allocate_step(step(1));

        assert!(sequence.tick().is_none());
        assert_eq!(sequence.len(), 2);
        assert!(sequence.tick().is_some());
        // Second step still has its full delay
        assert!(sequence.tick().is_some());
        assert!(sequence.is_empty());
    }

    #[test]
    fn test_held_sequence_waits_for_release() {
        let mut sequence = ScheduledSequence::held(1);
        sequence.allocate_step(step(1));
        assert!(sequence.tick().is_some());
        assert!(!sequence.is_finished());

        sequence.release();
        assert!(sequence.is_finished());
    }
}
