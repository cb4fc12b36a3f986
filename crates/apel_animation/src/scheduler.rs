//! Tick scheduler
//!
//! Maps every active animator to exactly one [`ScheduledSequence`] and
//! advances all of them once per external tick. Fired draw actions are
//! handed to the [`DrawExecutor`]; fired control actions run on the tick
//! thread once every sequence has been advanced, so they may freely allocate
//! or release sequences. Sequences that drain during a tick are removed in
//! the same pass.
//!
//! The scheduler is an explicit value owned by the host. It is not
//! thread-safe on its own: one driver calls [`Scheduler::run_tick`]
//! sequentially, and animations are started from that same thread.

use crate::error::{AnimationError, Result};
use crate::sequence::ScheduledSequence;
use crate::step::{ControlJob, ScheduledStep, StepAction};
use crate::worker::{run_guarded, DrawExecutor, InlineExecutor};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// Animator identity
// ============================================================================

/// Identity of an animator in the scheduler registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimatorId(u64);

impl AnimatorId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        AnimatorId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Convert to raw u64
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from raw u64
    pub fn from_raw(raw: u64) -> Self {
        AnimatorId(raw)
    }
}

impl fmt::Display for AnimatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "animator#{}", self.0)
    }
}

// ============================================================================
// Tick report
// ============================================================================

/// Outcome of a single [`Scheduler::run_tick`]
#[derive(Debug, Default)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Steps whose countdown reached zero
    pub fired: usize,
    /// Sequences that drained and were removed
    pub drained: SmallVec<[AnimatorId; 4]>,
    /// Failures of control actions and drain watchers
    pub faults: Vec<AnimationError>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Registry of scheduled sequences, advanced once per tick
pub struct Scheduler {
    sequences: IndexMap<AnimatorId, ScheduledSequence>,
    drain_watchers: FxHashMap<AnimatorId, Vec<ControlJob>>,
    executor: Arc<dyn DrawExecutor>,
    tick_count: u64,
}

impl Scheduler {
    /// Create a scheduler dispatching draw actions to `executor`
    pub fn new(executor: Arc<dyn DrawExecutor>) -> Self {
        Self {
            sequences: IndexMap::new(),
            drain_watchers: FxHashMap::default(),
            executor,
            tick_count: 0,
        }
    }

    /// Create a scheduler that runs draw actions on the ticking thread
    pub fn inline() -> Self {
        Self::new(Arc::new(InlineExecutor))
    }

    pub fn with_capacity(executor: Arc<dyn DrawExecutor>, capacity: usize) -> Self {
        Self {
            sequences: IndexMap::with_capacity(capacity),
            ..Self::new(executor)
        }
    }

    pub fn executor(&self) -> &Arc<dyn DrawExecutor> {
        &self.executor
    }

    /// Register an empty sequence for `id`
    pub fn allocate_new_sequence(&mut self, id: AnimatorId) -> Result<()> {
        self.allocate_new_sequence_with_capacity(id, 0)
    }

    /// Register an empty sequence for `id`, reserving room for `capacity` steps
    pub fn allocate_new_sequence_with_capacity(
        &mut self,
        id: AnimatorId,
        capacity: usize,
    ) -> Result<()> {
        if self.sequences.contains_key(&id) {
            return Err(AnimationError::DuplicateAllocation(id));
        }
        self.sequences
            .insert(id, ScheduledSequence::with_capacity(capacity));
        tracing::debug!(animator = %id, capacity, "allocated sequence");
        Ok(())
    }

    /// Register a held sequence for `id`
    ///
    /// A held sequence survives running out of steps; it drains only once
    /// [`Scheduler::release_sequence`] is called for it. Composite animators
    /// hold their sequence for the whole run so that drain watchers on their
    /// id fire when every child is done.
    pub fn allocate_held_sequence(&mut self, id: AnimatorId, capacity: usize) -> Result<()> {
        if self.sequences.contains_key(&id) {
            return Err(AnimationError::DuplicateAllocation(id));
        }
        self.sequences.insert(id, ScheduledSequence::held(capacity));
        tracing::debug!(animator = %id, capacity, "allocated held sequence");
        Ok(())
    }

    /// Release a held sequence
    ///
    /// An empty sequence is removed at once and its drain watchers run;
    /// otherwise it drains normally once its remaining steps fire.
    pub fn release_sequence(&mut self, id: AnimatorId) -> Result<()> {
        let sequence = self
            .sequences
            .get_mut(&id)
            .ok_or(AnimationError::MissingAllocation(id))?;
        sequence.release();
        if sequence.is_empty() {
            self.deallocate_sequence(id)?;
        }
        Ok(())
    }

    /// Append a step to the sequence owned by `id`
    pub fn allocate_new_step(&mut self, id: AnimatorId, step: ScheduledStep) -> Result<()> {
        let sequence = self
            .sequences
            .get_mut(&id)
            .ok_or(AnimationError::MissingAllocation(id))?;
        sequence.allocate_step(step);
        Ok(())
    }

    pub fn has_allocated(&self, id: AnimatorId) -> bool {
        self.sequences.contains_key(&id)
    }

    /// Check if any sequence is still registered
    pub fn is_processing(&self) -> bool {
        !self.sequences.is_empty()
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Steps still queued for `id`
    pub fn pending_steps(&self, id: AnimatorId) -> Option<usize> {
        self.sequences.get(&id).map(ScheduledSequence::len)
    }

    /// Number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Run `action` once the sequence owned by `id` drains
    ///
    /// When `id` has no sequence the action runs immediately and its result
    /// is returned.
    pub fn after_drained<F>(&mut self, id: AnimatorId, action: F) -> Result<()>
    where
        F: FnOnce(&mut Scheduler) -> Result<()> + Send + 'static,
    {
        if !self.sequences.contains_key(&id) {
            return action(self);
        }
        self.drain_watchers
            .entry(id)
            .or_default()
            .push(Box::new(action));
        Ok(())
    }

    /// Remove the sequence owned by `id` and run its drain watchers
    pub(crate) fn deallocate_sequence(&mut self, id: AnimatorId) -> Result<()> {
        if self.sequences.shift_remove(&id).is_none() {
            return Err(AnimationError::MissingAllocation(id));
        }
        tracing::debug!(animator = %id, "deallocated sequence");

        let mut first_error = None;
        for watcher in self.drain_watchers.remove(&id).unwrap_or_default() {
            if let Err(err) = run_guarded(|| watcher(self)) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Advance every active sequence by one tick
    ///
    /// Draw actions of fired steps go to the executor in registry order.
    /// Control actions and drain watchers run afterwards on this thread; a
    /// failing or panicking one is logged and recorded in the report without
    /// affecting the others.
    pub fn run_tick(&mut self) -> TickReport {
        self.tick_count += 1;
        let mut report = TickReport {
            tick: self.tick_count,
            ..TickReport::default()
        };

        let mut controls: Vec<(AnimatorId, ControlJob)> = Vec::new();
        let executor = &self.executor;
        self.sequences.retain(|id, sequence| {
            if let Some(actions) = sequence.tick() {
                report.fired += 1;
                tracing::trace!(animator = %id, actions = actions.len(), "step fired");
                for action in actions {
                    match action {
                        StepAction::Draw(job) => executor.execute(job),
                        StepAction::Control(job) => controls.push((*id, job)),
                    }
                }
            }
            if sequence.is_finished() {
                report.drained.push(*id);
                return false;
            }
            true
        });

        for (id, job) in controls {
            if let Err(err) = run_guarded(|| job(self)) {
                tracing::warn!(animator = %id, error = %err, "control action failed");
                report.faults.push(err);
            }
        }

        for id in report.drained.clone() {
            tracing::debug!(animator = %id, "sequence drained");
            for watcher in self.drain_watchers.remove(&id).unwrap_or_default() {
                if let Err(err) = run_guarded(|| watcher(self)) {
                    tracing::warn!(animator = %id, error = %err, "drain watcher failed");
                    report.faults.push(err);
                }
            }
        }

        report
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::inline()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("sequences", &self.sequences.len())
            .field("drain_watchers", &self.drain_watchers.len())
            .field("tick_count", &self.tick_count)
            .finish()
    }
}
