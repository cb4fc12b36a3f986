//! Sequential animator: runs its children one after another
//!
//! Each child starts once the previous child's sequence has drained, after
//! an optional gap. The sequential animator holds its own sequence for the
//! whole run; gaps are control steps on it and it is released after the last
//! child drains. Launch decisions (interceptors, vetoes, gaps) are taken when
//! the run begins.

use super::{plan_children, validate_children, ChildInterceptors, ChildLaunch, PathAnimator};
use crate::error::{AnimationError, Result};
use crate::scheduler::{AnimatorId, Scheduler};
use crate::step::ScheduledStep;
use crate::worker::run_guarded;
use apel_core::{AnimationContext, Renderer};
use std::sync::Arc;

/// Runs its children in order, each after the previous one drained
pub struct SequentialAnimator {
    id: AnimatorId,
    children: Vec<Arc<dyn PathAnimator>>,
    gaps: Vec<u32>,
    on_child: ChildInterceptors,
}

impl SequentialAnimator {
    /// Wait `gap` ticks before each child
    pub fn new(gap: u32, children: Vec<Arc<dyn PathAnimator>>) -> Result<Self> {
        let gaps = vec![gap; children.len()];
        Self::with_gaps(gaps, children)
    }

    /// Wait `gaps[i]` ticks before child `i`
    pub fn with_gaps(gaps: Vec<u32>, children: Vec<Arc<dyn PathAnimator>>) -> Result<Self> {
        validate_children(&children, &gaps)?;
        Ok(Self {
            id: AnimatorId::next(),
            children,
            gaps,
            on_child: ChildInterceptors::new(),
        })
    }

    pub fn children(&self) -> &[Arc<dyn PathAnimator>] {
        &self.children
    }

    pub fn gaps(&self) -> &[u32] {
        &self.gaps
    }

    /// Register an interceptor that runs for each child when the run begins
    pub fn on_child_launch<F>(&mut self, handler: F) -> i32
    where
        F: Fn(&mut AnimationContext, &mut ChildLaunch) + Send + Sync + 'static,
    {
        self.on_child.add_interceptor(handler)
    }

    pub fn child_interceptors_mut(&mut self) -> &mut ChildInterceptors {
        &mut self.on_child
    }
}

impl PathAnimator for SequentialAnimator {
    fn id(&self) -> AnimatorId {
        self.id
    }

    fn convert_interval_to_steps(&self) -> u32 {
        self.children.len() as u32
    }

    fn rendering_steps(&self) -> u32 {
        self.convert_interval_to_steps()
    }

    fn duration_ticks(&self) -> u64 {
        self.children
            .iter()
            .zip(&self.gaps)
            .map(|(child, gap)| u64::from(*gap) + child.duration_ticks())
            .sum()
    }

    fn begin_animation_from(
        &self,
        scheduler: &mut Scheduler,
        renderer: &Arc<dyn Renderer>,
        start_step: u32,
    ) -> Result<()> {
        let links = plan_children(
            &self.children,
            &self.gaps,
            &self.on_child,
            renderer,
            start_step,
        );
        scheduler.allocate_held_sequence(self.id, 0)?;
        tracing::debug!(animator = %self.id, children = links.len(), "starting sequence chain");

        let chain = Arc::new(Chain {
            id: self.id,
            links,
            renderer: Arc::clone(renderer),
        });
        schedule_link(chain, 0, scheduler)
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Snapshot of one sequential run
struct Chain {
    id: AnimatorId,
    links: Vec<(Arc<dyn PathAnimator>, u32)>,
    renderer: Arc<dyn Renderer>,
}

impl Chain {
    /// Release the held sequence and pass `err` on
    fn abort(&self, scheduler: &mut Scheduler, err: AnimationError) -> Result<()> {
        tracing::warn!(animator = %self.id, error = %err, "sequence chain aborted");
        scheduler.release_sequence(self.id)?;
        Err(err)
    }
}

/// Start link `index` now or after its gap
fn schedule_link(chain: Arc<Chain>, index: usize, scheduler: &mut Scheduler) -> Result<()> {
    let Some((child, gap)) = chain.links.get(index).cloned() else {
        tracing::debug!(animator = %chain.id, "sequence chain finished");
        return scheduler.release_sequence(chain.id);
    };

    if gap == 0 {
        return start_link(chain, index, child, scheduler);
    }

    let next = Arc::clone(&chain);
    let result = ScheduledStep::control(gap, move |scheduler| {
        start_link(next, index, child, scheduler)
    })
    .and_then(|step| scheduler.allocate_new_step(chain.id, step));
    match result {
        Ok(()) => Ok(()),
        Err(err) => chain.abort(scheduler, err),
    }
}

/// Begin `child` and queue the next link behind its drain
fn start_link(
    chain: Arc<Chain>,
    index: usize,
    child: Arc<dyn PathAnimator>,
    scheduler: &mut Scheduler,
) -> Result<()> {
    if let Err(err) = run_guarded(|| child.begin_animation(scheduler, &chain.renderer)) {
        return chain.abort(scheduler, err);
    }
    let next = Arc::clone(&chain);
    scheduler.after_drained(child.id(), move |scheduler| {
        schedule_link(next, index + 1, scheduler)
    })
}
