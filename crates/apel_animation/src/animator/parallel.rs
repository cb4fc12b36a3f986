//! Parallel animator: starts several animators side by side
//!
//! Children with a zero start offset begin as soon as the parallel animator
//! begins. Children with a positive offset are started by control steps on
//! the parallel animator's own sequence; children sharing an offset are
//! started by the same step. The own sequence is held until every child has
//! drained, so watchers on the parallel animator see the whole run.

use super::{plan_children, validate_children, ChildInterceptors, ChildLaunch, PathAnimator};
use crate::error::Result;
use crate::scheduler::{AnimatorId, Scheduler};
use crate::step::{ScheduledStep, StepAction};
use crate::worker::run_guarded;
use apel_core::{AnimationContext, Renderer};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Runs its children concurrently, each after its own start offset
pub struct ParallelAnimator {
    id: AnimatorId,
    children: Vec<Arc<dyn PathAnimator>>,
    offsets: Vec<u32>,
    on_child: ChildInterceptors,
}

impl ParallelAnimator {
    /// Start every child after the same `delay`
    pub fn new(delay: u32, children: Vec<Arc<dyn PathAnimator>>) -> Result<Self> {
        let offsets = vec![delay; children.len()];
        Self::with_offsets(offsets, children)
    }

    /// Start each child after its own offset
    pub fn with_offsets(offsets: Vec<u32>, children: Vec<Arc<dyn PathAnimator>>) -> Result<Self> {
        validate_children(&children, &offsets)?;
        Ok(Self {
            id: AnimatorId::next(),
            children,
            offsets,
            on_child: ChildInterceptors::new(),
        })
    }

    /// Start child `i` after `i * stagger` ticks
    pub fn staggered(stagger: u32, children: Vec<Arc<dyn PathAnimator>>) -> Result<Self> {
        let offsets = (0..children.len() as u32)
            .map(|index| index.saturating_mul(stagger))
            .collect();
        Self::with_offsets(offsets, children)
    }

    pub fn children(&self) -> &[Arc<dyn PathAnimator>] {
        &self.children
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Register an interceptor that runs before each child is launched
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

impl PathAnimator for ParallelAnimator {
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
            .zip(&self.offsets)
            .map(|(child, offset)| u64::from(*offset) + child.duration_ticks())
            .max()
            .unwrap_or(0)
    }

    fn begin_animation_from(
        &self,
        scheduler: &mut Scheduler,
        renderer: &Arc<dyn Renderer>,
        start_step: u32,
    ) -> Result<()> {
        let mut launches = plan_children(
            &self.children,
            &self.offsets,
            &self.on_child,
            renderer,
            start_step,
        );
        if launches.is_empty() {
            return Ok(());
        }
        launches.sort_by_key(|(_, offset)| *offset);

        let split = launches.partition_point(|(_, offset)| *offset == 0);
        let (immediate, delayed) = launches.split_at(split);
        let mut groups: SmallVec<[u32; 4]> = delayed.iter().map(|(_, offset)| *offset).collect();
        groups.dedup();

        scheduler.allocate_held_sequence(self.id, groups.len())?;
        let pending = Arc::new(PendingChildren {
            id: self.id,
            remaining: AtomicUsize::new(launches.len()),
        });

        tracing::debug!(
            animator = %self.id,
            immediate = immediate.len(),
            delayed = delayed.len(),
            "starting parallel children"
        );

        let mut previous = 0;
        for offset in groups {
            let actions: SmallVec<[StepAction; 1]> = delayed
                .iter()
                .filter(|(_, child_offset)| *child_offset == offset)
                .map(|(child, _)| {
                    let child = Arc::clone(child);
                    let renderer = Arc::clone(renderer);
                    let pending = Arc::clone(&pending);
                    StepAction::control(move |scheduler| {
                        launch_child(&pending, &child, scheduler, &renderer)
                    })
                })
                .collect();
            scheduler.allocate_new_step(self.id, ScheduledStep::new(offset - previous, actions)?)?;
            previous = offset;
        }

        // Every child is launched so the countdown stays consistent
        let mut first_error = None;
        for (child, _) in immediate {
            if let Err(err) = launch_child(&pending, child, scheduler, renderer) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Children of one parallel run that have not drained yet
struct PendingChildren {
    id: AnimatorId,
    remaining: AtomicUsize,
}

impl PendingChildren {
    fn child_done(&self, scheduler: &mut Scheduler) -> Result<()> {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            tracing::debug!(animator = %self.id, "parallel children finished");
            return scheduler.release_sequence(self.id);
        }
        Ok(())
    }
}

/// Begin `child` and count it down once it drains
fn launch_child(
    pending: &Arc<PendingChildren>,
    child: &Arc<dyn PathAnimator>,
    scheduler: &mut Scheduler,
    renderer: &Arc<dyn Renderer>,
) -> Result<()> {
    if let Err(err) = run_guarded(|| child.begin_animation(scheduler, renderer)) {
        pending.child_done(scheduler)?;
        return Err(err);
    }
    let pending = Arc::clone(pending);
    scheduler.after_drained(child.id(), move |scheduler| pending.child_done(scheduler))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{AnimatorConfig, ObjectAnimator, PointAnimator, SequentialAnimator};
    use super::*;
    use crate::error::AnimationError;
    use apel_core::Vec3;

    fn point(delay: u32, steps: u32, x: f32) -> Arc<dyn PathAnimator> {
        Arc::new(
            PointAnimator::new(
                AnimatorConfig::with_steps(delay, steps).unwrap(),
                Vec3::new(x, 0.0, 0.0),
                point_object(),
            )
            .unwrap(),
        )
    }

    fn xs(recorder: &apel_core::RecordingRenderer) -> Vec<f32> {
        recorder.particles().iter().map(|(_, p)| p.x).collect()
    }

    #[test]
    fn test_empty_children_rejected() {
        assert!(ParallelAnimator::new(0, Vec::new()).is_err());
        assert!(ParallelAnimator::with_offsets(vec![0, 1], vec![point(0, 1, 0.0)]).is_err());
    }

    #[test]
    fn test_zero_offset_children_start_immediately() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let parallel =
            ParallelAnimator::new(0, vec![point(0, 2, 1.0), point(0, 3, 2.0)]).unwrap();

        parallel.begin_animation(&mut scheduler, &renderer).unwrap();

        assert_eq!(xs(&recorder), vec![1.0, 1.0, 2.0, 2.0, 2.0]);
        assert!(!scheduler.has_allocated(parallel.id()));
    }

    #[test]
    fn test_staggered_children_share_steps_by_offset() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let parallel = ParallelAnimator::with_offsets(
            vec![2, 0, 2, 3],
            vec![point(0, 1, 1.0), point(0, 1, 2.0), point(0, 1, 3.0), point(0, 1, 4.0)],
        )
        .unwrap();

        parallel.begin_animation(&mut scheduler, &renderer).unwrap();
        assert_eq!(xs(&recorder), vec![2.0]);
        assert_eq!(scheduler.pending_steps(parallel.id()), Some(2));

        scheduler.run_tick();
        assert_eq!(xs(&recorder), vec![2.0]);
        scheduler.run_tick();
        assert_eq!(xs(&recorder), vec![2.0, 1.0, 3.0]);
        let report = scheduler.run_tick();
        assert!(report.is_clean());
        assert_eq!(xs(&recorder), vec![2.0, 1.0, 3.0, 4.0]);
        assert!(!scheduler.is_processing());
    }

    #[test]
    fn test_held_until_last_child_drains() {
        let (_, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let parallel =
            ParallelAnimator::new(0, vec![point(1, 1, 1.0), point(1, 3, 2.0)]).unwrap();

        parallel.begin_animation(&mut scheduler, &renderer).unwrap();
        assert!(scheduler.has_allocated(parallel.id()));
        assert_eq!(
            parallel.begin_animation(&mut scheduler, &renderer),
            Err(crate::error::AnimationError::DuplicateAllocation(parallel.id()))
        );

        scheduler.run_tick();
        scheduler.run_tick();
        assert!(scheduler.has_allocated(parallel.id()));
        let report = scheduler.run_tick();
        assert!(report.is_clean());
        assert!(!scheduler.has_allocated(parallel.id()));
        assert!(!scheduler.is_processing());
    }

    #[test]
    fn test_child_launch_interceptor_can_veto_and_delay() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let mut parallel = ParallelAnimator::new(
            0,
            vec![point(0, 1, 1.0), point(0, 1, 2.0), point(0, 1, 3.0)],
        )
        .unwrap();
        parallel.on_child_launch(|ctx, launch| match ctx.current_step() {
            0 => ctx.set_should_render(false),
            2 => launch.delay = 1,
            _ => {}
        });

        parallel.begin_animation(&mut scheduler, &renderer).unwrap();
        assert_eq!(xs(&recorder), vec![2.0]);

        run_to_idle(&mut scheduler, 5);
        assert_eq!(xs(&recorder), vec![2.0, 3.0]);
    }

    #[test]
    fn test_duration_is_longest_child_plus_offset() {
        let parallel = ParallelAnimator::staggered(
            4,
            vec![point(2, 3, 0.0), point(1, 1, 0.0)],
        )
        .unwrap();
        assert_eq!(parallel.offsets(), &[0, 4]);
        assert_eq!(parallel.duration_ticks(), 6);
        assert_eq!(parallel.rendering_steps(), 2);
    }

    #[test]
    fn test_begin_from_skips_earlier_children() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let parallel =
            ParallelAnimator::new(0, vec![point(0, 1, 1.0), point(0, 1, 2.0)]).unwrap();

        parallel
            .begin_animation_from(&mut scheduler, &renderer, 1)
            .unwrap();
        assert_eq!(xs(&recorder), vec![2.0]);
    }

    #[test]
    fn test_panicking_child_does_not_strand_other_chains() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();

        let mut exploding = PointAnimator::new(
            AnimatorConfig::with_steps(1, 1).unwrap(),
            Vec3::new(7.0, 0.0, 0.0),
            point_object(),
        )
        .unwrap();
        exploding.on_rendering_step(|_, _| panic!("child exploded"));
        let exploding: Arc<dyn PathAnimator> = Arc::new(exploding);
        let parallel = ParallelAnimator::with_offsets(vec![1], vec![exploding]).unwrap();
        let sequential =
            SequentialAnimator::new(0, vec![point(1, 1, 1.0), point(0, 1, 2.0)]).unwrap();

        parallel.begin_animation(&mut scheduler, &renderer).unwrap();
        sequential.begin_animation(&mut scheduler, &renderer).unwrap();

        let report = scheduler.run_tick();
        assert_eq!(
            report.faults,
            vec![AnimationError::Panicked("child exploded".to_string())]
        );
        assert_eq!(xs(&recorder), vec![1.0, 2.0]);
        assert!(!scheduler.has_allocated(parallel.id()));
        assert!(!scheduler.has_allocated(sequential.id()));
        assert!(!scheduler.is_processing());
    }
}
