//! Path animators
//!
//! A path animator computes where and when a particle object is drawn and
//! submits the resulting draw actions to a [`Scheduler`]. Leaf animators
//! (point, linear, circular, ellipse, Bézier) move one object along a path;
//! composite animators (parallel, sequential) start other animators.
//!
//! Every leaf run follows the same pipeline:
//!
//! 1. resolve the step count, either fixed or derived from the interval,
//! 2. allocate the animator's sequence when the delay is non-zero,
//! 3. for each step compute the position and run the rendering-step
//!    interceptors, which may veto the step or move it,
//! 4. draw synchronously (delay 0) or buffer draw actions into scheduled
//!    steps of `process_speed` actions each.
//!
//! Configuration is immutable once an animator is built and each run works
//! on a snapshot of it, so a run in flight is never affected by later
//! changes.

pub mod bezier;
pub mod circular;
pub mod ellipse;
pub mod linear;
pub mod parallel;
pub mod point;
pub mod sequential;

pub use bezier::BezierAnimator;
pub use circular::CircularAnimator;
pub use ellipse::EllipseAnimator;
pub use linear::LinearAnimator;
pub use parallel::ParallelAnimator;
pub use point::PointAnimator;
pub use sequential::SequentialAnimator;

use crate::error::{AnimationError, Result};
use crate::scheduler::{AnimatorId, Scheduler};
use crate::step::{DrawJob, ScheduledStep, StepAction};
use crate::worker::{run_guarded, DrawExecutor, InlineExecutor};
use apel_core::{
    AnimationContext, DrawContext, InterceptorDispatcher, ParticleObject, Renderer, Vec3,
};
use std::sync::Arc;

// ============================================================================
// Configuration
// ============================================================================

/// How many rendering steps a path is split into
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepSpec {
    /// Fixed number of steps
    Steps(u32),
    /// Distance between consecutive steps; the count is derived from the path
    Interval(f32),
}

impl StepSpec {
    pub fn validate(self) -> Result<Self> {
        match self {
            StepSpec::Steps(0) => Err(AnimationError::validation(
                "rendering steps must be above 0",
            )),
            StepSpec::Interval(interval) if !(interval > 0.0) || !interval.is_finite() => Err(
                AnimationError::validation("rendering interval must be positive"),
            ),
            spec => Ok(spec),
        }
    }

    /// Step count for a path of the given length
    pub fn resolve(self, length: f32) -> u32 {
        match self {
            StepSpec::Steps(steps) => steps,
            StepSpec::Interval(interval) => interval_to_steps(length, interval),
        }
    }
}

/// Upper bound on storage reserved up front for a single run
pub(crate) const RESERVE_LIMIT: usize = 1024;

/// Sum per-segment step counts of a path
///
/// Fails when the path has more steps than a step index can address.
pub(crate) fn checked_total_steps(mut counts: impl Iterator<Item = u32>) -> Result<u32> {
    counts.try_fold(0u32, u32::checked_add).ok_or_else(|| {
        AnimationError::validation("path has more rendering steps than fit in u32")
    })
}

/// `length / interval` rounded up, never less than one step
pub fn interval_to_steps(length: f32, interval: f32) -> u32 {
    ((length / interval).ceil() as u32).max(1)
}

/// Validated timing configuration shared by every leaf animator
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatorConfig {
    delay: u32,
    process_speed: u32,
    rendering: StepSpec,
}

impl AnimatorConfig {
    /// Draw a fixed number of steps, `delay` ticks apart
    pub fn with_steps(delay: u32, steps: u32) -> Result<Self> {
        Self::new(delay, StepSpec::Steps(steps))
    }

    /// Draw one step every `interval` units of path length, `delay` ticks apart
    pub fn with_interval(delay: u32, interval: f32) -> Result<Self> {
        Self::new(delay, StepSpec::Interval(interval))
    }

    pub fn new(delay: u32, rendering: StepSpec) -> Result<Self> {
        Ok(Self {
            delay,
            process_speed: 1,
            rendering: rendering.validate()?,
        })
    }

    /// Batch `speed` draw actions into each scheduled step
    pub fn with_process_speed(mut self, speed: u32) -> Result<Self> {
        if speed == 0 {
            return Err(AnimationError::validation("process speed must be at least 1"));
        }
        self.process_speed = speed;
        Ok(self)
    }

    /// Ticks between scheduled steps; 0 draws everything synchronously
    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn process_speed(&self) -> u32 {
        self.process_speed
    }

    pub fn rendering(&self) -> StepSpec {
        self.rendering
    }

    /// Ticks a run of `steps` rendering steps takes to be fully scheduled
    pub fn duration_ticks(&self, steps: u32) -> u64 {
        u64::from(self.delay) * u64::from(steps.div_ceil(self.process_speed))
    }
}

// ============================================================================
// PathAnimator
// ============================================================================

/// A trajectory that can be played on a scheduler
pub trait PathAnimator: Send + Sync {
    /// Identity under which the animator's sequence is registered
    fn id(&self) -> AnimatorId;

    /// Step count derived from the configured interval
    ///
    /// Paths configured with fixed step counts return those counts.
    fn convert_interval_to_steps(&self) -> u32;

    /// Total rendering steps of one run
    fn rendering_steps(&self) -> u32;

    /// Ticks from the start of a run until its last step fires
    fn duration_ticks(&self) -> u64;

    /// Start a run, skipping every step before `start_step`
    fn begin_animation_from(
        &self,
        scheduler: &mut Scheduler,
        renderer: &Arc<dyn Renderer>,
        start_step: u32,
    ) -> Result<()>;

    /// Start a run from the first step
    fn begin_animation(&self, scheduler: &mut Scheduler, renderer: &Arc<dyn Renderer>) -> Result<()> {
        self.begin_animation_from(scheduler, renderer, 0)
    }
}

// ============================================================================
// Leaf animators
// ============================================================================

/// Interceptors run for each rendering step of a leaf animator
///
/// The subject is the object about to be drawn; replacing it swaps the object
/// for that step only.
pub type StepInterceptors = InterceptorDispatcher<Arc<dyn ParticleObject>, AnimationContext>;

/// State shared by every animator that moves a single particle object
pub struct LeafCore {
    id: AnimatorId,
    config: AnimatorConfig,
    object: Arc<dyn ParticleObject>,
    on_step: StepInterceptors,
}

impl LeafCore {
    pub fn new(config: AnimatorConfig, object: Arc<dyn ParticleObject>) -> Self {
        Self {
            id: AnimatorId::next(),
            config,
            object,
            on_step: InterceptorDispatcher::new(),
        }
    }

    pub fn id(&self) -> AnimatorId {
        self.id
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn object(&self) -> &Arc<dyn ParticleObject> {
        &self.object
    }

    pub fn rendering_step_interceptors_mut(&mut self) -> &mut StepInterceptors {
        &mut self.on_step
    }

    /// Submit one draw per `(step, position)` pair
    pub(crate) fn render<I>(
        &self,
        scheduler: &mut Scheduler,
        renderer: &Arc<dyn Renderer>,
        start_step: u32,
        total_steps: u32,
        positions: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (u32, Vec3)>,
    {
        let mut dispatch = StepDispatch::begin(self.id, &self.config, scheduler, total_steps)?;
        let world = renderer.world();

        let submitted = run_guarded(|| {
            for (step, base) in positions {
                if step < start_step {
                    continue;
                }
                let mut ctx = AnimationContext::new(world, Some(base), step, total_steps);
                let mut object = Arc::clone(&self.object);
                self.on_step.compute(&mut object, &mut ctx);
                if !ctx.should_render() {
                    tracing::trace!(animator = %self.id, step, "rendering step vetoed");
                    continue;
                }

                let position = ctx.position().unwrap_or(base);
                let renderer = Arc::clone(renderer);
                dispatch.submit(Box::new(move || {
                    draw_frame(renderer.as_ref(), object.as_ref(), step, total_steps, position)
                }))?;
            }
            Ok(())
        });

        match submitted {
            Ok(()) => dispatch.finish(),
            Err(err) => {
                dispatch.abort();
                Err(err)
            }
        }
    }
}

/// Accessors shared by leaf animators
pub trait ObjectAnimator: PathAnimator {
    fn core(&self) -> &LeafCore;

    fn core_mut(&mut self) -> &mut LeafCore;

    fn config(&self) -> &AnimatorConfig {
        self.core().config()
    }

    fn object(&self) -> &Arc<dyn ParticleObject> {
        self.core().object()
    }

    /// Add a rendering-step interceptor at the next default priority
    fn on_rendering_step<F>(&mut self, handler: F) -> i32
    where
        Self: Sized,
        F: Fn(&mut AnimationContext, &mut Arc<dyn ParticleObject>) + Send + Sync + 'static,
    {
        self.core_mut().on_step.add_interceptor(handler)
    }
}

// ============================================================================
// Composite animators
// ============================================================================

/// A child about to be started by a composite animator
///
/// Child-launch interceptors may swap the animator, change its delay, or
/// veto the launch through the context's should-render flag.
pub struct ChildLaunch {
    pub animator: Arc<dyn PathAnimator>,
    /// Ticks before the child starts
    pub delay: u32,
}

/// Interceptors run once per child when a composite animator begins
pub type ChildInterceptors = InterceptorDispatcher<ChildLaunch, AnimationContext>;

/// Run the child-launch interceptors for every child from `start_step` on
///
/// Returns the surviving `(animator, delay)` pairs in child order.
pub(crate) fn plan_children(
    children: &[Arc<dyn PathAnimator>],
    delays: &[u32],
    interceptors: &ChildInterceptors,
    renderer: &Arc<dyn Renderer>,
    start_step: u32,
) -> Vec<(Arc<dyn PathAnimator>, u32)> {
    let world = renderer.world();
    let total = children.len() as u32;
    children
        .iter()
        .zip(delays)
        .enumerate()
        .skip(start_step as usize)
        .filter_map(|(index, (child, delay))| {
            let mut launch = ChildLaunch {
                animator: Arc::clone(child),
                delay: *delay,
            };
            let mut ctx = AnimationContext::new(world, None, index as u32, total);
            interceptors.compute(&mut launch, &mut ctx);
            ctx.should_render()
                .then_some((launch.animator, launch.delay))
        })
        .collect()
}

pub(crate) fn validate_children(children: &[Arc<dyn PathAnimator>], delays: &[u32]) -> Result<()> {
    if children.is_empty() {
        return Err(AnimationError::validation(
            "a composite animator needs at least one child",
        ));
    }
    if children.len() != delays.len() {
        return Err(AnimationError::validation(format!(
            "expected {} child delays, got {}",
            children.len(),
            delays.len()
        )));
    }
    Ok(())
}

fn draw_frame(
    renderer: &dyn Renderer,
    object: &dyn ParticleObject,
    step: u32,
    total_steps: u32,
    position: Vec3,
) {
    renderer.before_frame(step, position);
    let mut ctx = DrawContext::new(renderer.world(), position, step, total_steps);
    object.draw(renderer, &mut ctx);
    renderer.after_frame(step, position);
}

/// Routes the draw actions of one run to the scheduler
///
/// With a zero delay every draw runs immediately and the scheduler is never
/// touched. Otherwise draws are buffered and flushed as one scheduled step
/// each time the buffer holds `process_speed` actions; the remainder is
/// flushed when the run finishes.
pub(crate) struct StepDispatch<'s> {
    id: AnimatorId,
    delay: u32,
    batch: usize,
    scheduler: &'s mut Scheduler,
    buffer: Vec<StepAction>,
    allocated: usize,
}

impl<'s> StepDispatch<'s> {
    pub(crate) fn begin(
        id: AnimatorId,
        config: &AnimatorConfig,
        scheduler: &'s mut Scheduler,
        total_steps: u32,
    ) -> Result<Self> {
        let batch = config.process_speed() as usize;
        if config.delay() > 0 {
            let capacity = (total_steps.div_ceil(config.process_speed()) as usize).min(RESERVE_LIMIT);
            scheduler.allocate_new_sequence_with_capacity(id, capacity)?;
        }
        Ok(Self {
            id,
            delay: config.delay(),
            batch,
            scheduler,
            buffer: Vec::with_capacity(batch),
            allocated: 0,
        })
    }

    pub(crate) fn submit(&mut self, job: DrawJob) -> Result<()> {
        if self.delay == 0 {
            InlineExecutor.execute(job);
            return Ok(());
        }
        self.buffer.push(StepAction::Draw(job));
        if self.buffer.len() >= self.batch {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let step = ScheduledStep::new(self.delay, self.buffer.drain(..))?;
        self.scheduler.allocate_new_step(self.id, step)?;
        self.allocated += 1;
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Result<()> {
        if self.delay == 0 {
            return Ok(());
        }
        self.flush()?;
        if self.allocated == 0 {
            // Nothing survived trimming or interception
            self.scheduler.deallocate_sequence(self.id)?;
        }
        tracing::debug!(animator = %self.id, steps = self.allocated, "animation scheduled");
        Ok(())
    }

    /// Drop a run that failed part way, freeing its sequence
    pub(crate) fn abort(mut self) {
        self.buffer.clear();
        if self.delay == 0 {
            return;
        }
        tracing::warn!(animator = %self.id, steps = self.allocated, "animation run aborted");
        if let Err(err) = self.scheduler.deallocate_sequence(self.id) {
            tracing::warn!(animator = %self.id, error = %err, "aborted run left no sequence");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_step_spec_validation() {
        assert!(StepSpec::Steps(0).validate().is_err());
        assert!(StepSpec::Interval(0.0).validate().is_err());
        assert!(StepSpec::Interval(-1.0).validate().is_err());
        assert!(StepSpec::Interval(f32::NAN).validate().is_err());
        assert_eq!(StepSpec::Steps(3).validate(), Ok(StepSpec::Steps(3)));
    }

    #[test]
    fn test_interval_rounds_up() {
        assert_eq!(interval_to_steps(10.0, 2.0), 5);
        assert_eq!(interval_to_steps(10.0, 3.0), 4);
        assert_eq!(interval_to_steps(0.5, 2.0), 1);
        assert_eq!(StepSpec::Steps(7).resolve(100.0), 7);
    }

    #[test]
    fn test_config_validation_and_duration() {
        assert!(AnimatorConfig::with_steps(1, 0).is_err());
        assert!(AnimatorConfig::with_interval(1, 0.0).is_err());
        let config = AnimatorConfig::with_steps(2, 10).unwrap();
        assert!(config.with_process_speed(0).is_err());

        let config = config.with_process_speed(3).unwrap();
        assert_eq!(config.duration_ticks(10), 8);
        assert_eq!(AnimatorConfig::with_steps(0, 5).unwrap().duration_ticks(5), 0);
    }

    #[test]
    fn test_dispatch_batches_by_process_speed() {
        let mut scheduler = Scheduler::inline();
        let id = AnimatorId::next();
        let config = AnimatorConfig::with_steps(1, 5)
            .unwrap()
            .with_process_speed(2)
            .unwrap();

        let mut dispatch = StepDispatch::begin(id, &config, &mut scheduler, 5).unwrap();
        for _ in 0..5 {
            dispatch.submit(Box::new(|| {})).unwrap();
        }
        dispatch.finish().unwrap();

        // 2 + 2 + 1, no draw lost at a flush boundary
        assert_eq!(scheduler.pending_steps(id), Some(3));
        let fired: usize = (0..3).map(|_| scheduler.run_tick().fired).sum();
        assert_eq!(fired, 3);
        assert!(!scheduler.has_allocated(id));
    }

    #[test]
    fn test_dispatch_releases_empty_sequence() {
        let mut scheduler = Scheduler::inline();
        let id = AnimatorId::next();
        let config = AnimatorConfig::with_steps(4, 5).unwrap();

        let dispatch = StepDispatch::begin(id, &config, &mut scheduler, 5).unwrap();
        dispatch.finish().unwrap();
        assert!(!scheduler.has_allocated(id));
    }

    #[test]
    fn test_rendering_step_interceptor_moves_and_vetoes() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let mut core = LeafCore::new(AnimatorConfig::with_steps(0, 3).unwrap(), point_object());
        core.rendering_step_interceptors_mut().add_interceptor(|ctx, _| {
            if ctx.current_step() == 1 {
                ctx.set_should_render(false);
            } else {
                ctx.set_position(Vec3::new(0.0, 9.0, 0.0));
            }
        });

        let positions = (0..3).map(|i| (i, Vec3::new(i as f32, 0.0, 0.0)));
        core.render(&mut scheduler, &renderer, 0, 3, positions)
            .unwrap();

        assert_eq!(
            recorder.particles(),
            vec![(0, Vec3::new(0.0, 9.0, 0.0)), (2, Vec3::new(0.0, 9.0, 0.0))]
        );
        assert_eq!(recorder.frame_count(), 2);
    }

    #[test]
    fn test_panicking_interceptor_frees_sequence() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let mut core = LeafCore::new(AnimatorConfig::with_steps(1, 3).unwrap(), point_object());
        core.rendering_step_interceptors_mut().add_interceptor(|ctx, _| {
            if ctx.current_step() == 2 {
                panic!("interceptor exploded");
            }
        });

        let positions = || (0..3).map(|i| (i, Vec3::ZERO));
        assert_eq!(
            core.render(&mut scheduler, &renderer, 0, 3, positions()),
            Err(AnimationError::Panicked("interceptor exploded".to_string()))
        );
        assert!(!scheduler.has_allocated(core.id()));
        assert!(!scheduler.is_processing());

        // Not locked out by a stale sequence
        assert!(core.render(&mut scheduler, &renderer, 0, 2, positions().take(2)).is_ok());
        assert_eq!(run_to_idle(&mut scheduler, 10), 2);
        assert_eq!(recorder.particles().len(), 2);
    }

    #[test]
    fn test_render_skips_before_start_step() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let core = LeafCore::new(AnimatorConfig::with_steps(0, 4).unwrap(), point_object());

        let positions = (0..4).map(|i| (i, Vec3::ZERO));
        core.render(&mut scheduler, &renderer, 2, 4, positions)
            .unwrap();

        let steps: Vec<u32> = recorder.particles().into_iter().map(|(s, _)| s).collect();
        assert_eq!(steps, vec![2, 3]);
    }
}
