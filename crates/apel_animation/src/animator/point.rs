//! Point animator: draws the object repeatedly at one position

use super::{AnimatorConfig, LeafCore, ObjectAnimator, PathAnimator, StepSpec};
use crate::error::{AnimationError, Result};
use crate::scheduler::{AnimatorId, Scheduler};
use apel_core::{ParticleObject, Renderer, Vec3};
use std::sync::Arc;

/// Draws an object at a fixed position for a fixed number of steps
pub struct PointAnimator {
    core: LeafCore,
    position: Vec3,
}

impl PointAnimator {
    /// A point has no length, so the configuration must use a step count
    pub fn new(
        config: AnimatorConfig,
        position: Vec3,
        object: Arc<dyn ParticleObject>,
    ) -> Result<Self> {
        if let StepSpec::Interval(_) = config.rendering() {
            return Err(AnimationError::validation(
                "point animators need a rendering step count",
            ));
        }
        Ok(Self {
            core: LeafCore::new(config, object),
            position,
        })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }
}

impl PathAnimator for PointAnimator {
    fn id(&self) -> AnimatorId {
        self.core.id()
    }

    fn convert_interval_to_steps(&self) -> u32 {
        self.core.config().rendering().resolve(0.0)
    }

    fn rendering_steps(&self) -> u32 {
        self.convert_interval_to_steps()
    }

    fn duration_ticks(&self) -> u64 {
        self.core.config().duration_ticks(self.rendering_steps())
    }

    fn begin_animation_from(
        &self,
        scheduler: &mut Scheduler,
        renderer: &Arc<dyn Renderer>,
        start_step: u32,
    ) -> Result<()> {
        let steps = self.rendering_steps();
        let position = self.position;
        self.core.render(
            scheduler,
            renderer,
            start_step,
            steps,
            (0..steps).map(|step| (step, position)),
        )
    }
}

impl ObjectAnimator for PointAnimator {
    fn core(&self) -> &LeafCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LeafCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::error::AnimationError;

    #[test]
    fn test_zero_delay_draws_synchronously() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let position = Vec3::new(1.0, 2.0, 3.0);
        let animator = PointAnimator::new(
            AnimatorConfig::with_steps(0, 5).unwrap(),
            position,
            point_object(),
        )
        .unwrap();

        animator.begin_animation(&mut scheduler, &renderer).unwrap();

        let particles = recorder.particles();
        assert_eq!(particles.len(), 5);
        assert_eq!(
            particles.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert!(particles.iter().all(|(_, p)| *p == position));
        assert!(!scheduler.has_allocated(animator.id()));
        assert!(!scheduler.is_processing());
    }

    #[test]
    fn test_delayed_run_draws_one_step_per_delay() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let animator = PointAnimator::new(
            AnimatorConfig::with_steps(2, 3).unwrap(),
            Vec3::ZERO,
            point_object(),
        )
        .unwrap();

        animator.begin_animation(&mut scheduler, &renderer).unwrap();
        assert!(scheduler.has_allocated(animator.id()));
        assert!(recorder.particles().is_empty());

        scheduler.run_tick();
        assert!(recorder.particles().is_empty());
        scheduler.run_tick();
        assert_eq!(recorder.particles().len(), 1);

        let ticks = run_to_idle(&mut scheduler, 10);
        assert_eq!(ticks, 4);
        assert_eq!(recorder.particles().len(), 3);
        assert_eq!(animator.duration_ticks(), 6);
    }

    #[test]
    fn test_second_begin_while_active_is_duplicate() {
        let (_, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let animator = PointAnimator::new(
            AnimatorConfig::with_steps(1, 2).unwrap(),
            Vec3::ZERO,
            point_object(),
        )
        .unwrap();

        animator.begin_animation(&mut scheduler, &renderer).unwrap();
        assert_eq!(
            animator.begin_animation(&mut scheduler, &renderer),
            Err(AnimationError::DuplicateAllocation(animator.id()))
        );

        run_to_idle(&mut scheduler, 10);
        assert!(animator.begin_animation(&mut scheduler, &renderer).is_ok());
    }

    #[test]
    fn test_interval_config_rejected() {
        let config = AnimatorConfig::with_interval(1, 0.5).unwrap();
        assert!(PointAnimator::new(config, Vec3::ZERO, point_object()).is_err());
    }

    #[test]
    fn test_process_speed_batches_draws() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let config = AnimatorConfig::with_steps(1, 5)
            .unwrap()
            .with_process_speed(2)
            .unwrap();
        let animator = PointAnimator::new(config, Vec3::ZERO, point_object()).unwrap();

        animator.begin_animation(&mut scheduler, &renderer).unwrap();
        assert_eq!(scheduler.pending_steps(animator.id()), Some(3));

        scheduler.run_tick();
        assert_eq!(recorder.particles().len(), 2);
        scheduler.run_tick();
        assert_eq!(recorder.particles().len(), 4);
        scheduler.run_tick();
        assert_eq!(recorder.particles().len(), 5);
        assert!(!scheduler.is_processing());
    }
}
