//! Bézier animator: moves the object along one or more curves

use super::{
    checked_total_steps, AnimatorConfig, LeafCore, ObjectAnimator, PathAnimator, StepSpec,
    RESERVE_LIMIT,
};
use crate::error::{AnimationError, Result};
use crate::scheduler::{AnimatorId, Scheduler};
use crate::trimming::StepTrimming;
use apel_core::{BezierCurve, ParticleObject, Renderer, Vec3, DEFAULT_LENGTH_SAMPLES};
use std::sync::Arc;

/// Moves an object along a chain of Bézier curves
///
/// A curve of `n` steps is drawn at `t = i / n` for `i` in `0..n`. Interval
/// based step counts use the curve length approximated with
/// [`DEFAULT_LENGTH_SAMPLES`] chords.
pub struct BezierAnimator {
    core: LeafCore,
    curves: Vec<BezierCurve>,
    curve_specs: Vec<StepSpec>,
    trimming: StepTrimming,
}

impl BezierAnimator {
    pub fn new(
        config: AnimatorConfig,
        curves: Vec<BezierCurve>,
        object: Arc<dyn ParticleObject>,
    ) -> Result<Self> {
        if curves.is_empty() {
            return Err(AnimationError::validation(
                "a Bézier path needs at least one curve",
            ));
        }
        for curve in &curves {
            curve.validate()?;
        }
        let curve_specs = vec![config.rendering(); curves.len()];
        let animator = Self {
            core: LeafCore::new(config, object),
            curves,
            curve_specs,
            trimming: StepTrimming::FULL,
        };
        checked_total_steps(animator.curve_steps())?;
        Ok(animator)
    }

    /// Give every curve its own step spec
    pub fn with_curve_specs(mut self, specs: Vec<StepSpec>) -> Result<Self> {
        if specs.len() != self.curves.len() {
            return Err(AnimationError::validation(format!(
                "expected {} curve specs, got {}",
                self.curves.len(),
                specs.len()
            )));
        }
        self.curve_specs = specs
            .into_iter()
            .map(StepSpec::validate)
            .collect::<Result<_>>()?;
        checked_total_steps(self.curve_steps())?;
        Ok(self)
    }

    pub fn with_trimming(mut self, trimming: StepTrimming) -> Self {
        self.trimming = trimming;
        self
    }

    pub fn curves(&self) -> &[BezierCurve] {
        &self.curves
    }

    fn curve_steps(&self) -> impl Iterator<Item = u32> + '_ {
        self.curves
            .iter()
            .zip(&self.curve_specs)
            .map(|(curve, spec)| match spec {
                StepSpec::Steps(steps) => *steps,
                StepSpec::Interval(_) => spec.resolve(curve.length(DEFAULT_LENGTH_SAMPLES)),
            })
    }

    fn positions(&self) -> Vec<(u32, Vec3)> {
        let mut positions =
            Vec::with_capacity((self.rendering_steps() as usize).min(RESERVE_LIMIT));
        let mut step = 0u32;
        for (curve, steps) in self.curves.iter().zip(self.curve_steps()) {
            for i in 0..steps {
                if self.trimming.contains(step) {
                    positions.push((step, curve.compute(i as f32 / steps as f32)));
                }
                step += 1;
            }
        }
        positions
    }
}

impl PathAnimator for BezierAnimator {
    fn id(&self) -> AnimatorId {
        self.core.id()
    }

    fn convert_interval_to_steps(&self) -> u32 {
        self.curve_steps().fold(0, u32::saturating_add)
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
        let total = self.rendering_steps();
        self.core
            .render(scheduler, renderer, start_step, total, self.positions())
    }
}

impl ObjectAnimator for BezierAnimator {
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

    fn arch() -> BezierCurve {
        BezierCurve::quadratic(
            Vec3::ZERO,
            Vec3::new(2.0, 4.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
        )
    }

    #[test]
    fn test_positions_follow_curve() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let curve = arch();
        let animator = BezierAnimator::new(
            AnimatorConfig::with_steps(0, 4).unwrap(),
            vec![curve.clone()],
            point_object(),
        )
        .unwrap();

        animator.begin_animation(&mut scheduler, &renderer).unwrap();
        let particles = recorder.particles();
        assert_eq!(particles.len(), 4);
        for (step, position) in particles {
            let expected = curve.compute(step as f32 / 4.0);
            assert!(position.distance(expected) < 1e-5);
        }
    }

    #[test]
    fn test_interval_uses_curve_length() {
        let straight = BezierCurve::linear(Vec3::ZERO, Vec3::new(9.0, 0.0, 0.0));
        let animator = BezierAnimator::new(
            AnimatorConfig::with_interval(1, 2.0).unwrap(),
            vec![straight.clone(), straight],
            point_object(),
        )
        .unwrap();
        // ceil(9 / 2) per curve
        assert_eq!(animator.convert_interval_to_steps(), 10);
    }

    #[test]
    fn test_curve_specs_and_trimming() {
        let animator = BezierAnimator::new(
            AnimatorConfig::with_steps(1, 3).unwrap(),
            vec![arch(), arch()],
            point_object(),
        )
        .unwrap()
        .with_curve_specs(vec![StepSpec::Steps(2), StepSpec::Steps(5)])
        .unwrap()
        .with_trimming(StepTrimming::new(1, Some(4)).unwrap());

        assert_eq!(animator.rendering_steps(), 7);
        let steps: Vec<u32> = animator.positions().iter().map(|(s, _)| *s).collect();
        assert_eq!(steps, vec![1, 2, 3]);
    }

    #[test]
    fn test_step_total_overflow_rejected() {
        let animator = BezierAnimator::new(
            AnimatorConfig::with_steps(1, 3).unwrap(),
            vec![arch(), arch()],
            point_object(),
        )
        .unwrap();
        assert!(animator
            .with_curve_specs(vec![StepSpec::Steps(u32::MAX), StepSpec::Steps(2)])
            .is_err());
    }

    #[test]
    fn test_invalid_curves_rejected() {
        let config = AnimatorConfig::with_steps(1, 3).unwrap();
        assert!(BezierAnimator::new(config, Vec::new(), point_object()).is_err());
        let flat = BezierCurve::linear(Vec3::ONE, Vec3::ONE);
        assert!(BezierAnimator::new(config, vec![flat], point_object()).is_err());
        let animator = BezierAnimator::new(config, vec![arch()], point_object()).unwrap();
        assert!(animator.with_curve_specs(Vec::new()).is_err());
    }
}
