//! Ellipse animator

use super::circular::Orbit;
use super::{AnimatorConfig, LeafCore, ObjectAnimator, PathAnimator};
use crate::error::Result;
use crate::scheduler::{AnimatorId, Scheduler};
use crate::trimming::AngleTrimming;
use apel_core::{ParticleObject, Renderer, Vec3};
use std::sync::Arc;

/// Moves an object around an ellipse with semi-axes `radius` (X) and
/// `stretch` (Y) in the rotated XY plane
pub struct EllipseAnimator {
    core: LeafCore,
    orbit: Orbit,
}

impl EllipseAnimator {
    pub fn new(
        config: AnimatorConfig,
        center: Vec3,
        radius: f32,
        stretch: f32,
        object: Arc<dyn ParticleObject>,
    ) -> Result<Self> {
        Ok(Self {
            core: LeafCore::new(config, object),
            orbit: Orbit::new(center, radius, stretch)?,
        })
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.orbit.rotation = rotation.wrap_rotation();
        self
    }

    pub fn with_revolutions(mut self, revolutions: u32) -> Result<Self> {
        self.orbit.set_revolutions(revolutions)?;
        Ok(self)
    }

    pub fn clockwise(mut self, clockwise: bool) -> Self {
        self.orbit.clockwise = clockwise;
        self
    }

    pub fn with_trimming(mut self, trimming: AngleTrimming) -> Self {
        self.orbit.trimming = trimming;
        self
    }

    pub fn radius(&self) -> f32 {
        self.orbit.radius
    }

    pub fn stretch(&self) -> f32 {
        self.orbit.stretch
    }

    pub fn revolutions(&self) -> u32 {
        self.orbit.revolutions
    }
}

impl PathAnimator for EllipseAnimator {
    fn id(&self) -> AnimatorId {
        self.core.id()
    }

    fn convert_interval_to_steps(&self) -> u32 {
        self.orbit.total_steps(self.core.config().rendering())
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
        let spec = self.core.config().rendering();
        let total = self.orbit.total_steps(spec);
        self.core.render(
            scheduler,
            renderer,
            start_step,
            total,
            self.orbit.positions(spec),
        )
    }
}

impl ObjectAnimator for EllipseAnimator {
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

    #[test]
    fn test_positions_lie_on_ellipse() {
        let (recorder, renderer) = recording();
        let mut scheduler = Scheduler::inline();
        let animator = EllipseAnimator::new(
            AnimatorConfig::with_steps(1, 12).unwrap(),
            Vec3::ZERO,
            3.0,
            1.0,
            point_object(),
        )
        .unwrap();

        animator.begin_animation(&mut scheduler, &renderer).unwrap();
        assert_eq!(run_to_idle(&mut scheduler, 50), 12);

        let particles = recorder.particles();
        assert_eq!(particles.len(), 12);
        for (_, p) in particles {
            let on_curve = (p.x / 3.0).powi(2) + p.y.powi(2);
            assert!((on_curve - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_interval_uses_sampled_perimeter() {
        // Perimeter of a 2 x 1 ellipse is about 9.69
        let animator = EllipseAnimator::new(
            AnimatorConfig::with_interval(1, 1.0).unwrap(),
            Vec3::ZERO,
            2.0,
            1.0,
            point_object(),
        )
        .unwrap()
        .with_revolutions(2)
        .unwrap();
        assert_eq!(animator.convert_interval_to_steps(), 20);
    }

    #[test]
    fn test_rejects_non_positive_stretch() {
        let config = AnimatorConfig::with_steps(1, 4).unwrap();
        assert!(EllipseAnimator::new(config, Vec3::ZERO, 1.0, 0.0, point_object()).is_err());
    }
}
