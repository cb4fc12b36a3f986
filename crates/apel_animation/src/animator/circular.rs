//! Circular animator, and the orbit math it shares with the ellipse animator

use super::{AnimatorConfig, LeafCore, ObjectAnimator, PathAnimator, StepSpec};
use crate::error::{AnimationError, Result};
use crate::scheduler::{AnimatorId, Scheduler};
use crate::trimming::AngleTrimming;
use apel_core::{ParticleObject, Renderer, Vec3};
use std::f32::consts::TAU;
use std::sync::Arc;

const ARC_SAMPLES: u32 = 100;

/// Closed path around a center in the rotated XY plane
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Orbit {
    pub center: Vec3,
    pub radius: f32,
    pub stretch: f32,
    pub rotation: Vec3,
    pub revolutions: u32,
    pub clockwise: bool,
    pub trimming: AngleTrimming,
}

impl Orbit {
    pub fn new(center: Vec3, radius: f32, stretch: f32) -> Result<Self> {
        if !(radius > 0.0) || !(stretch > 0.0) {
            return Err(AnimationError::validation(
                "orbit radius and stretch must be positive",
            ));
        }
        Ok(Self {
            center,
            radius,
            stretch,
            rotation: Vec3::ZERO,
            revolutions: 1,
            clockwise: false,
            trimming: AngleTrimming::default(),
        })
    }

    pub fn set_revolutions(&mut self, revolutions: u32) -> Result<()> {
        if revolutions == 0 {
            return Err(AnimationError::validation("revolutions must be at least 1"));
        }
        self.revolutions = revolutions;
        Ok(())
    }

    /// Angle after sweeping `sweep` radians through the trimmed window
    ///
    /// Counter-clockwise runs leave from the window's start, clockwise runs
    /// from its end, so both stay inside the window.
    fn angle_at(&self, sweep: f32) -> f32 {
        let angle = if self.clockwise {
            self.trimming.end() - sweep
        } else {
            self.trimming.start() + sweep
        };
        angle.rem_euclid(TAU)
    }

    fn point_at(&self, angle: f32) -> Vec3 {
        let local = Vec3::new(angle.cos() * self.radius, angle.sin() * self.stretch, 0.0);
        local.rotate_euler(self.rotation) + self.center
    }

    /// Length of the trimmed arc for one revolution
    pub fn arc_length(&self) -> f32 {
        let span = self.trimming.span();
        if self.radius == self.stretch {
            return self.radius * span;
        }
        let mut prev = self.point_at(self.angle_at(0.0));
        let mut total = 0.0;
        for i in 1..=ARC_SAMPLES {
            let point = self.point_at(self.angle_at(span * i as f32 / ARC_SAMPLES as f32));
            total += prev.distance(point);
            prev = point;
        }
        total
    }

    pub fn steps_per_revolution(&self, spec: StepSpec) -> u32 {
        match spec {
            StepSpec::Steps(steps) => steps,
            StepSpec::Interval(_) => spec.resolve(self.arc_length()),
        }
    }

    pub fn total_steps(&self, spec: StepSpec) -> u32 {
        self.steps_per_revolution(spec)
            .saturating_mul(self.revolutions)
    }

    pub fn positions(&self, spec: StepSpec) -> impl Iterator<Item = (u32, Vec3)> + '_ {
        let per_revolution = self.steps_per_revolution(spec).max(1);
        let span = self.trimming.span();
        (0..self.total_steps(spec)).map(move |step| {
            let within = step % per_revolution;
            let sweep = span * within as f32 / per_revolution as f32;
            (step, self.point_at(self.angle_at(sweep)))
        })
    }
}

/// Moves an object around a circle
pub struct CircularAnimator {
    core: LeafCore,
    orbit: Orbit,
}

impl CircularAnimator {
    pub fn new(
        config: AnimatorConfig,
        center: Vec3,
        radius: f32,
        object: Arc<dyn ParticleObject>,
    ) -> Result<Self> {
        Ok(Self {
            core: LeafCore::new(config, object),
            orbit: Orbit::new(center, radius, radius)?,
        })
    }

    /// Tilt the plane of the circle (euler angles, radians)
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

    pub fn center(&self) -> Vec3 {
        self.orbit.center
    }

    pub fn radius(&self) -> f32 {
        self.orbit.radius
    }

    pub fn revolutions(&self) -> u32 {
        self.orbit.revolutions
    }

    pub fn is_clockwise(&self) -> bool {
        self.orbit.clockwise
    }

    pub fn trimming(&self) -> AngleTrimming {
        self.orbit.trimming
    }
}

impl PathAnimator for CircularAnimator {
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

impl ObjectAnimator for CircularAnimator {
    fn core(&self) -> &LeafCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LeafCore {
        &mut self.core
    }
}
