//! Linear animator: moves the object along a polyline

use super::{
    checked_total_steps, AnimatorConfig, LeafCore, ObjectAnimator, PathAnimator, StepSpec,
    RESERVE_LIMIT,
};
use crate::error::{AnimationError, Result};
use crate::scheduler::{AnimatorId, Scheduler};
use crate::trimming::StepTrimming;
use apel_core::{ParticleObject, Renderer, Vec3};
use std::sync::Arc;

/// Moves an object along one or more straight segments
///
/// Each segment is split into its own number of steps; a segment of `n`
/// steps draws at `t = i / n` for `i` in `0..n`, so joints are drawn once.
pub struct LinearAnimator {
    core: LeafCore,
    endpoints: Vec<Vec3>,
    segment_specs: Vec<StepSpec>,
    trimming: StepTrimming,
}

impl LinearAnimator {
    /// Single segment from `start` to `end`
    pub fn between(
        config: AnimatorConfig,
        start: Vec3,
        end: Vec3,
        object: Arc<dyn ParticleObject>,
    ) -> Result<Self> {
        Self::new(config, vec![start, end], object)
    }

    /// Polyline through `endpoints`, every segment using the config's step spec
    pub fn new(
        config: AnimatorConfig,
        endpoints: Vec<Vec3>,
        object: Arc<dyn ParticleObject>,
    ) -> Result<Self> {
        if endpoints.len() < 2 {
            return Err(AnimationError::validation(
                "a linear path needs at least two endpoints",
            ));
        }
        if endpoints.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(AnimationError::validation(
                "consecutive endpoints must differ",
            ));
        }
        let segment_specs = vec![config.rendering(); endpoints.len() - 1];
        let animator = Self {
            core: LeafCore::new(config, object),
            endpoints,
            segment_specs,
            trimming: StepTrimming::FULL,
        };
        checked_total_steps(animator.segment_steps())?;
        Ok(animator)
    }

    /// Give every segment its own step spec
    pub fn with_segment_specs(mut self, specs: Vec<StepSpec>) -> Result<Self> {
        if specs.len() != self.endpoints.len() - 1 {
            return Err(AnimationError::validation(format!(
                "expected {} segment specs, got {}",
                self.endpoints.len() - 1,
                specs.len()
            )));
        }
        self.segment_specs = specs
            .into_iter()
            .map(StepSpec::validate)
            .collect::<Result<_>>()?;
        checked_total_steps(self.segment_steps())?;
        Ok(self)
    }

    pub fn with_trimming(mut self, trimming: StepTrimming) -> Self {
        self.trimming = trimming;
        self
    }

    pub fn endpoints(&self) -> &[Vec3] {
        &self.endpoints
    }

    pub fn trimming(&self) -> StepTrimming {
        self.trimming
    }

    fn segment_steps(&self) -> impl Iterator<Item = u32> + '_ {
        self.endpoints
            .windows(2)
            .zip(&self.segment_specs)
            .map(|(pair, spec)| spec.resolve(pair[0].distance(pair[1])))
    }

    fn positions(&self) -> Vec<(u32, Vec3)> {
        let mut positions =
            Vec::with_capacity((self.rendering_steps() as usize).min(RESERVE_LIMIT));
        let mut step = 0u32;
        for (pair, steps) in self.endpoints.windows(2).zip(self.segment_steps()) {
            for i in 0..steps {
                if self.trimming.contains(step) {
                    let t = i as f32 / steps as f32;
                    positions.push((step, pair[0].lerp(pair[1], t)));
                }
                step += 1;
            }
        }
        positions
    }
}

impl PathAnimator for LinearAnimator {
    fn id(&self) -> AnimatorId {
        self.core.id()
    }

    fn convert_interval_to_steps(&self) -> u32 {
        self.segment_steps().fold(0, u32::saturating_add)
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

impl ObjectAnimator for LinearAnimator {
    fn core(&self) -> &LeafCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LeafCore {
        &mut self.core
    }
}
