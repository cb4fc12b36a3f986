//! Renderer contract
//!
//! A [`Renderer`] is the canvas particle objects draw into. Only
//! [`Renderer::draw_particle`] is required; every other primitive has a
//! default expressed as a series of particle draws, which renderers with a
//! cheaper native path may override.
//!
//! Renderers are shared between the thread that starts animations and the
//! background draw worker, so implementations must be `Send + Sync` and use
//! interior mutability for any state they keep.

use crate::bezier::BezierCurve;
use crate::math::Vec3;
use parking_lot::Mutex;
use std::f32::consts::{PI, TAU};
use std::sync::Arc;

/// Opaque handle of the world a renderer draws into
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WorldId(pub u64);

/// The particle type drawn at each point
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParticleEffect {
    name: Arc<str>,
}

impl ParticleEffect {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Drawing surface for particle objects
pub trait Renderer: Send + Sync {
    /// World this renderer draws into
    fn world(&self) -> WorldId {
        WorldId::default()
    }

    /// Called once before the object is drawn at a rendering position
    fn before_frame(&self, _step: u32, _origin: Vec3) {}

    /// Called once after the object is drawn at a rendering position
    fn after_frame(&self, _step: u32, _origin: Vec3) {}

    fn draw_particle(&self, effect: &ParticleEffect, step: u32, position: Vec3);

    /// `amount` particles spaced evenly from `start` to `end`, both included
    fn draw_line(&self, effect: &ParticleEffect, step: u32, start: Vec3, end: Vec3, amount: u32) {
        if amount <= 1 {
            self.draw_particle(effect, step, start);
            return;
        }
        let stride = (end - start) * (1.0 / (amount - 1) as f32);
        let mut current = start;
        for _ in 0..amount {
            self.draw_particle(effect, step, current);
            current += stride;
        }
    }

    /// `amount` particles spaced evenly around an ellipse in the rotated XY plane
    #[allow(clippy::too_many_arguments)]
    fn draw_ellipse(
        &self,
        effect: &ParticleEffect,
        step: u32,
        center: Vec3,
        radius: f32,
        stretch: f32,
        rotation: Vec3,
        amount: u32,
    ) {
        let interval = TAU / amount.max(1) as f32;
        for i in 0..amount {
            let angle = interval * i as f32;
            let point = Vec3::new(angle.cos() * radius, angle.sin() * stretch, 0.0);
            self.draw_particle(effect, step, point.rotate_euler(rotation) + center);
        }
    }

    /// `amount` particles on an ellipsoid surface using a golden spiral
    fn draw_ellipsoid(
        &self,
        effect: &ParticleEffect,
        step: u32,
        center: Vec3,
        radii: Vec3,
        rotation: Vec3,
        amount: u32,
    ) {
        let golden = PI * (1.0 + 5f32.sqrt());
        let count = amount.max(1) as f32;
        for i in 0..amount {
            let k = i as f32 + 0.5;
            let phi = (1.0 - 2.0 * k / count).clamp(-1.0, 1.0).acos();
            let theta = golden * k;
            let unit = Vec3::new(theta.cos() * phi.sin(), theta.sin() * phi.sin(), phi.cos());
            let point = Vec3::new(unit.x * radii.x, unit.y * radii.y, unit.z * radii.z);
            self.draw_particle(effect, step, point.rotate_euler(rotation) + center);
        }
    }

    /// Cone with its tip at `tip` opening along +Y
    ///
    /// Particles are spread over rings whose radius grows linearly with height.
    #[allow(clippy::too_many_arguments)]
    fn draw_cone(
        &self,
        effect: &ParticleEffect,
        step: u32,
        tip: Vec3,
        height: f32,
        radius: f32,
        rotation: Vec3,
        amount: u32,
    ) {
        let rings = ring_count(amount);
        let per_ring = (amount / rings).max(1);
        for ring in 1..=rings {
            let fraction = ring as f32 / rings as f32;
            let ring_radius = radius * fraction;
            let y = height * fraction;
            for i in 0..per_ring {
                let angle = TAU * i as f32 / per_ring as f32;
                let point = Vec3::new(angle.cos() * ring_radius, y, angle.sin() * ring_radius);
                self.draw_particle(effect, step, point.rotate_euler(rotation) + tip);
            }
        }
    }

    /// Cylinder centered on `center` with its axis along +Y
    #[allow(clippy::too_many_arguments)]
    fn draw_cylinder(
        &self,
        effect: &ParticleEffect,
        step: u32,
        center: Vec3,
        radius: f32,
        height: f32,
        rotation: Vec3,
        amount: u32,
    ) {
        let rings = ring_count(amount);
        let per_ring = (amount / rings).max(1);
        for ring in 0..rings {
            let fraction = if rings == 1 {
                0.5
            } else {
                ring as f32 / (rings - 1) as f32
            };
            let y = height * (fraction - 0.5);
            for i in 0..per_ring {
                let angle = TAU * i as f32 / per_ring as f32;
                let point = Vec3::new(angle.cos() * radius, y, angle.sin() * radius);
                self.draw_particle(effect, step, point.rotate_euler(rotation) + center);
            }
        }
    }

    /// `amount` particles along a Bézier curve, `t` stepping by `1 / amount`
    fn draw_bezier(
        &self,
        effect: &ParticleEffect,
        step: u32,
        origin: Vec3,
        curve: &BezierCurve,
        rotation: Vec3,
        amount: u32,
    ) {
        let interval = 1.0 / amount.max(1) as f32;
        for i in 0..amount {
            let point = curve.compute(interval * i as f32);
            self.draw_particle(effect, step, point.rotate_euler(rotation) + origin);
        }
    }
}

fn ring_count(amount: u32) -> u32 {
    ((amount as f32).sqrt().floor() as u32).max(1)
}

// ============================================================================
// Recording renderer
// ============================================================================

/// A single recorded renderer call
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    BeforeFrame { step: u32, origin: Vec3 },
    Particle {
        effect: ParticleEffect,
        step: u32,
        position: Vec3,
    },
    AfterFrame { step: u32, origin: Vec3 },
}

/// Renderer that records every call instead of drawing
///
/// Useful for baking an animation into a replayable command list and for
/// asserting on draw output in tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    world: WorldId,
    commands: Mutex<Vec<RenderCommand>>,
}

impl RecordingRenderer {
    /// Create a new recording renderer
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_world(world: WorldId) -> Self {
        Self {
            world,
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the recorded commands
    pub fn commands(&self) -> Vec<RenderCommand> {
        self.commands.lock().clone()
    }

    /// Take the recorded commands
    pub fn take_commands(&self) -> Vec<RenderCommand> {
        std::mem::take(&mut *self.commands.lock())
    }

    /// Recorded particle draws as `(step, position)` pairs
    pub fn particles(&self) -> Vec<(u32, Vec3)> {
        self.commands
            .lock()
            .iter()
            .filter_map(|cmd| match cmd {
                RenderCommand::Particle { step, position, .. } => Some((*step, *position)),
                _ => None,
            })
            .collect()
    }

    /// Number of frames started so far
    pub fn frame_count(&self) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|cmd| matches!(cmd, RenderCommand::BeforeFrame { .. }))
            .count()
    }

    /// Clear all recorded commands
    pub fn clear(&self) {
        self.commands.lock().clear();
    }
}

impl Renderer for RecordingRenderer {
    fn world(&self) -> WorldId {
        self.world
    }

    fn before_frame(&self, step: u32, origin: Vec3) {
        self.commands
            .lock()
            .push(RenderCommand::BeforeFrame { step, origin });
    }

    fn after_frame(&self, step: u32, origin: Vec3) {
        self.commands
            .lock()
            .push(RenderCommand::AfterFrame { step, origin });
    }

    fn draw_particle(&self, effect: &ParticleEffect, step: u32, position: Vec3) {
        self.commands.lock().push(RenderCommand::Particle {
            effect: effect.clone(),
            step,
            position,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flame() -> ParticleEffect {
        ParticleEffect::new("flame")
    }

    #[test]
    fn test_draw_line_includes_both_ends() {
        let renderer = RecordingRenderer::new();
        renderer.draw_line(&flame(), 0, Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 5);

        let xs: Vec<f32> = renderer.particles().iter().map(|(_, p)| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_draw_line_single_particle() {
        let renderer = RecordingRenderer::new();
        renderer.draw_line(&flame(), 2, Vec3::ONE, Vec3::ZERO, 1);
        assert_eq!(renderer.particles(), vec![(2, Vec3::ONE)]);
    }

    #[test]
    fn test_draw_ellipse_points_on_curve() {
        let renderer = RecordingRenderer::new();
        renderer.draw_ellipse(&flame(), 0, Vec3::ZERO, 2.0, 1.0, Vec3::ZERO, 8);

        let particles = renderer.particles();
        assert_eq!(particles.len(), 8);
        for (_, p) in particles {
            let on_curve = (p.x / 2.0).powi(2) + p.y.powi(2);
            assert!((on_curve - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_draw_ellipsoid_on_sphere() {
        let renderer = RecordingRenderer::new();
        let center = Vec3::new(1.0, 1.0, 1.0);
        renderer.draw_ellipsoid(&flame(), 0, center, Vec3::ONE * 3.0, Vec3::ZERO, 20);

        let particles = renderer.particles();
        assert_eq!(particles.len(), 20);
        for (_, p) in particles {
            assert!((p.distance(center) - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_cone_and_cylinder_draw_something() {
        let renderer = RecordingRenderer::new();
        renderer.draw_cone(&flame(), 0, Vec3::ZERO, 2.0, 1.0, Vec3::ZERO, 16);
        assert_eq!(renderer.particles().len(), 16);
        renderer.clear();
        renderer.draw_cylinder(&flame(), 0, Vec3::ZERO, 1.0, 2.0, Vec3::ZERO, 9);
        assert_eq!(renderer.particles().len(), 9);
        assert!(renderer.particles().iter().all(|(_, p)| p.y.abs() <= 1.0 + 1e-5));
    }

    #[test]
    fn test_frames_recorded_in_order() {
        let renderer = RecordingRenderer::with_world(WorldId(9));
        renderer.before_frame(1, Vec3::ZERO);
        renderer.draw_particle(&flame(), 1, Vec3::ZERO);
        renderer.after_frame(1, Vec3::ZERO);

        assert_eq!(renderer.world(), WorldId(9));
        assert_eq!(renderer.frame_count(), 1);
        let commands = renderer.take_commands();
        assert!(matches!(commands[0], RenderCommand::BeforeFrame { step: 1, .. }));
        assert!(matches!(commands[2], RenderCommand::AfterFrame { step: 1, .. }));
        assert!(renderer.commands().is_empty());
    }
}
