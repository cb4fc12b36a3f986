//! Particle objects
//!
//! A particle object knows how to draw itself at a base position. The
//! built-in objects are a [`ShapeObject`] wrapping one of the [`Shape`]s in
//! this module together with the common [`Appearance`] properties and a pair
//! of interceptor dispatchers that run around every draw call:
//!
//! 1. the object's state is cloned, so interceptors never mutate the shared
//!    object,
//! 2. the before-draw interceptors run and may move the draw position through
//!    [`DRAW_POSITION`] or veto the draw,
//! 3. the shape is drawn unless vetoed,
//! 4. the after-draw interceptors run.

use crate::bezier::BezierCurve;
use crate::context::{DrawContext, MetadataKey};
use crate::error::{CoreError, Result};
use crate::interceptor::InterceptorDispatcher;
use crate::math::Vec3;
use crate::renderer::{ParticleEffect, Renderer};

/// Position the shape is drawn at, before the object offset is applied
///
/// Seeded with the context position before the before-draw interceptors run.
pub const DRAW_POSITION: MetadataKey<Vec3> = MetadataKey::new("draw_position");

/// Anything that can be drawn at a position
pub trait ParticleObject: Send + Sync {
    fn draw(&self, renderer: &dyn Renderer, ctx: &mut DrawContext);
}

// ============================================================================
// Appearance
// ============================================================================

/// Properties shared by every built-in shape
#[derive(Clone, Debug, PartialEq)]
pub struct Appearance {
    pub effect: ParticleEffect,
    rotation: Vec3,
    offset: Vec3,
    amount: u32,
}

impl Appearance {
    pub fn new(effect: ParticleEffect) -> Self {
        Self {
            effect,
            rotation: Vec3::ZERO,
            offset: Vec3::ZERO,
            amount: 1,
        }
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Set the euler rotation in radians, wrapped into a single turn
    pub fn set_rotation(&mut self, rotation: Vec3) -> Vec3 {
        std::mem::replace(&mut self.rotation, rotation.wrap_rotation())
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec3) -> Vec3 {
        std::mem::replace(&mut self.offset, offset)
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Number of particles the shape is drawn with; must be at least 1
    pub fn set_amount(&mut self, amount: u32) -> Result<u32> {
        if amount == 0 {
            return Err(CoreError::validation("particle amount must be above 0"));
        }
        Ok(std::mem::replace(&mut self.amount, amount))
    }
}

// ============================================================================
// Shapes
// ============================================================================

/// Geometry drawn by a [`ShapeObject`]
pub trait Shape: Clone + Send + Sync + 'static {
    /// Draw the shape with its origin at `origin`
    fn render(&self, renderer: &dyn Renderer, appearance: &Appearance, step: u32, origin: Vec3);
}

/// A single particle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point;

impl Shape for Point {
    fn render(&self, renderer: &dyn Renderer, appearance: &Appearance, step: u32, origin: Vec3) {
        renderer.draw_particle(&appearance.effect, step, origin);
    }
}

/// Straight line between two points relative to the origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    start: Vec3,
    end: Vec3,
}

impl Line {
    pub fn new(start: Vec3, end: Vec3) -> Result<Self> {
        if start == end {
            return Err(CoreError::validation("line endpoints must differ"));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn end(&self) -> Vec3 {
        self.end
    }
}

impl Shape for Line {
    fn render(&self, renderer: &dyn Renderer, appearance: &Appearance, step: u32, origin: Vec3) {
        let rotation = appearance.rotation();
        let start = self.start.rotate_euler(rotation) + origin;
        let end = self.end.rotate_euler(rotation) + origin;
        renderer.draw_line(&appearance.effect, step, start, end, appearance.amount());
    }
}

/// Ellipse in the rotated XY plane; a circle when `stretch == radius`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipse {
    radius: f32,
    stretch: f32,
}

impl Ellipse {
    pub fn new(radius: f32, stretch: f32) -> Result<Self> {
        if !(radius > 0.0) || !(stretch > 0.0) {
            return Err(CoreError::validation(
                "ellipse radius and stretch must be positive",
            ));
        }
        Ok(Self { radius, stretch })
    }

    pub fn circle(radius: f32) -> Result<Self> {
        Self::new(radius, radius)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn stretch(&self) -> f32 {
        self.stretch
    }
}

impl Shape for Ellipse {
    fn render(&self, renderer: &dyn Renderer, appearance: &Appearance, step: u32, origin: Vec3) {
        renderer.draw_ellipse(
            &appearance.effect,
            step,
            origin,
            self.radius,
            self.stretch,
            appearance.rotation(),
            appearance.amount(),
        );
    }
}

/// Ellipsoid surface; a sphere when all radii are equal
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    radii: Vec3,
}

impl Ellipsoid {
    pub fn new(radii: Vec3) -> Result<Self> {
        if !(radii.x > 0.0 && radii.y > 0.0 && radii.z > 0.0) {
            return Err(CoreError::validation("ellipsoid radii must be positive"));
        }
        Ok(Self { radii })
    }

    pub fn sphere(radius: f32) -> Result<Self> {
        Self::new(Vec3::new(radius, radius, radius))
    }
}

impl Shape for Ellipsoid {
    fn render(&self, renderer: &dyn Renderer, appearance: &Appearance, step: u32, origin: Vec3) {
        renderer.draw_ellipsoid(
            &appearance.effect,
            step,
            origin,
            self.radii,
            appearance.rotation(),
            appearance.amount(),
        );
    }
}

/// Bézier curve relative to the origin
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    curve: BezierCurve,
}

impl Curve {
    pub fn new(curve: BezierCurve) -> Result<Self> {
        curve.validate()?;
        Ok(Self { curve })
    }

    pub fn curve(&self) -> &BezierCurve {
        &self.curve
    }
}

impl Shape for Curve {
    fn render(&self, renderer: &dyn Renderer, appearance: &Appearance, step: u32, origin: Vec3) {
        renderer.draw_bezier(
            &appearance.effect,
            step,
            origin,
            &self.curve,
            appearance.rotation(),
            appearance.amount(),
        );
    }
}

// ============================================================================
// ShapeObject
// ============================================================================

/// Per-draw copy of an object's state, the subject of its interceptors
#[derive(Clone, Debug, PartialEq)]
pub struct DrawState<S> {
    pub appearance: Appearance,
    pub shape: S,
}

/// Interceptors run around each draw of a [`ShapeObject`]
pub type DrawInterceptors<S> = InterceptorDispatcher<DrawState<S>, DrawContext>;

/// A shape with appearance properties and draw interceptors
pub struct ShapeObject<S: Shape> {
    state: DrawState<S>,
    before_draw: DrawInterceptors<S>,
    after_draw: DrawInterceptors<S>,
}

pub type ParticlePoint = ShapeObject<Point>;
pub type ParticleLine = ShapeObject<Line>;
pub type ParticleEllipse = ShapeObject<Ellipse>;
pub type ParticleEllipsoid = ShapeObject<Ellipsoid>;
pub type ParticleBezier = ShapeObject<Curve>;

impl<S: Shape> ShapeObject<S> {
    pub fn new(effect: ParticleEffect, shape: S) -> Self {
        Self {
            state: DrawState {
                appearance: Appearance::new(effect),
                shape,
            },
            before_draw: InterceptorDispatcher::new(),
            after_draw: InterceptorDispatcher::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.state.appearance.set_rotation(rotation);
        self
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.state.appearance.set_offset(offset);
        self
    }

    pub fn with_amount(mut self, amount: u32) -> Result<Self> {
        self.state.appearance.set_amount(amount)?;
        Ok(self)
    }

    pub fn appearance(&self) -> &Appearance {
        &self.state.appearance
    }

    pub fn appearance_mut(&mut self) -> &mut Appearance {
        &mut self.state.appearance
    }

    pub fn shape(&self) -> &S {
        &self.state.shape
    }

    pub fn set_shape(&mut self, shape: S) -> S {
        std::mem::replace(&mut self.state.shape, shape)
    }

    /// Add a before-draw interceptor at the next default priority
    pub fn on_before_draw<F>(&mut self, handler: F) -> i32
    where
        F: Fn(&mut DrawContext, &mut DrawState<S>) + Send + Sync + 'static,
    {
        self.before_draw.add_interceptor(handler)
    }

    /// Add an after-draw interceptor at the next default priority
    pub fn on_after_draw<F>(&mut self, handler: F) -> i32
    where
        F: Fn(&mut DrawContext, &mut DrawState<S>) + Send + Sync + 'static,
    {
        self.after_draw.add_interceptor(handler)
    }

    pub fn before_draw_mut(&mut self) -> &mut DrawInterceptors<S> {
        &mut self.before_draw
    }

    pub fn after_draw_mut(&mut self) -> &mut DrawInterceptors<S> {
        &mut self.after_draw
    }
}

impl<S: Shape> ParticleObject for ShapeObject<S> {
    fn draw(&self, renderer: &dyn Renderer, ctx: &mut DrawContext) {
        let mut state = self.state.clone();

        let base = ctx.position();
        ctx.put_metadata(&DRAW_POSITION, base);
        self.before_draw.compute(&mut state, ctx);

        if ctx.should_render() {
            let position = ctx.metadata_or(&DRAW_POSITION, base) + state.appearance.offset();
            state
                .shape
                .render(renderer, &state.appearance, ctx.current_step(), position);
        } else {
            tracing::trace!(step = ctx.current_step(), "draw vetoed by before-draw interceptor");
        }

        self.after_draw.compute(&mut state, ctx);
    }
}

impl<S: Shape + std::fmt::Debug> std::fmt::Debug for ShapeObject<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeObject")
            .field("state", &self.state)
            .field("before_draw", &self.before_draw)
            .field("after_draw", &self.after_draw)
            .finish()
    }
}
