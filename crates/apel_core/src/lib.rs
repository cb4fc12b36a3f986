//! APEL Core
//!
//! Building blocks shared by every animation: vector math, Bézier curves,
//! the renderer contract, particle objects, per-step contexts and the
//! priority-ordered interceptor dispatcher.
//!
//! # Features
//!
//! - **Renderer**: one required primitive with default lines, ellipses,
//!   ellipsoids, cones, cylinders and curves built on top of it
//! - **Particle Objects**: shapes with appearance properties and
//!   before/after draw interceptors
//! - **Contexts**: draw and animation contexts with typed metadata
//! - **Interceptors**: priority buckets with stable insertion order

pub mod bezier;
pub mod context;
pub mod error;
pub mod interceptor;
pub mod math;
pub mod object;
pub mod renderer;

pub use bezier::{BezierCurve, DEFAULT_LENGTH_SAMPLES};
pub use context::{AnimationContext, DrawContext, Metadata, MetadataKey};
pub use error::{CoreError, Result};
pub use interceptor::{Interceptor, InterceptorDispatcher};
pub use math::Vec3;
pub use object::{
    Appearance, Curve, DrawInterceptors, DrawState, Ellipse, Ellipsoid, Line, ParticleBezier,
    ParticleEllipse, ParticleEllipsoid, ParticleLine, ParticleObject, ParticlePoint, Point, Shape,
    ShapeObject, DRAW_POSITION,
};
pub use renderer::{ParticleEffect, RecordingRenderer, RenderCommand, Renderer, WorldId};
