//! APEL Runtime
//!
//! Host-facing entry point: a [`Session`] bundling the scheduler with its
//! draw worker, TOML configuration and tracing setup.
//!
//! # Example
//!
//! ```ignore
//! use apel_runtime::prelude::*;
//!
//! let mut session = Session::standard()?;
//! let renderer: Arc<dyn Renderer> = Arc::new(RecordingRenderer::new());
//!
//! let object = Arc::new(ParticlePoint::new(ParticleEffect::new("flame"), Point));
//! let animator = LinearAnimator::between(
//!     AnimatorConfig::with_interval(1, 0.5)?,
//!     Vec3::ZERO,
//!     Vec3::new(10.0, 0.0, 0.0),
//!     object,
//! )?;
//!
//! session.begin(&animator, &renderer)?;
//! while session.is_processing() {
//!     session.tick()?;
//! }
//! ```

pub mod config;
mod error;
#[cfg(feature = "logging")]
mod logging;
mod session;


pub use config::{LoggingConfig, RuntimeConfig, SchedulerConfig, WorkerConfig};
pub use error::{Result, RuntimeError};
#[cfg(feature = "logging")]
pub use logging::init_tracing;
pub use session::Session;

pub use apel_animation;
pub use apel_core;

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::{RuntimeConfig, RuntimeError, Session};
    pub use apel_animation::{
        AngleTrimming, AnimationError, AnimatorConfig, AnimatorId, BezierAnimator,
        CircularAnimator, EllipseAnimator, LinearAnimator, ObjectAnimator, ParallelAnimator,
        PathAnimator, PointAnimator, Scheduler, SequentialAnimator, StepSpec, StepTrimming,
        TickReport,
    };
    pub use apel_core::{
        AnimationContext, BezierCurve, DrawContext, MetadataKey, ParticleEffect, ParticleObject,
        ParticlePoint, Point, RecordingRenderer, Renderer, Vec3,
    };
    pub use std::sync::Arc;
}
