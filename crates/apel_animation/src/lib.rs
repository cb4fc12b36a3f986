//! APEL Animation
//!
//! Tick-driven scheduling of particle animations along paths.
//!
//! # Features
//!
//! - **Scheduler**: one step sequence per active animator, advanced once per
//!   external tick, with duplicate and missing allocation checks
//! - **Draw Worker**: a single background thread executing draw actions in
//!   submission order
//! - **Process Speed**: several rendering steps batched into one scheduled
//!   step
//! - **Path Animators**: point, linear, circular, ellipse and Bézier paths
//!   plus parallel and sequential composition
//! - **Interceptors**: per-step hooks that can move or veto a draw, and
//!   per-child hooks on composite animators

pub mod animator;
pub mod error;
pub mod scheduler;
pub mod sequence;
pub mod step;
pub mod trimming;
pub mod worker;

pub use animator::{
    interval_to_steps, AnimatorConfig, BezierAnimator, ChildInterceptors, ChildLaunch,
    CircularAnimator, EllipseAnimator, LeafCore, LinearAnimator, ObjectAnimator,
    ParallelAnimator, PathAnimator, PointAnimator, SequentialAnimator, StepInterceptors, StepSpec,
};
pub use error::{AnimationError, Result};
pub use scheduler::{AnimatorId, Scheduler, TickReport};
pub use sequence::ScheduledSequence;
pub use step::{ControlJob, DrawJob, ScheduledStep, StepAction, StepActions};
pub use trimming::{AngleTrimming, StepTrimming};
pub use worker::{DrawExecutor, DrawWorker, InlineExecutor, DEFAULT_WORKER_NAME};
