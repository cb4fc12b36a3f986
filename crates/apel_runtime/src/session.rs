//! Animation session
//!
//! A [`Session`] owns a [`Scheduler`] and, unless configured for inline
//! draws, the background [`DrawWorker`] that executes fired draw actions.
//! The host calls [`Session::tick`] once per external tick.

use crate::config::{LoggingConfig, RuntimeConfig};
use crate::error::{Result, RuntimeError};
use apel_animation::{
    DrawExecutor, DrawWorker, InlineExecutor, PathAnimator, Scheduler, TickReport,
};
use apel_core::Renderer;
use std::path::Path;
use std::sync::Arc;

/// Scheduler plus draw executor, driven by the host's tick
pub struct Session {
    config: RuntimeConfig,
    scheduler: Scheduler,
    worker: Option<Arc<DrawWorker>>,
}

impl Session {
    /// Create a session, spawning the draw worker unless draws run inline
    ///
    /// Installs the global tracing subscriber with the configured filter
    /// when none is installed yet.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        init_logging(&config.logging);

        let worker = if config.worker.inline {
            None
        } else {
            Some(Arc::new(DrawWorker::spawn_named(
                config.worker.thread_name.as_str(),
            )?))
        };
        let executor: Arc<dyn DrawExecutor> = match &worker {
            Some(worker) => Arc::clone(worker) as Arc<dyn DrawExecutor>,
            None => Arc::new(InlineExecutor),
        };

        tracing::info!(
            inline = config.worker.inline,
            capacity = config.scheduler.capacity,
            "animation session started"
        );

        Ok(Self {
            scheduler: Scheduler::with_capacity(executor, config.scheduler.capacity),
            config,
            worker,
        })
    }

    /// Session with the standard configuration
    pub fn standard() -> Result<Self> {
        Self::new(RuntimeConfig::standard())
    }

    /// Session drawing on the ticking thread with the testing configuration
    pub fn inline() -> Self {
        let config = RuntimeConfig::testing();
        init_logging(&config.logging);
        Self {
            scheduler: Scheduler::with_capacity(
                Arc::new(InlineExecutor),
                config.scheduler.capacity,
            ),
            config,
            worker: None,
        }
    }

    /// Create a session from a TOML configuration file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = RuntimeConfig::load(path)?;
        Self::new(config)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn worker(&self) -> Option<&Arc<DrawWorker>> {
        self.worker.as_ref()
    }

    /// Start `animator` from its first step
    pub fn begin(
        &mut self,
        animator: &dyn PathAnimator,
        renderer: &Arc<dyn Renderer>,
    ) -> Result<()> {
        animator.begin_animation(&mut self.scheduler, renderer)?;
        Ok(())
    }

    /// Start `animator`, skipping every step before `start_step`
    pub fn begin_from(
        &mut self,
        animator: &dyn PathAnimator,
        renderer: &Arc<dyn Renderer>,
        start_step: u32,
    ) -> Result<()> {
        animator.begin_animation_from(&mut self.scheduler, renderer, start_step)?;
        Ok(())
    }

    /// Check if any animation is still scheduled
    pub fn is_processing(&self) -> bool {
        self.scheduler.is_processing()
    }

    /// Advance the scheduler by one tick
    ///
    /// With `fail_on_fault` set, the first fault of the tick is returned as
    /// an error; the tick itself has already been applied.
    pub fn tick(&mut self) -> Result<TickReport> {
        let report = self.scheduler.run_tick();
        if self.config.scheduler.fail_on_fault {
            if let Some(fault) = report.faults.first() {
                return Err(RuntimeError::Animation(fault.clone()));
            }
        }
        Ok(report)
    }

    /// Tick until nothing is scheduled, then wait for pending draws
    ///
    /// Returns the number of ticks run.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> Result<u64> {
        let mut ticks = 0;
        while self.scheduler.is_processing() {
            if ticks == max_ticks {
                return Err(RuntimeError::TickLimit(max_ticks));
            }
            self.tick()?;
            ticks += 1;
        }
        self.wait_for_draws();
        tracing::debug!(ticks, "session idle");
        Ok(ticks)
    }

    /// Block until every draw action fired so far has executed
    pub fn wait_for_draws(&self) {
        self.scheduler.executor().wait_idle();
    }

    /// Drain and join the draw worker
    ///
    /// Draws fired afterwards run on the ticking thread.
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
            tracing::info!(worker = %worker.name(), "animation session stopped");
        }
    }
}

#[cfg(feature = "logging")]
fn init_logging(config: &LoggingConfig) {
    if crate::logging::init_tracing(&config.filter) {
        tracing::debug!(filter = %config.filter, "tracing installed");
    }
}

#[cfg(not(feature = "logging"))]
fn init_logging(_config: &LoggingConfig) {}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("scheduler", &self.scheduler)
            .field("worker", &self.worker)
            .finish()
    }
}
