//! Runtime configuration
//!
//! Sessions are configured from a TOML file with three tables:
//!
//! ```toml
//! [worker]
//! thread_name = "apel-draw"
//! inline = false
//!
//! [scheduler]
//! capacity = 64
//! fail_on_fault = false
//!
//! [logging]
//! filter = "info"
//! ```
//!
//! Every field is optional and falls back to the [`RuntimeConfig::standard`]
//! preset.

use crate::error::{Result, RuntimeError};
use anyhow::Context;
use apel_animation::DEFAULT_WORKER_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for a [`Session`](crate::Session)
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where fired draw actions run
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Name of the background draw thread
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
    /// Run draw actions on the ticking thread instead of a worker
    #[serde(default)]
    pub inline: bool,
}

fn default_thread_name() -> String {
    DEFAULT_WORKER_NAME.to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            inline: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Expected number of concurrently active animators
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Turn a tick with faults into an error instead of logging it
    #[serde(default)]
    pub fail_on_fault: bool,
}

fn default_capacity() -> usize {
    64
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            fail_on_fault: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter installed by the session; `RUST_LOG` takes
    /// precedence
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl RuntimeConfig {
    /// Background worker, faults logged
    pub fn standard() -> Self {
        Self::default()
    }

    /// Inline draws and fail-fast ticks for deterministic test runs
    pub fn testing() -> Self {
        Self {
            worker: WorkerConfig {
                inline: true,
                ..WorkerConfig::default()
            },
            scheduler: SchedulerConfig {
                capacity: 16,
                fail_on_fault: true,
            },
            logging: LoggingConfig {
                filter: "debug".to_string(),
            },
        }
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker.thread_name = name.into();
        self
    }

    pub fn with_inline_draws(mut self, inline: bool) -> Self {
        self.worker.inline = inline;
        self
    }

    pub fn with_fail_on_fault(mut self, fail: bool) -> Self {
        self.scheduler.fail_on_fault = fail;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.logging.filter = filter.into();
        self
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if !self.worker.inline && self.worker.thread_name.trim().is_empty() {
            return Err(RuntimeError::Config(
                "worker.thread_name must not be empty".to_string(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(RuntimeError::Config(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RuntimeConfig =
            toml::from_str(content).map_err(|e| RuntimeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize runtime config")
    }

    /// Write the configuration to `path` as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }
}
