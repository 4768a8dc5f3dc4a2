//! Configuration module
//!
//! Handles loading and managing runner configuration.

mod env;
mod file;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard};
pub use file::ConfigFile;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default grace period for cancellation and shutdown
pub const DEFAULT_GRACE_MS: u64 = 50;

/// Default worker count for the multi-thread flavor
pub const DEFAULT_WORKERS: usize = 2;

/// How a timed-out invocation is reported
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Return `Outcome::TimedOut`
    #[default]
    Report,
    /// Return `Err(RunnerError::TimedOut)`
    Fail,
}

impl TimeoutPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "report" | "outcome" => Some(TimeoutPolicy::Report),
            "fail" | "error" => Some(TimeoutPolicy::Fail),
            _ => None,
        }
    }
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPolicy::Report => write!(f, "report"),
            TimeoutPolicy::Fail => write!(f, "fail"),
        }
    }
}

/// Built-in execution loop flavors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopFlavor {
    /// Single-threaded loop driven by the calling thread
    #[default]
    CurrentThread,
    /// Single-threaded loop with a paused clock that auto-advances when idle
    Paused,
    /// Work-stealing loop with dedicated worker threads
    MultiThread,
}

impl LoopFlavor {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "current-thread" | "current" => Some(LoopFlavor::CurrentThread),
            "paused" => Some(LoopFlavor::Paused),
            "multi-thread" | "multi" => Some(LoopFlavor::MultiThread),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LoopFlavor::CurrentThread => "current-thread",
            LoopFlavor::Paused => "paused",
            LoopFlavor::MultiThread => "multi-thread",
        }
    }
}

impl fmt::Display for LoopFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum wall-clock duration of one invocation (None = unbounded)
    pub timeout_ms: Option<u64>,

    /// Bound on cancellation acknowledgment and on loop shutdown
    pub grace_period_ms: u64,

    /// Extra time the loop keeps running after the invocation finishes
    pub settle_ms: u64,

    pub timeout_policy: TimeoutPolicy,

    pub loop_flavor: LoopFlavor,

    /// Worker threads for the multi-thread flavor
    pub worker_threads: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            grace_period_ms: DEFAULT_GRACE_MS,
            settle_ms: 0,
            timeout_policy: TimeoutPolicy::Report,
            loop_flavor: LoopFlavor::CurrentThread,
            worker_threads: DEFAULT_WORKERS,
        }
    }
}

impl RunnerConfig {
    /// Effective configuration: defaults, then config file, then environment
    pub fn resolve() -> Result<Self> {
        let env = EnvConfig::load();
        let file = match &env.config_file {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::load_default()?,
        };

        let mut config = file.runner;
        env.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Never shorter than one millisecond, even for an unvalidated config
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms.max(1))
    }

    pub fn settle(&self) -> Option<Duration> {
        (self.settle_ms > 0).then(|| Duration::from_millis(self.settle_ms))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.grace_period_ms == 0 {
            anyhow::bail!("grace_period_ms must be greater than zero");
        }

        if self.loop_flavor == LoopFlavor::MultiThread && self.worker_threads == 0 {
            anyhow::bail!("worker_threads must be at least 1 for the multi-thread loop");
        }

        Ok(())
    }
}
