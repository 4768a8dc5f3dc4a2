//! Execution loop construction
//!
//! Every run builds its own runtime through a [`LoopFactory`]. Closures of
//! the form `Fn() -> io::Result<Runtime>` are factories too, so tests can
//! plug in any runtime configuration they like.

use std::io;
use tokio::runtime::{Builder, Runtime};

use crate::config::{LoopFlavor, RunnerConfig, DEFAULT_WORKERS};

/// Builds a fresh, isolated execution loop for one run
///
/// Runs with a timeout or settle period need the time driver
/// (`Builder::enable_time`); without it they fail with
/// [`RunnerError::TimerDisabled`](crate::error::RunnerError::TimerDisabled).
pub trait LoopFactory: Send + Sync {
    fn build(&self) -> io::Result<Runtime>;

    /// Short label used in logs and probe summaries
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

impl<F> LoopFactory for F
where
    F: Fn() -> io::Result<Runtime> + Send + Sync,
{
    fn build(&self) -> io::Result<Runtime> {
        self()
    }
}

/// Factory for the built-in [`LoopFlavor`]s
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlavorLoopFactory {
    flavor: LoopFlavor,
    worker_threads: usize,
}

impl FlavorLoopFactory {
    pub fn new(flavor: LoopFlavor) -> Self {
        Self {
            flavor,
            worker_threads: DEFAULT_WORKERS,
        }
    }

    pub fn with_worker_threads(mut self, workers: usize) -> Self {
        self.worker_threads = workers.max(1);
        self
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.loop_flavor).with_worker_threads(config.worker_threads)
    }

    pub fn flavor(&self) -> LoopFlavor {
        self.flavor
    }
}

impl Default for FlavorLoopFactory {
    fn default() -> Self {
        Self::new(LoopFlavor::CurrentThread)
    }
}

impl LoopFactory for FlavorLoopFactory {
    fn build(&self) -> io::Result<Runtime> {
        let mut builder = match self.flavor {
            LoopFlavor::CurrentThread => Builder::new_current_thread(),
            LoopFlavor::Paused => {
                let mut builder = Builder::new_current_thread();
                builder.start_paused(true);
                builder
            }
            LoopFlavor::MultiThread => {
                let mut builder = Builder::new_multi_thread();
                builder.worker_threads(self.worker_threads);
                builder
            }
        };

        builder.enable_all().thread_name("aio-testing-loop").build()
    }

    fn describe(&self) -> String {
        match self.flavor {
            LoopFlavor::MultiThread => format!("multi-thread({})", self.worker_threads),
            flavor => flavor.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::runtime::RuntimeFlavor;

    #[test]
    fn test_current_thread_factory() {
        let runtime = FlavorLoopFactory::default().build().unwrap();
        assert_eq!(runtime.handle().runtime_flavor(), RuntimeFlavor::CurrentThread);
    }

    #[test]
    fn test_multi_thread_factory() {
        let factory = FlavorLoopFactory::new(LoopFlavor::MultiThread).with_worker_threads(3);
        let runtime = factory.build().unwrap();
        assert_eq!(runtime.handle().runtime_flavor(), RuntimeFlavor::MultiThread);
        assert_eq!(runtime.metrics().num_workers(), 3);
        assert_eq!(factory.describe(), "multi-thread(3)");
    }

    #[test]
    fn test_worker_threads_never_zero() {
        let factory = FlavorLoopFactory::new(LoopFlavor::MultiThread).with_worker_threads(0);
        assert_eq!(factory.build().unwrap().metrics().num_workers(), 1);
    }

    #[test]
    fn test_paused_factory_auto_advances() {
        let runtime = FlavorLoopFactory::new(LoopFlavor::Paused).build().unwrap();
        let start = std::time::Instant::now();
        runtime.block_on(async { tokio::time::sleep(std::time::Duration::from_secs(3600)).await });
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_closure_factory() {
        let factory = || Builder::new_current_thread().enable_time().build();
        assert!(factory.build().is_ok());
        assert_eq!(LoopFactory::describe(&factory), "custom");
    }
}
