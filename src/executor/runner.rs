//! Async test runner
//!
//! Runs one asynchronous invocation on its own execution loop, enforces the
//! timeout, and tears the loop down before handing control back.
//!
//! One call is one full lifecycle:
//!
//! 1. build a fresh runtime through the configured [`LoopFactory`]
//! 2. spawn the invocation as the only top-level task
//! 3. drive it until it finishes or the timeout elapses; on timeout abort it
//!    and wait at most the grace period for the abort to land
//! 4. optionally keep the loop alive for the settle period
//! 5. shut the runtime down, cancelling everything still alive and waiting
//!    at most the grace period for worker threads
//!
//! A panic inside the invocation is resumed on the caller's thread after
//! step 5.
//!
//! A run is refused with [`RunnerError::NestedLoop`] on any thread that can
//! see a tokio runtime handle. That includes `spawn_blocking` threads, even
//! though blocking is allowed there; call from a plain `std::thread` to run
//! from inside another runtime.

use std::fmt;
use std::future::Future;
use std::panic;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::{JoinError, JoinHandle};
use tokio::time;
use tracing::{debug, info, warn};

use super::loop_factory::{FlavorLoopFactory, LoopFactory};
use crate::config::{RunnerConfig, TimeoutPolicy};
use crate::error::{RunnerError, TeardownError};
use crate::models::{Outcome, RunReport, TeardownReport};
use crate::utils::Stopwatch;

/// Runner for async test invocations
#[derive(Clone)]
pub struct AsyncTestRunner {
    config: RunnerConfig,
    factory: Arc<dyn LoopFactory>,
}

/// How the drive phase ended
enum Driven<T, E> {
    Finished(Result<Result<T, E>, JoinError>),
    TimedOut { after: Duration, acknowledged: bool },
}

impl AsyncTestRunner {
    /// Create a runner whose loops are built from the configured flavor
    pub fn new(config: RunnerConfig) -> Self {
        let factory = Arc::new(FlavorLoopFactory::from_config(&config));
        Self { config, factory }
    }

    /// Create a runner from the config file and `AIO_TESTING_*` variables
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(RunnerConfig::resolve()?))
    }

    /// Override how the execution loop is constructed
    pub fn with_loop_factory(mut self, factory: impl LoopFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = Some(millis_ceil(timeout));
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.config.timeout_policy = policy;
        self
    }

    /// The grace period is at least one millisecond
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.config.grace_period_ms = millis_ceil(grace).max(1);
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.config.settle_ms = millis_ceil(settle);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Label of the loop factory in use
    pub fn loop_description(&self) -> String {
        self.factory.describe()
    }

    /// Run an invocation with the configured timeout
    pub fn run<F, Fut, T, E>(&self, invocation: F) -> Result<Outcome<T, E>, RunnerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.run_with_timeout(invocation, self.config.timeout())
    }

    /// Run an invocation with an explicit timeout (`None` = unbounded)
    pub fn run_with_timeout<F, Fut, T, E>(
        &self,
        invocation: F,
        timeout: Option<Duration>,
    ) -> Result<Outcome<T, E>, RunnerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.run_detailed(invocation, timeout)
            .map(|report| report.outcome)
    }

    /// Run an invocation and return the outcome with timing and teardown details
    pub fn run_detailed<F, Fut, T, E>(
        &self,
        invocation: F,
        timeout: Option<Duration>,
    ) -> Result<RunReport<T, E>, RunnerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        // Building or dropping a runtime inside another one panics in tokio.
        if Handle::try_current().is_ok() {
            return Err(RunnerError::NestedLoop);
        }

        let grace = self.config.grace_period();
        let settle = self.config.settle();
        let mut stopwatch = Stopwatch::new();

        let runtime = self
            .factory
            .build()
            .map_err(RunnerError::LoopConstruction)?;
        if (timeout.is_some() || settle.is_some()) && !has_timer(&runtime) {
            return Err(RunnerError::TimerDisabled);
        }
        stopwatch.lap("construct");
        debug!(
            "Execution loop {} ready (timeout: {:?}, grace: {:?})",
            self.factory.describe(),
            timeout,
            grace
        );

        let handle = {
            let _enter = runtime.enter();
            runtime.spawn(invocation())
        };

        let driven = runtime.block_on(drive(handle, timeout, grace, settle));
        stopwatch.lap("drive");

        let leftover_tasks = runtime.metrics().num_alive_tasks();
        let mut teardown = TeardownReport {
            leftover_tasks,
            ..Default::default()
        };
        if let Driven::TimedOut {
            acknowledged: false,
            ..
        } = driven
        {
            teardown
                .errors
                .push(TeardownError::CancellationIgnored { grace });
        }
        if leftover_tasks > 0 {
            debug!("Cancelling {} leftover task(s)", leftover_tasks);
        }

        runtime.shutdown_timeout(grace);
        stopwatch.lap("teardown");
        teardown.duration = stopwatch.lap_time("teardown").unwrap_or_default();
        if teardown.duration >= grace {
            teardown.errors.push(TeardownError::ShutdownExceededGrace {
                grace,
                leftover_tasks,
            });
        }
        for error in &teardown.errors {
            warn!("Teardown: {}", error);
        }
        debug!("Run phases: {}", stopwatch.format());

        let outcome = match driven {
            Driven::Finished(Ok(Ok(value))) => Outcome::Completed(value),
            Driven::Finished(Ok(Err(error))) => Outcome::Failed(error),
            // The handle is only aborted on timeout, so a join error here is a panic.
            Driven::Finished(Err(join_error)) => {
                info!("Invocation panicked; resuming panic after teardown");
                match join_error.try_into_panic() {
                    Ok(payload) => panic::resume_unwind(payload),
                    Err(join_error) => panic::resume_unwind(Box::new(join_error.to_string())),
                }
            }
            Driven::TimedOut { after, .. } => Outcome::TimedOut { after },
        };

        info!(
            "Invocation {} in {}ms",
            outcome.kind(),
            stopwatch.total().as_millis()
        );

        if let (Outcome::TimedOut { after }, TimeoutPolicy::Fail) =
            (&outcome, self.config.timeout_policy)
        {
            return Err(RunnerError::TimedOut(*after));
        }

        Ok(RunReport {
            outcome,
            elapsed: stopwatch.total(),
            teardown,
        })
    }
}

impl Default for AsyncTestRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl fmt::Debug for AsyncTestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTestRunner")
            .field("config", &self.config)
            .field("loop", &self.factory.describe())
            .finish()
    }
}

/// Whole milliseconds, rounded up and saturating
fn millis_ceil(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

/// Whether the runtime was built with its time driver enabled
///
/// Tokio panics when a timer is created without one.
fn has_timer(runtime: &Runtime) -> bool {
    let _enter = runtime.enter();
    panic::catch_unwind(|| drop(time::sleep(Duration::ZERO))).is_ok()
}

async fn drive<T, E>(
    mut handle: JoinHandle<Result<T, E>>,
    timeout: Option<Duration>,
    grace: Duration,
    settle: Option<Duration>,
) -> Driven<T, E> {
    let joined = match timeout {
        None => (&mut handle).await,
        Some(after) => match time::timeout(after, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                debug!("Timeout of {:?} elapsed, cancelling invocation", after);
                handle.abort();
                let acknowledged = time::timeout(grace, &mut handle).await.is_ok();
                return Driven::TimedOut {
                    after,
                    acknowledged,
                };
            }
        },
    };

    if let Some(settle) = settle {
        debug!("Settling loop for {:?}", settle);
        time::sleep(settle).await;
    }

    Driven::Finished(joined)
}

/// Run an invocation on a fresh default runner, without a timeout
pub fn run<F, Fut, T, E>(invocation: F) -> Result<Outcome<T, E>, RunnerError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    AsyncTestRunner::default().run(invocation)
}

/// Run an invocation on a fresh default runner, bounded by `timeout`
pub fn run_with_timeout<F, Fut, T, E>(
    invocation: F,
    timeout: Duration,
) -> Result<Outcome<T, E>, RunnerError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    AsyncTestRunner::default().run_with_timeout(invocation, Some(timeout))
}
