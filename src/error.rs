//! Error types
//!
//! Errors raised by the runner itself, as opposed to errors raised by the
//! invocation under test (those travel inside [`Outcome::Failed`]).
//!
//! [`Outcome::Failed`]: crate::models::Outcome::Failed

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that prevent a run from producing an outcome
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to construct execution loop: {0}")]
    LoopConstruction(#[source] io::Error),

    /// Also returned on `spawn_blocking` threads, which carry a runtime handle
    #[error("Cannot start an execution loop from inside an active one")]
    NestedLoop,

    #[error("Execution loop has no timer; build it with `enable_time` to use a timeout or settle period")]
    TimerDisabled,

    #[error("Invocation timed out after {0:?}")]
    TimedOut(Duration),
}

/// Problems hit while tearing an execution loop down
///
/// These never replace the run's outcome; they are logged and collected in
/// the [`TeardownReport`](crate::models::TeardownReport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TeardownError {
    #[error("Invocation did not acknowledge cancellation within {grace:?}; abandoned")]
    CancellationIgnored { grace: Duration },

    #[error("Loop shutdown exceeded {grace:?} grace period ({leftover_tasks} task(s) alive)")]
    ShutdownExceededGrace {
        grace: Duration,
        leftover_tasks: usize,
    },
}

/// Non-completed outcome converted into an error, for use with `?`
#[derive(Error, Debug)]
pub enum RunFailure<E> {
    #[error("Invocation failed: {0}")]
    Failed(E),

    #[error("Invocation timed out after {0:?}")]
    TimedOut(Duration),
}

impl<E> RunFailure<E> {
    /// The invocation's own error, if that is what this failure carries
    pub fn into_error(self) -> Option<E> {
        match self {
            RunFailure::Failed(e) => Some(e),
            RunFailure::TimedOut(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_error_display() {
        let err = TeardownError::ShutdownExceededGrace {
            grace: Duration::from_millis(50),
            leftover_tasks: 2,
        };
        assert_eq!(
            err.to_string(),
            "Loop shutdown exceeded 50ms grace period (2 task(s) alive)"
        );
    }

    #[test]
    fn test_run_failure_into_error() {
        let failure: RunFailure<String> = RunFailure::Failed("bad".to_string());
        assert_eq!(failure.to_string(), "Invocation failed: bad");
        assert_eq!(failure.into_error(), Some("bad".to_string()));

        let timed_out: RunFailure<String> = RunFailure::TimedOut(Duration::from_millis(10));
        assert!(timed_out.into_error().is_none());
    }
}
