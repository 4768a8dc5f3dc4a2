//! Run outcome models
//!
//! Defines the tri-state outcome of one run and the report built around it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{RunFailure, TeardownError};

/// Result of driving one invocation to an end
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The invocation returned `Ok(value)`
    Completed(T),
    /// The invocation returned `Err(error)`
    Failed(E),
    /// The invocation was still running when the timeout elapsed
    TimedOut { after: Duration },
}

impl<T, E> Outcome<T, E> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut { .. })
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Completed(_) => OutcomeKind::Completed,
            Outcome::Failed(_) => OutcomeKind::Failed,
            Outcome::TimedOut { .. } => OutcomeKind::TimedOut,
        }
    }

    /// Completed value, if any
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// Invocation error, if any
    pub fn failed(self) -> Option<E> {
        match self {
            Outcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Map the completed value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U, E> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Failed(error) => Outcome::Failed(error),
            Outcome::TimedOut { after } => Outcome::TimedOut { after },
        }
    }

    /// Convert into a `Result` so a test body can use `?`
    pub fn into_result(self) -> Result<T, RunFailure<E>> {
        match self {
            Outcome::Completed(value) => Ok(value),
            Outcome::Failed(error) => Err(RunFailure::Failed(error)),
            Outcome::TimedOut { after } => Err(RunFailure::TimedOut(after)),
        }
    }
}

/// Outcome without its payload, for logs and reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Completed,
    Failed,
    TimedOut,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Completed => write!(f, "completed"),
            OutcomeKind::Failed => write!(f, "failed"),
            OutcomeKind::TimedOut => write!(f, "timed out"),
        }
    }
}

/// What happened while closing the execution loop
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Tasks still alive when teardown began (all of them get cancelled)
    pub leftover_tasks: usize,
    /// Time spent shutting the loop down
    pub duration: Duration,
    pub errors: Vec<TeardownError>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Full record of one run
#[derive(Debug)]
pub struct RunReport<T, E> {
    pub outcome: Outcome<T, E>,
    /// Wall-clock time from loop construction to the end of teardown
    pub elapsed: Duration,
    pub teardown: TeardownReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_kind() {
        let completed: Outcome<u32, String> = Outcome::Completed(42);
        assert!(completed.is_completed());
        assert_eq!(completed.kind(), OutcomeKind::Completed);

        let timed_out: Outcome<u32, String> = Outcome::TimedOut {
            after: Duration::from_millis(10),
        };
        assert!(timed_out.is_timed_out());
        assert_eq!(timed_out.kind().to_string(), "timed out");
    }

    #[test]
    fn test_outcome_into_result() {
        let completed: Outcome<u32, String> = Outcome::Completed(42);
        assert_eq!(completed.into_result().ok(), Some(42));

        let failed: Outcome<u32, String> = Outcome::Failed("bad".to_string());
        match failed.into_result() {
            Err(RunFailure::Failed(e)) => assert_eq!(e, "bad"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_outcome_map_keeps_failure() {
        let failed: Outcome<u32, &str> = Outcome::Failed("bad");
        assert_eq!(failed.map(|v| v * 2), Outcome::Failed("bad"));

        let completed: Outcome<u32, &str> = Outcome::Completed(21);
        assert_eq!(completed.map(|v| v * 2).completed(), Some(42));
    }

    #[test]
    fn test_teardown_report_clean() {
        let mut report = TeardownReport::default();
        assert!(report.is_clean());

        report.errors.push(TeardownError::CancellationIgnored {
            grace: Duration::from_millis(50),
        });
        assert!(!report.is_clean());
    }
}
