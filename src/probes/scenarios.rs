//! Probe scenario bodies
//!
//! Each scenario drives the runner once or twice and checks one property of
//! the harness. A scenario returns `Err(reason)` when the property does not
//! hold.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::time;

use crate::error::TeardownError;
use crate::executor::AsyncTestRunner;
use crate::models::Outcome;

/// Slack added on top of computed upper bounds, for slow CI machines
const TIMING_SLACK: Duration = Duration::from_millis(100);

#[derive(Debug, PartialEq, Eq)]
struct ValueError(String);

/// Sets its flag when dropped
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn new_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

/// `base + grace * grace_multiple + TIMING_SLACK`, saturating
fn bounded(base: Duration, grace: Duration, grace_multiple: u32) -> Duration {
    base.saturating_add(grace.saturating_mul(grace_multiple))
        .saturating_add(TIMING_SLACK)
}

pub(super) fn immediate_value(runner: &AsyncTestRunner) -> Result<(), String> {
    let outcome = runner
        .run(|| async { Ok::<_, Infallible>(42) })
        .map_err(|e| e.to_string())?;

    match outcome {
        Outcome::Completed(42) => Ok(()),
        other => Err(format!("expected Completed(42), got {other:?}")),
    }
}

pub(super) fn raised_error(runner: &AsyncTestRunner) -> Result<(), String> {
    let outcome = runner
        .run(|| async { Err::<(), _>(ValueError("bad".to_string())) })
        .map_err(|e| e.to_string())?;

    match outcome {
        Outcome::Failed(ValueError(msg)) if msg == "bad" => Ok(()),
        other => Err(format!("expected Failed(ValueError(\"bad\")), got {other:?}")),
    }
}

pub(super) fn slow_invocation(runner: &AsyncTestRunner, timeout: Duration) -> Result<(), String> {
    let dropped = new_flag();
    let guard = dropped.clone();

    let report = runner
        .run_detailed(
            move || async move {
                let _guard = DropFlag(guard);
                time::sleep(timeout.saturating_mul(100)).await;
                Ok::<_, Infallible>(())
            },
            Some(timeout),
        )
        .map_err(|e| e.to_string())?;

    if !report.outcome.is_timed_out() {
        return Err(format!("expected TimedOut, got {:?}", report.outcome));
    }
    if !dropped.load(Ordering::SeqCst) {
        return Err("invocation still alive after run returned".to_string());
    }

    let bound = bounded(timeout, runner.config().grace_period(), 2);
    if report.elapsed > bound {
        return Err(format!(
            "run took {}ms, bound was {}ms",
            report.elapsed.as_millis(),
            bound.as_millis()
        ));
    }
    Ok(())
}

pub(super) fn nested_children(runner: &AsyncTestRunner) -> Result<(), String> {
    let orphan_dropped = new_flag();
    let orphan = orphan_dropped.clone();

    let outcome = runner
        .run(move || async move {
            let children = (0..3u64).map(|i| {
                tokio::spawn(async move {
                    time::sleep(Duration::from_millis(i + 1)).await;
                    i
                })
            });
            let finished = join_all(children)
                .await
                .into_iter()
                .filter(|r| r.is_ok())
                .count();

            tokio::spawn(async move {
                let _guard = DropFlag(orphan);
                time::sleep(Duration::from_secs(3600)).await;
            });

            Ok::<_, Infallible>(finished)
        })
        .map_err(|e| e.to_string())?;

    if outcome != Outcome::Completed(3) {
        return Err(format!("expected Completed(3), got {outcome:?}"));
    }
    if !orphan_dropped.load(Ordering::SeqCst) {
        return Err("orphaned child survived the run".to_string());
    }
    Ok(())
}

pub(super) fn isolation(runner: &AsyncTestRunner) -> Result<(), String> {
    let progressed = new_flag();
    let marker = progressed.clone();

    runner
        .run(move || async move {
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(5)).await;
                marker.store(true, Ordering::SeqCst);
            });
            Ok::<_, Infallible>(())
        })
        .map_err(|e| e.to_string())?;
    // A settle period may legitimately let the child finish inside the first run.
    let progressed_during_first = progressed.load(Ordering::SeqCst);

    let outcome = runner
        .run(|| async {
            time::sleep(Duration::from_millis(10)).await;
            Ok::<_, Infallible>(Handle::current().metrics().num_alive_tasks())
        })
        .map_err(|e| e.to_string())?;

    if !progressed_during_first && progressed.load(Ordering::SeqCst) {
        return Err("task from the first run kept running".to_string());
    }
    match outcome {
        Outcome::Completed(1) => Ok(()),
        other => Err(format!("second run saw foreign tasks: {other:?}")),
    }
}

pub(super) fn stubborn_invocation(
    runner: &AsyncTestRunner,
    timeout: Duration,
) -> Result<(), String> {
    let grace = runner.config().grace_period();
    let blocked_for = bounded(timeout, grace, 3);

    let report = runner
        .run_detailed(
            move || async move {
                std::thread::sleep(blocked_for);
                Ok::<_, Infallible>(())
            },
            Some(timeout),
        )
        .map_err(|e| e.to_string())?;

    if !report.outcome.is_timed_out() {
        return Err(format!("expected TimedOut, got {:?}", report.outcome));
    }
    let abandoned = report
        .teardown
        .errors
        .iter()
        .any(|e| matches!(e, TeardownError::CancellationIgnored { .. }));
    if !abandoned {
        return Err("stubborn invocation was not reported as abandoned".to_string());
    }
    if report.elapsed >= blocked_for {
        return Err(format!(
            "run waited {}ms for a blocked worker",
            report.elapsed.as_millis()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_adds_grace_and_slack() {
        let bound = bounded(Duration::from_millis(10), Duration::from_millis(50), 2);
        assert_eq!(bound, Duration::from_millis(10 + 100) + TIMING_SLACK);
    }

    #[test]
    fn test_bounded_saturates_on_huge_inputs() {
        assert_eq!(bounded(Duration::MAX, Duration::from_millis(50), 3), Duration::MAX);
        assert_eq!(bounded(Duration::from_millis(10), Duration::MAX, 2), Duration::MAX);
    }
}
