//! Harness self-check probes
//!
//! Built-in scenarios that exercise the runner on the host machine and the
//! configured loop flavor.
//!
//! ## Probes
//!
//! 1. Immediate Value - invocation returns 42
//! 2. Raised Error - invocation fails with `ValueError("bad")`
//! 3. Slow Invocation - invocation outlives the timeout
//! 4. Nested Children - invocation spawns awaiting children and an orphan
//! 5. Isolation - sequential runs never share tasks
//! 6. Stubborn Invocation - invocation blocks a worker thread (multi-thread only)

mod scenarios;

use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{LoopFlavor, TimeoutPolicy};
use crate::executor::AsyncTestRunner;
use crate::models::{ProbeCase, ProbeResult, ProbeStatus, ProbeSummary};
use crate::utils::Timer;

/// Timeout used by the timing probes unless overridden
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(10);

/// Runs probes through an [`AsyncTestRunner`]
#[derive(Debug, Clone)]
pub struct ProbeRunner {
    runner: AsyncTestRunner,
    timeout: Duration,
}

impl ProbeRunner {
    /// Timed-out probes are checked as outcomes, so the runner always reports them
    pub fn new(runner: AsyncTestRunner) -> Self {
        Self {
            runner: runner.with_timeout_policy(TimeoutPolicy::Report),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn loop_description(&self) -> String {
        self.runner.loop_description()
    }

    /// Run a single probe
    pub fn run_probe(&self, probe: ProbeCase) -> ProbeResult {
        if probe.needs_worker_threads()
            && self.runner.config().loop_flavor != LoopFlavor::MultiThread
        {
            return ProbeResult::skip(probe, "requires the multi-thread loop");
        }

        debug!("Running {}", probe);
        let timer = Timer::start(probe.name());

        let result = match probe {
            ProbeCase::ImmediateValue => scenarios::immediate_value(&self.runner),
            ProbeCase::RaisedError => scenarios::raised_error(&self.runner),
            ProbeCase::SlowInvocation => scenarios::slow_invocation(&self.runner, self.timeout),
            ProbeCase::NestedChildren => scenarios::nested_children(&self.runner),
            ProbeCase::Isolation => scenarios::isolation(&self.runner),
            ProbeCase::StubbornInvocation => {
                scenarios::stubborn_invocation(&self.runner, self.timeout)
            }
        };

        let duration_ms = timer.stop().as_millis() as u64;
        match result {
            Ok(()) => ProbeResult::pass(probe, duration_ms),
            Err(reason) => ProbeResult::fail(probe, duration_ms, reason),
        }
    }

    /// Run the given probes once
    pub fn run_probes(&self, round: u32, probes: &[ProbeCase]) -> ProbeSummary {
        let started_at = Utc::now();
        let results: Vec<ProbeResult> = probes
            .iter()
            .map(|&probe| {
                let result = self.run_probe(probe);
                info!("  {}", result);
                result
            })
            .collect();

        ProbeSummary::new(round, self.loop_description(), started_at, results)
    }

    /// Run the given probes repeatedly to surface order-dependent flakiness
    pub fn run_rounds(&self, rounds: u32, probes: &[ProbeCase]) -> Vec<ProbeSummary> {
        (1..=rounds)
            .map(|round| {
                info!("=== Round {}/{} ===", round, rounds);
                let summary = self.run_probes(round, probes);
                info!(
                    "Round {} completed: {}/{} passed ({:.1}%)",
                    round,
                    summary.passed,
                    summary.total,
                    summary.pass_rate()
                );
                summary
            })
            .collect()
    }
}

/// Per-probe statistics across rounds
#[derive(Clone, Debug, Default)]
pub struct ProbeStats {
    pub passes: u32,
    pub failures: u32,
    pub skips: u32,
    pub total_duration_ms: u64,
}

impl ProbeStats {
    pub fn pass_rate(&self) -> f64 {
        let ran = self.passes + self.failures;
        if ran == 0 {
            0.0
        } else {
            (self.passes as f64 / ran as f64) * 100.0
        }
    }
}

/// Probe results aggregated across rounds
#[derive(Clone, Debug)]
pub struct ProbeAggregate {
    pub total_rounds: u32,
    pub stats: HashMap<ProbeCase, ProbeStats>,
}

impl ProbeAggregate {
    pub fn from_summaries(summaries: &[ProbeSummary]) -> Self {
        let mut stats: HashMap<ProbeCase, ProbeStats> = HashMap::new();

        for result in summaries.iter().flat_map(|s| &s.results) {
            let entry = stats.entry(result.probe).or_default();
            match result.status {
                ProbeStatus::Pass => entry.passes += 1,
                ProbeStatus::Fail => entry.failures += 1,
                ProbeStatus::Skip => entry.skips += 1,
            }
            entry.total_duration_ms += result.duration_ms;
        }

        Self {
            total_rounds: summaries.len() as u32,
            stats,
        }
    }

    /// Probes that both passed and failed across rounds, lowest pass rate first
    pub fn flaky_probes(&self) -> Vec<(ProbeCase, f64)> {
        let mut flaky: Vec<_> = self
            .stats
            .iter()
            .filter(|(_, s)| s.passes > 0 && s.failures > 0)
            .map(|(probe, s)| (*probe, s.pass_rate()))
            .collect();
        flaky.sort_by(|a, b| a.1.total_cmp(&b.1));
        flaky
    }

    pub fn is_all_passed(&self) -> bool {
        self.stats.values().all(|s| s.failures == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;

    fn probe_runner(flavor: LoopFlavor) -> ProbeRunner {
        let config = RunnerConfig {
            loop_flavor: flavor,
            ..Default::default()
        };
        ProbeRunner::new(AsyncTestRunner::new(config))
    }

    #[test]
    fn test_all_probes_pass_on_current_thread() {
        let summary = probe_runner(LoopFlavor::CurrentThread).run_probes(1, &ProbeCase::all());

        assert_eq!(summary.total, 6);
        assert_eq!(summary.skipped, 1, "{summary}");
        assert!(summary.is_all_passed(), "{summary}");
        assert_eq!(summary.flavor, "current-thread");
    }

    #[test]
    fn test_all_probes_pass_on_paused_clock() {
        let summary = probe_runner(LoopFlavor::Paused).run_probes(1, &ProbeCase::all());
        assert!(summary.is_all_passed(), "{summary}");
    }

    #[test]
    fn test_stubborn_probe_on_multi_thread() {
        let result = probe_runner(LoopFlavor::MultiThread).run_probe(ProbeCase::StubbornInvocation);
        assert_eq!(result.status, ProbeStatus::Pass, "{result}");
    }

    #[test]
    fn test_probe_runner_forces_report_policy() {
        let config = RunnerConfig {
            timeout_policy: TimeoutPolicy::Fail,
            ..Default::default()
        };
        let runner = ProbeRunner::new(AsyncTestRunner::new(config));

        let result = runner.run_probe(ProbeCase::SlowInvocation);
        assert_eq!(result.status, ProbeStatus::Pass, "{result}");
    }

    #[test]
    fn test_run_rounds_and_aggregate() {
        let runner = probe_runner(LoopFlavor::CurrentThread);
        let probes = [ProbeCase::ImmediateValue, ProbeCase::RaisedError];
        let summaries = runner.run_rounds(3, &probes);

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[2].round, 3);

        let aggregate = ProbeAggregate::from_summaries(&summaries);
        assert_eq!(aggregate.total_rounds, 3);
        assert_eq!(aggregate.stats[&ProbeCase::RaisedError].passes, 3);
        assert!(aggregate.flaky_probes().is_empty());
        assert!(aggregate.is_all_passed());
    }

    #[test]
    fn test_aggregate_flaky_probes() {
        let started = Utc::now();
        let summaries = vec![
            ProbeSummary::new(
                1,
                "current-thread",
                started,
                vec![ProbeResult::pass(ProbeCase::SlowInvocation, 12)],
            ),
            ProbeSummary::new(
                2,
                "current-thread",
                started,
                vec![ProbeResult::fail(ProbeCase::SlowInvocation, 300, "too slow")],
            ),
        ];

        let aggregate = ProbeAggregate::from_summaries(&summaries);
        assert_eq!(aggregate.flaky_probes(), vec![(ProbeCase::SlowInvocation, 50.0)]);
        assert!(!aggregate.is_all_passed());
    }
}
