//! Self-check probe models
//!
//! Defines the built-in probe scenarios, their results and round summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in harness probes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeCase {
    ImmediateValue,
    RaisedError,
    SlowInvocation,
    NestedChildren,
    Isolation,
    StubbornInvocation,
}

impl ProbeCase {
    /// Get probe number (1-6)
    pub fn number(&self) -> u8 {
        match self {
            ProbeCase::ImmediateValue => 1,
            ProbeCase::RaisedError => 2,
            ProbeCase::SlowInvocation => 3,
            ProbeCase::NestedChildren => 4,
            ProbeCase::Isolation => 5,
            ProbeCase::StubbornInvocation => 6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProbeCase::ImmediateValue => "Immediate Value",
            ProbeCase::RaisedError => "Raised Error",
            ProbeCase::SlowInvocation => "Slow Invocation",
            ProbeCase::NestedChildren => "Nested Children",
            ProbeCase::Isolation => "Isolation",
            ProbeCase::StubbornInvocation => "Stubborn Invocation",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProbeCase::ImmediateValue => "Invocation returns 42 and the run reports it as completed",
            ProbeCase::RaisedError => "Invocation fails and the run carries the same error back",
            ProbeCase::SlowInvocation => {
                "Invocation sleeps past the timeout; the run times out and nothing survives"
            }
            ProbeCase::NestedChildren => {
                "Invocation spawns awaiting children; all finish or are cancelled before return"
            }
            ProbeCase::Isolation => "Two sequential runs never observe each other's tasks",
            ProbeCase::StubbornInvocation => {
                "Invocation blocks a worker thread; the run still returns within the grace bound"
            }
        }
    }

    /// Probe only makes sense on a loop with more than one thread
    pub fn needs_worker_threads(&self) -> bool {
        matches!(self, ProbeCase::StubbornInvocation)
    }

    pub fn all() -> Vec<ProbeCase> {
        vec![
            ProbeCase::ImmediateValue,
            ProbeCase::RaisedError,
            ProbeCase::SlowInvocation,
            ProbeCase::NestedChildren,
            ProbeCase::Isolation,
            ProbeCase::StubbornInvocation,
        ]
    }

    pub fn from_number(n: u8) -> Option<ProbeCase> {
        Self::all().into_iter().find(|p| p.number() == n)
    }
}

impl fmt::Display for ProbeCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Probe {}: {}", self.number(), self.name())
    }
}

/// Probe execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Pass,
    Fail,
    Skip,
}

impl ProbeStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            ProbeStatus::Pass => "✓",
            ProbeStatus::Fail => "✗",
            ProbeStatus::Skip => "○",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Pass => write!(f, "PASS"),
            ProbeStatus::Fail => write!(f, "FAIL"),
            ProbeStatus::Skip => write!(f, "SKIP"),
        }
    }
}

/// Result of a single probe
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeResult {
    pub probe: ProbeCase,
    pub status: ProbeStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl ProbeResult {
    pub fn pass(probe: ProbeCase, duration_ms: u64) -> Self {
        Self {
            probe,
            status: ProbeStatus::Pass,
            duration_ms,
            message: None,
        }
    }

    pub fn fail(probe: ProbeCase, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            probe,
            status: ProbeStatus::Fail,
            duration_ms,
            message: Some(message.into()),
        }
    }

    pub fn skip(probe: ProbeCase, reason: impl Into<String>) -> Self {
        Self {
            probe,
            status: ProbeStatus::Skip,
            duration_ms: 0,
            message: Some(reason.into()),
        }
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.probe,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one probe round
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeSummary {
    pub round: u32,
    /// Loop flavor the probes ran on
    pub flavor: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_duration_ms: u64,
    pub results: Vec<ProbeResult>,
}

impl ProbeSummary {
    pub fn new(
        round: u32,
        flavor: impl Into<String>,
        started_at: DateTime<Utc>,
        results: Vec<ProbeResult>,
    ) -> Self {
        let count = |status: ProbeStatus| results.iter().filter(|r| r.status == status).count();
        let passed = count(ProbeStatus::Pass);
        let failed = count(ProbeStatus::Fail);
        let skipped = count(ProbeStatus::Skip);

        Self {
            round,
            flavor: flavor.into(),
            started_at,
            total: results.len(),
            passed,
            failed,
            skipped,
            total_duration_ms: results.iter().map(|r| r.duration_ms).sum(),
            results,
        }
    }

    /// Pass rate over the probes that actually ran
    pub fn pass_rate(&self) -> f64 {
        let ran = self.total - self.skipped;
        if ran == 0 {
            0.0
        } else {
            (self.passed as f64 / ran as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for ProbeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Round {} - {} loop", self.round, self.flavor)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {}",
            self.total, self.passed, self.failed, self.skipped
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_numbers() {
        assert_eq!(ProbeCase::ImmediateValue.number(), 1);
        assert_eq!(ProbeCase::StubbornInvocation.number(), 6);
    }

    #[test]
    fn test_probe_from_number() {
        assert_eq!(ProbeCase::from_number(3), Some(ProbeCase::SlowInvocation));
        assert_eq!(ProbeCase::from_number(7), None);
    }

    #[test]
    fn test_probe_summary() {
        let results = vec![
            ProbeResult::pass(ProbeCase::ImmediateValue, 1),
            ProbeResult::fail(ProbeCase::SlowInvocation, 60, "still running"),
            ProbeResult::skip(ProbeCase::StubbornInvocation, "current-thread loop"),
        ];

        let summary = ProbeSummary::new(1, "current-thread", Utc::now(), results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.pass_rate(), 50.0);
        assert!(!summary.is_all_passed());
    }

    #[test]
    fn test_probe_result_display() {
        let result = ProbeResult::fail(ProbeCase::RaisedError, 3, "wrong error");
        assert_eq!(
            result.to_string(),
            "✗ Probe 2: Raised Error [3ms] - wrong error"
        );
    }
}
