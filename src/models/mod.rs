//! Data models for async test runs
//!
//! This module contains the run outcome types and the self-check probe models.

mod outcome;
mod probe;

pub use outcome::{Outcome, OutcomeKind, RunReport, TeardownReport};
pub use probe::{ProbeCase, ProbeResult, ProbeStatus, ProbeSummary};
