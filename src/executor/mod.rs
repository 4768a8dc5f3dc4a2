//! Test execution engine
//!
//! Runs async invocations on isolated, per-call execution loops.

mod loop_factory;
mod runner;

pub use loop_factory::{FlavorLoopFactory, LoopFactory};
pub use runner::{run, run_with_timeout, AsyncTestRunner};
