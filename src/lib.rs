//! aio-testing - async testing utilities
//!
//! Runs one asynchronous test invocation on a freshly built, isolated
//! execution loop, enforces an optional timeout with cooperative
//! cancellation, and tears the loop down before returning, whatever the
//! outcome.
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use aio_testing::{AsyncTestRunner, Outcome};
//!
//! let runner = AsyncTestRunner::default().with_timeout(Duration::from_millis(500));
//! let outcome = runner
//!     .run(|| async {
//!         tokio::time::sleep(Duration::from_millis(5)).await;
//!         Ok::<_, std::io::Error>(42)
//!     })
//!     .unwrap();
//! assert_eq!(outcome.completed(), Some(42));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod output;
pub mod probes;
pub mod utils;

pub use config::{LoopFlavor, RunnerConfig, TimeoutPolicy};
pub use error::{RunFailure, RunnerError, TeardownError};
pub use executor::{run, run_with_timeout, AsyncTestRunner, FlavorLoopFactory, LoopFactory};
pub use models::{Outcome, OutcomeKind, RunReport, TeardownReport};
