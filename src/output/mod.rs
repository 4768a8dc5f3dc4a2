//! Output formatting module
//!
//! Renders probe results for the terminal or for machines.

mod formatter;

pub use formatter::{OutputFormat, ResultFormatter};
