//! Worker execution side of the pool.
//!
//! A [`Worker`] runs exactly one task at a time: it reports a start
//! notification to its owning controller, runs the task through the
//! pluggable [`WorkExecutor`], and reports completion with the measured
//! elapsed time. It never initiates communication except in response to a
//! start instruction.

pub mod executor;
pub mod runner;

pub use executor::{DelayExecutor, WorkExecutor};
pub use runner::Worker;
