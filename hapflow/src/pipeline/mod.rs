//! Pipeline construction and execution.
//!
//! This module provides:
//! - The dependency-graph execution engine
//! - The round-0 and round-1 sub-pipelines
//! - The top-level driver and its terminal outcome

mod driver;
pub mod graph;
pub mod round0;
pub mod round1;

#[cfg(test)]
mod integration_tests;

pub use driver::{Driver, OutcomeBranch, PipelineOutcome};
pub use graph::{GraphReport, StageGraph};
