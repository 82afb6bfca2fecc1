//! # Hapflow
//!
//! A haplotype-aware, two-round variant calling orchestrator.
//!
//! Hapflow turns a read alignment and a reference sequence into a phased,
//! diploid variant call file by sequencing external tools through a
//! staged, resumable pipeline:
//!
//! - **Round 0**: mixed-sample consensus, SNP discovery, phasing, and
//!   haplotagging of the alignment
//! - **Round 1**: per-haplotype consensus and variant calling, run as
//!   independent branches of a dependency graph
//! - **Merge and finalization**: diploid merge, provenance injection,
//!   soft quality filtering, and phase/unphase selection
//!
//! Every stage is gated on artifact presence: rerunning against a
//! populated output directory skips completed work, which is the whole
//! recovery story after a failure.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hapflow::prelude::*;
//!
//! let config = Cli::parse().into_config();
//! config.validate()?;
//!
//! let driver = Driver::new(config, command_line);
//! let outcome = driver.run().await?;
//! println!("final calls: {}", outcome.final_vcf.display());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod artifact;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod errors;
pub mod executor;
pub mod pipeline;
pub mod stage;
pub mod tools;
pub mod vcf;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::artifact::{Artifact, HaplotypeLabel, RunPaths};
    pub use crate::cli::Cli;
    pub use crate::config::RunConfig;
    pub use crate::errors::{HapflowError, Result};
    pub use crate::executor::StageExecutor;
    pub use crate::pipeline::{
        Driver, GraphReport, OutcomeBranch, PipelineOutcome, StageGraph,
    };
    pub use crate::stage::{StageOutcome, StageSpec, StageStatus};
    pub use crate::tools::ToolCommand;
}
