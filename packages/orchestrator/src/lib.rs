#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Backport transaction orchestration for `PatchPort`.
//!
//! Sequences the pipeline: pre-check the baseline, extract the per-file
//! patch set, adapt each file through the configured adapter, apply the
//! adapted contents as one atomic transaction, validate with the test
//! suite, and roll back on failure. After any run terminates, the working
//! tree is either fully the adapted version with tests passing, or
//! byte-identical to its pre-run state.

mod orchestrator;
mod report;

pub use orchestrator::{BackportError, BackportOrchestrator};
pub use report::{BackportReport, BackportRequest, ReportStatus};
