#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Atomic working-tree file transactions for `PatchPort`.
//!
//! This crate provides the all-or-nothing write primitive the backport
//! pipeline relies on: either every file in a change set is written, or the
//! working tree is left byte-identical to its state before the call.

mod apply;
mod snapshot;

pub use apply::FileTransaction;
pub use snapshot::{FileContent, Snapshot};

/// Errors that can occur during a file transaction.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// A path escapes the transaction root (absolute or contains `..`).
    #[error("Path escapes the working tree: {path}")]
    InvalidPath {
        /// The offending repository-relative path.
        path: String,
    },

    /// Failed to read a file while capturing its backup.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// The repository-relative path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The write pass failed and every touched file was restored.
    #[error("Transaction aborted at {path}: {source}")]
    Aborted {
        /// The repository-relative path whose write failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
