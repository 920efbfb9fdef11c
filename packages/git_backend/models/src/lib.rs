#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Git backend models for `PatchPort`.
//!
//! This crate defines the data types returned by git backend operations,
//! abstracting over the specific git implementation (git2, CLI, etc.).

use serde::{Deserialize, Serialize};

/// Git commit information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full SHA of the commit.
    pub sha: String,
    /// Short SHA (first 7 characters).
    pub short_sha: String,
    /// First line of the commit message.
    pub summary: String,
    /// Parent commit SHAs.
    pub parent_shas: Vec<String>,
}

/// Result of resolving a git reference.
#[derive(Debug, Clone)]
pub struct ResolvedRef {
    /// The resolved commit SHA.
    pub sha: String,
    /// The original ref name.
    pub name: String,
    /// Type of the reference.
    pub ref_type: RefType,
}

/// Type of a git reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    /// Local branch.
    Branch,
    /// Tag.
    Tag,
    /// Direct commit SHA.
    Commit,
    /// HEAD reference.
    Head,
    /// Remote tracking branch.
    Remote,
}

/// Errors from git backend operations.
#[derive(Debug, thiserror::Error)]
pub enum GitBackendError {
    /// Repository not found at the specified path.
    #[error("Repository not found at {path}")]
    RepoNotFound {
        /// The path that was searched.
        path: String,
    },

    /// Reference (branch, tag, commit) not found.
    #[error("Ref not found: {ref_name}")]
    RefNotFound {
        /// The reference name that wasn't found.
        ref_name: String,
    },

    /// Commit not found.
    #[error("Commit not found: {sha}")]
    CommitNotFound {
        /// The SHA that wasn't found.
        sha: String,
    },

    /// Path is not a git repository.
    #[error("Not a git repository: {path}")]
    NotARepository {
        /// The path that isn't a repository.
        path: String,
    },

    /// Repository has no working directory (bare repository).
    #[error("Repository at {path} has no working directory")]
    NoWorkingDirectory {
        /// The repository path.
        path: String,
    },

    /// General git operation error.
    #[error("Git operation failed: {message}")]
    GitError {
        /// Error message from the underlying git implementation.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {message}")]
    IoError {
        /// Error message.
        message: String,
    },
}

impl From<std::io::Error> for GitBackendError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
        }
    }
}
