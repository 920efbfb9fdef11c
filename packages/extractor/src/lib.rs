#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Per-file patch set extraction for `PatchPort`.
//!
//! Given a commit reference, this crate produces the per-file unified diffs
//! introduced by that commit (restricted to a configured file-type filter)
//! together with a snapshot of the affected files' current content. The
//! snapshot is captured here, at extraction time, because it is the only
//! reliable rollback source: diff text alone cannot reconstruct a file.

mod split;

use std::collections::BTreeMap;

use patchport_git_backend::GitRepository;
use patchport_git_backend_models::GitBackendError;
use patchport_transaction::{Snapshot, TransactionError};

pub use split::split_file_patches;

/// File-extension filter restricting which changed files are extracted.
///
/// Files outside the filter are silently excluded, not errored.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Create a filter matching the given extensions (without dots).
    #[must_use]
    pub const fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Glob pathspecs for the git layer (e.g. `*.py`).
    #[must_use]
    pub fn pathspecs(&self) -> Vec<String> {
        self.extensions.iter().map(|ext| format!("*.{ext}")).collect()
    }
}

impl Default for ExtensionFilter {
    /// Python sources, the original target ecosystem.
    fn default() -> Self {
        Self::new(vec!["py".to_string()])
    }
}

/// Result of extracting a commit's patch set.
#[derive(Debug)]
pub struct Extraction {
    /// Repository-relative path to that file's isolated unified diff.
    ///
    /// Built once per request and never mutated afterwards.
    pub patches: BTreeMap<String, String>,
    /// Full current content of every patched file, captured before any
    /// write. This is the rollback source for the whole request.
    pub originals: Snapshot,
}

impl Extraction {
    /// Whether the commit changed no matching files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

/// Errors that can occur during extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The commit reference cannot be resolved in history.
    #[error("Commit reference not found: {reference}")]
    ReferenceNotFound {
        /// The unresolvable reference.
        reference: String,
    },

    /// The repository has no working directory (bare repository).
    #[error("Repository has no working directory")]
    NoWorkingDirectory,

    /// Git operation failed.
    #[error(transparent)]
    Git(GitBackendError),

    /// Failed to capture the original-content snapshot.
    #[error("Failed to snapshot original content: {0}")]
    Snapshot(#[from] TransactionError),
}

/// Extracts the per-file patch set introduced by a single commit.
#[derive(Debug, Clone, Default)]
pub struct DiffExtractor {
    filter: ExtensionFilter,
}

impl DiffExtractor {
    /// Create an extractor with the given extension filter.
    #[must_use]
    pub const fn new(filter: ExtensionFilter) -> Self {
        Self { filter }
    }

    /// Extract the patch set introduced by `commit_ref` against its parent,
    /// plus the current content of every affected file.
    ///
    /// An empty patch set is a valid result ("no matching files changed");
    /// callers must treat it as a distinct, reportable condition.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::ReferenceNotFound` if the reference cannot be
    /// resolved, `ExtractError::NoWorkingDirectory` for bare repositories,
    /// or an underlying git/snapshot error.
    pub fn extract(
        &self,
        repo: &dyn GitRepository,
        commit_ref: &str,
    ) -> Result<Extraction, ExtractError> {
        let resolved = repo.resolve_ref(commit_ref).map_err(|e| match e {
            GitBackendError::RefNotFound { ref_name } => ExtractError::ReferenceNotFound {
                reference: ref_name,
            },
            other => ExtractError::Git(other),
        })?;

        let commit = repo.get_commit(&resolved.sha).map_err(ExtractError::Git)?;
        log::info!(
            "Extracting patch set for {} ({})",
            commit.short_sha,
            commit.summary
        );

        let diff_text = repo
            .commit_patch_text(&resolved.sha, &self.filter.pathspecs())
            .map_err(ExtractError::Git)?;

        let blocks = split::split_file_patches(&diff_text);
        let patches: BTreeMap<String, String> = blocks.into_iter().collect();

        log::debug!("Extracted {} file patch(es)", patches.len());

        let workdir = repo.workdir().ok_or(ExtractError::NoWorkingDirectory)?;
        let originals = Snapshot::capture(workdir, patches.keys())?;

        Ok(Extraction { patches, originals })
    }
}
