//! The backport state machine.

use std::collections::BTreeMap;
use std::sync::Arc;

use patchport_adapter::{PatchAdapter, PatchAdapterError};
use patchport_adapter_models::PatchContext;
use patchport_extractor::{DiffExtractor, ExtractError};
use patchport_git_backend::GitRepository;
use patchport_transaction::{FileContent, FileTransaction, TransactionError};
use patchport_validation::{ValidationError, ValidationGate};

use crate::report::BackportReport;

/// Terminal failures of a backport request. None are retried.
#[derive(Debug, thiserror::Error)]
pub enum BackportError {
    /// The unmodified repository already fails its test suite.
    #[error("Original codebase has failing tests, cannot proceed. No changes were made")]
    BaselineFailed {
        /// Test output from the failing baseline run.
        output: String,
    },

    /// The commit changed no files matching the extension filter.
    #[error("No matching files found in the patch. No changes were made")]
    NoChangesFound,

    /// The commit reference cannot be resolved in history.
    #[error("Commit reference not found: {reference}. No changes were made")]
    ReferenceNotFound {
        /// The unresolvable reference.
        reference: String,
    },

    /// The adapter failed for one file; the whole request aborts before any
    /// file is touched.
    #[error("Failed to adapt patch for {file_path}: {source}. No changes were made")]
    Adaptation {
        /// File whose adaptation failed.
        file_path: String,
        /// Underlying adapter error.
        source: PatchAdapterError,
    },

    /// The write transaction aborted; the tree is unchanged.
    #[error("Failed to apply patches: {source}. No changes were made")]
    ApplyFailed {
        /// Underlying transaction error.
        source: TransactionError,
    },

    /// The adapted tree failed the test suite; all files were restored.
    #[error("Patched version failed tests. Reverted to original")]
    ValidationFailed {
        /// Test output from the failing post-apply run.
        output: String,
        /// Per-file adapter explanations collected before the failure.
        explanations: BTreeMap<String, String>,
    },

    /// Unexpected fault.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the fault.
        message: String,
    },
}

impl From<ExtractError> for BackportError {
    fn from(error: ExtractError) -> Self {
        match error {
            ExtractError::ReferenceNotFound { reference } => {
                Self::ReferenceNotFound { reference }
            }
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<ValidationError> for BackportError {
    fn from(error: ValidationError) -> Self {
        Self::Internal {
            message: error.to_string(),
        }
    }
}

/// Sequences one backport transaction:
/// `PRECHECK → EXTRACT → ADAPT → APPLY → VALIDATE → {ACCEPTED | ROLLED_BACK}`.
///
/// Only the apply and rollback steps mutate the working tree; everything
/// else is read-only. One request owns the working tree for its whole
/// duration; callers must not run concurrent transactions against the same
/// tree.
pub struct BackportOrchestrator {
    extractor: DiffExtractor,
    adapter: Arc<dyn PatchAdapter>,
    gate: ValidationGate,
}

impl BackportOrchestrator {
    /// Create an orchestrator from its three collaborators.
    #[must_use]
    pub fn new(
        extractor: DiffExtractor,
        adapter: Arc<dyn PatchAdapter>,
        gate: ValidationGate,
    ) -> Self {
        Self {
            extractor,
            adapter,
            gate,
        }
    }

    /// Run one backport transaction against the repository's working tree.
    ///
    /// On success the adapted contents are in place and the test suite
    /// passed. On any error the working tree is byte-identical to its
    /// pre-run state; the error's message says whether files were ever
    /// touched ("no changes were made" vs "reverted to original").
    ///
    /// # Errors
    ///
    /// Returns the first terminal failure encountered; see `BackportError`.
    pub async fn run(
        &self,
        repo: &dyn GitRepository,
        commit_reference: &str,
        target_version: &str,
    ) -> Result<BackportReport, BackportError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| BackportError::Internal {
                message: "Repository has no working directory".to_string(),
            })?
            .to_path_buf();

        // PRECHECK: never attribute pre-existing failures to the backport.
        let baseline = self.gate.run(&workdir).await?;
        if !baseline.passed() {
            log::warn!(
                "Baseline tests failing (status {}), aborting",
                baseline.exit_status
            );
            return Err(BackportError::BaselineFailed {
                output: baseline.output,
            });
        }

        // EXTRACT
        let extraction = self.extractor.extract(repo, commit_reference)?;
        if extraction.is_empty() {
            return Err(BackportError::NoChangesFound);
        }

        // ADAPT: every file must adapt before any file is written.
        let mut adapted: BTreeMap<String, FileContent> = BTreeMap::new();
        let mut explanations: BTreeMap<String, String> = BTreeMap::new();

        for (path, diff) in &extraction.patches {
            let mut context = PatchContext::new(
                path.clone(),
                diff.clone(),
                target_version.to_string(),
            );
            if let Some(FileContent::Text(original)) = extraction.originals.contents().get(path)
            {
                context = context.with_original_content(original.clone());
            }

            log::info!(
                "Adapting {path} for {target_version} via {}",
                self.adapter.adapter_name()
            );

            let patch = self.adapter.adapt(&context).await.map_err(|source| {
                BackportError::Adaptation {
                    file_path: path.clone(),
                    source,
                }
            })?;

            adapted.insert(path.clone(), FileContent::Text(patch.content));
            explanations.insert(path.clone(), patch.explanation);
        }

        // APPLY: all-or-nothing; a failure here leaves the tree unchanged.
        FileTransaction::apply(&workdir, &adapted)
            .map_err(|source| BackportError::ApplyFailed { source })?;

        // VALIDATE: from here on every exit must restore or keep the tree.
        let result = match self.gate.run(&workdir).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("Test runner failed after apply, rolling back: {e}");
                Self::rollback(&workdir, extraction.originals.contents())?;
                return Err(e.into());
            }
        };

        if result.passed() {
            log::info!("Backport accepted for {} file(s)", explanations.len());
            return Ok(BackportReport::accepted(explanations, result.output));
        }

        log::warn!(
            "Post-apply tests failing (status {}), rolling back",
            result.exit_status
        );
        Self::rollback(&workdir, extraction.originals.contents())?;

        Err(BackportError::ValidationFailed {
            output: result.output,
            explanations,
        })
    }

    /// Restore the original contents captured at extraction time, reusing
    /// the transactional apply primitive.
    fn rollback(
        workdir: &std::path::Path,
        originals: &BTreeMap<String, FileContent>,
    ) -> Result<(), BackportError> {
        FileTransaction::apply(workdir, originals).map_err(|source| BackportError::Internal {
            message: format!("Rollback failed: {source}"),
        })
    }
}
