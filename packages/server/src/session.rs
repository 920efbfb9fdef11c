//! Working-copy session preparation.
//!
//! The version-control collaborator supplies a working copy checked out at
//! the requested target version. Clone mechanics stay external: a session
//! only opens an existing working copy and moves it to the target branch
//! or tag.

use std::path::Path;

use patchport_git_backend::{GitBackend, GitBackendError, GitRepository, RefType};
use patchport_git_backend_git2::Git2Backend;

/// Errors preparing a working-copy session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No working copy exists for the repository.
    #[error("No working copy at {path}; provision a checkout first")]
    WorkspaceMissing {
        /// Expected working-copy path.
        path: String,
    },

    /// The working-copy directory is not a git repository.
    #[error("Not a git repository: {path}")]
    NotARepository {
        /// The offending path.
        path: String,
    },

    /// The target version is neither a known branch nor a tag.
    #[error("Target version '{target_version}' is neither a known branch nor a tag")]
    UnknownTargetVersion {
        /// The requested target version.
        target_version: String,
    },

    /// The working tree has uncommitted changes.
    #[error("Working tree at {path} has uncommitted changes; refusing to run")]
    DirtyWorkingTree {
        /// The working-copy path.
        path: String,
    },

    /// Underlying git failure.
    #[error(transparent)]
    Git(#[from] GitBackendError),
}

/// Open the working copy at `workdir` and check it out at `target_version`.
///
/// The returned repository owns the working tree for the duration of the
/// request; callers must hold the tree's advisory lock while using it.
///
/// # Errors
///
/// See `SessionError`; notably the target version must resolve to a local
/// branch or tag, matching the original service's contract.
pub fn prepare(
    workdir: &Path,
    target_version: &str,
) -> Result<Box<dyn GitRepository>, SessionError> {
    if !workdir.is_dir() {
        return Err(SessionError::WorkspaceMissing {
            path: workdir.display().to_string(),
        });
    }

    let repo = Git2Backend::new()
        .open(workdir)
        .map_err(|_| SessionError::NotARepository {
            path: workdir.display().to_string(),
        })?;

    if repo.is_dirty()? {
        return Err(SessionError::DirtyWorkingTree {
            path: workdir.display().to_string(),
        });
    }

    let resolved =
        repo.resolve_ref(target_version)
            .map_err(|_| SessionError::UnknownTargetVersion {
                target_version: target_version.to_string(),
            })?;

    if !matches!(resolved.ref_type, RefType::Branch | RefType::Tag) {
        return Err(SessionError::UnknownTargetVersion {
            target_version: target_version.to_string(),
        });
    }

    repo.checkout(target_version)?;

    log::info!(
        "Session ready at {} ({} -> {})",
        workdir.display(),
        target_version,
        resolved.sha
    );

    Ok(repo)
}
