//! Git backend and repository traits.
//!
//! These traits abstract over git implementations for testability and flexibility.

use std::path::Path;

use patchport_git_backend_models::{CommitInfo, GitBackendError, ResolvedRef};

/// Factory trait for opening git repositories.
///
/// This is the main abstraction point for testing - mock implementations
/// can provide deterministic repository state.
pub trait GitBackend: Send + Sync {
    /// Open a repository at the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the repository root (containing `.git`).
    ///
    /// # Errors
    ///
    /// Returns `GitBackendError::RepoNotFound` if no repository exists at the path.
    fn open(&self, path: &Path) -> Result<Box<dyn GitRepository>, GitBackendError>;

    /// Discover a repository by walking up from the given path.
    ///
    /// This mimics `git rev-parse --git-dir` behavior, searching for a `.git`
    /// directory in the given path and its parents.
    ///
    /// # Arguments
    ///
    /// * `path` - Starting path to search from.
    ///
    /// # Errors
    ///
    /// Returns `GitBackendError::NotARepository` if no repository is found.
    fn discover(&self, path: &Path) -> Result<Box<dyn GitRepository>, GitBackendError>;
}

/// Operations on an opened git repository.
///
/// This trait defines all the git operations needed by the backport pipeline.
///
/// Note: This trait only requires `Send`, not `Sync`, because `git2::Repository`
/// is not thread-safe. Operations should be performed on a single thread or
/// protected by external synchronization.
pub trait GitRepository: Send {
    /// Resolve a ref name (branch, tag, HEAD, sha) to commit info.
    ///
    /// # Arguments
    ///
    /// * `ref_name` - Reference to resolve (e.g., "main", "HEAD", "abc123").
    ///
    /// # Errors
    ///
    /// Returns `GitBackendError::RefNotFound` if the reference doesn't exist.
    fn resolve_ref(&self, ref_name: &str) -> Result<ResolvedRef, GitBackendError>;

    /// Get commit information for a SHA.
    ///
    /// # Arguments
    ///
    /// * `sha` - The commit SHA (full or partial).
    ///
    /// # Errors
    ///
    /// Returns `GitBackendError::CommitNotFound` if the commit doesn't exist.
    fn get_commit(&self, sha: &str) -> Result<CommitInfo, GitBackendError>;

    /// Unified diff text introduced by a single commit against its first
    /// parent (`<sha>^!` semantics), restricted to the given pathspecs.
    ///
    /// The returned text includes the `diff --git` file header lines so it
    /// can be split back into per-file blocks. An empty string means the
    /// commit touched no matching files.
    ///
    /// # Arguments
    ///
    /// * `sha` - The commit SHA or ref.
    /// * `pathspecs` - Glob patterns limiting the diff (e.g., `*.py`).
    ///   Empty means no restriction.
    ///
    /// # Errors
    ///
    /// Returns `GitBackendError::RefNotFound` if the commit doesn't exist.
    fn commit_patch_text(
        &self,
        sha: &str,
        pathspecs: &[String],
    ) -> Result<String, GitBackendError>;

    /// Check out the working tree at the given branch or tag.
    ///
    /// Moves HEAD and resets the working tree files to the target. Only
    /// local refs are considered; fetching is out of scope.
    ///
    /// # Errors
    ///
    /// Returns `GitBackendError::RefNotFound` if the ref doesn't exist, or
    /// `GitBackendError::GitError` if the checkout fails.
    fn checkout(&self, ref_name: &str) -> Result<(), GitBackendError>;

    /// Get the current HEAD SHA.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD is unborn (empty repository).
    fn head(&self) -> Result<String, GitBackendError>;

    /// Get the repository working directory.
    ///
    /// Returns `None` for bare repositories.
    fn workdir(&self) -> Option<&Path>;

    /// Check if the working tree has uncommitted changes.
    ///
    /// This includes staged, unstaged, and untracked files.
    ///
    /// # Errors
    ///
    /// Returns an error if the status cannot be determined.
    fn is_dirty(&self) -> Result<bool, GitBackendError>;
}
