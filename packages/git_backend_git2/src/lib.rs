#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! git2 (libgit2) implementation of the `GitBackend` trait.
//!
//! This crate provides a production-ready git backend using the `git2` crate,
//! which wraps the `libgit2` C library.

use std::path::{Path, PathBuf};

use git2::{DiffOptions, Repository, StatusOptions, build::CheckoutBuilder};
use patchport_git_backend::{GitBackend, GitRepository};
use patchport_git_backend_models::{CommitInfo, GitBackendError, RefType, ResolvedRef};

/// git2-based implementation of `GitBackend`.
#[derive(Debug, Clone, Default)]
pub struct Git2Backend;

impl Git2Backend {
    /// Create a new git2 backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl GitBackend for Git2Backend {
    fn open(&self, path: &Path) -> Result<Box<dyn GitRepository>, GitBackendError> {
        let repo = Repository::open(path).map_err(|e| GitBackendError::RepoNotFound {
            path: format!("{}: {e}", path.display()),
        })?;
        Ok(Box::new(Git2Repository::new(repo)))
    }

    fn discover(&self, path: &Path) -> Result<Box<dyn GitRepository>, GitBackendError> {
        let repo = Repository::discover(path).map_err(|e| GitBackendError::NotARepository {
            path: format!("{}: {e}", path.display()),
        })?;
        Ok(Box::new(Git2Repository::new(repo)))
    }
}

/// git2-based implementation of `GitRepository`.
struct Git2Repository {
    repo: Repository,
    workdir: Option<PathBuf>,
}

impl Git2Repository {
    fn new(repo: Repository) -> Self {
        let workdir = repo.workdir().map(Path::to_path_buf);
        Self { repo, workdir }
    }

    fn resolve_to_commit(&self, spec: &str) -> Result<git2::Commit<'_>, GitBackendError> {
        let obj = self
            .repo
            .revparse_single(spec)
            .map_err(|_| GitBackendError::RefNotFound {
                ref_name: spec.to_string(),
            })?;

        obj.peel_to_commit()
            .map_err(|_| GitBackendError::RefNotFound {
                ref_name: spec.to_string(),
            })
    }

    fn commit_to_info(commit: &git2::Commit<'_>) -> CommitInfo {
        let sha = commit.id().to_string();
        let short_sha = sha[..sha.len().min(7)].to_string();
        let summary = commit.summary().unwrap_or("").to_string();
        let parent_shas = commit.parent_ids().map(|id| id.to_string()).collect();

        CommitInfo {
            sha,
            short_sha,
            summary,
            parent_shas,
        }
    }

    fn ref_type_of(&self, ref_name: &str) -> RefType {
        if ref_name == "HEAD" {
            RefType::Head
        } else if self
            .repo
            .find_branch(ref_name, git2::BranchType::Local)
            .is_ok()
        {
            RefType::Branch
        } else if self
            .repo
            .find_branch(ref_name, git2::BranchType::Remote)
            .is_ok()
        {
            RefType::Remote
        } else if self
            .repo
            .find_reference(&format!("refs/tags/{ref_name}"))
            .is_ok()
        {
            RefType::Tag
        } else {
            RefType::Commit
        }
    }
}

impl GitRepository for Git2Repository {
    fn resolve_ref(&self, ref_name: &str) -> Result<ResolvedRef, GitBackendError> {
        let commit = self.resolve_to_commit(ref_name)?;
        let sha = commit.id().to_string();

        Ok(ResolvedRef {
            sha,
            name: ref_name.to_string(),
            ref_type: self.ref_type_of(ref_name),
        })
    }

    fn get_commit(&self, sha: &str) -> Result<CommitInfo, GitBackendError> {
        let commit = self.resolve_to_commit(sha)?;
        Ok(Self::commit_to_info(&commit))
    }

    fn commit_patch_text(
        &self,
        sha: &str,
        pathspecs: &[String],
    ) -> Result<String, GitBackendError> {
        let commit = self.resolve_to_commit(sha)?;
        let tree = commit.tree().map_err(|e| GitBackendError::GitError {
            message: e.to_string(),
        })?;

        // Diff against the first parent; root commits diff against the
        // empty tree.
        let parent_tree = if commit.parent_count() > 0 {
            let parent = commit.parent(0).map_err(|e| GitBackendError::GitError {
                message: e.to_string(),
            })?;
            Some(parent.tree().map_err(|e| GitBackendError::GitError {
                message: e.to_string(),
            })?)
        } else {
            None
        };

        let mut diff_opts = DiffOptions::new();
        for spec in pathspecs {
            diff_opts.pathspec(spec);
        }

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))
            .map_err(|e| GitBackendError::GitError {
                message: e.to_string(),
            })?;

        let mut patch_text = String::new();

        diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
            let origin = line.origin();
            match origin {
                '+' | '-' | ' ' => {
                    patch_text.push(origin);
                    if let Ok(content) = std::str::from_utf8(line.content()) {
                        patch_text.push_str(content);
                    }
                }
                // File headers ('F') carry the `diff --git` block; hunk
                // headers ('H') carry the `@@` lines.
                'F' | 'H' => {
                    if let Ok(content) = std::str::from_utf8(line.content()) {
                        patch_text.push_str(content);
                    }
                }
                _ => {}
            }
            true
        })
        .map_err(|e| GitBackendError::GitError {
            message: e.to_string(),
        })?;

        Ok(patch_text)
    }

    fn checkout(&self, ref_name: &str) -> Result<(), GitBackendError> {
        let obj = self
            .repo
            .revparse_single(ref_name)
            .map_err(|_| GitBackendError::RefNotFound {
                ref_name: ref_name.to_string(),
            })?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();

        self.repo
            .checkout_tree(&obj, Some(&mut checkout))
            .map_err(|e| GitBackendError::GitError {
                message: format!("Failed to checkout {ref_name}: {e}"),
            })?;

        match self.ref_type_of(ref_name) {
            RefType::Branch => self
                .repo
                .set_head(&format!("refs/heads/{ref_name}"))
                .map_err(|e| GitBackendError::GitError {
                    message: format!("Failed to set HEAD to {ref_name}: {e}"),
                }),
            _ => {
                let commit = obj
                    .peel_to_commit()
                    .map_err(|_| GitBackendError::RefNotFound {
                        ref_name: ref_name.to_string(),
                    })?;
                self.repo
                    .set_head_detached(commit.id())
                    .map_err(|e| GitBackendError::GitError {
                        message: format!("Failed to detach HEAD at {ref_name}: {e}"),
                    })
            }
        }
    }

    fn head(&self) -> Result<String, GitBackendError> {
        let head = self.repo.head().map_err(|e| GitBackendError::GitError {
            message: format!("Failed to get HEAD: {e}"),
        })?;

        let commit = head
            .peel_to_commit()
            .map_err(|e| GitBackendError::GitError {
                message: format!("HEAD is not a commit: {e}"),
            })?;

        Ok(commit.id().to_string())
    }

    fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    fn is_dirty(&self) -> Result<bool, GitBackendError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.include_ignored(false);

        let statuses =
            self.repo
                .statuses(Some(&mut opts))
                .map_err(|e| GitBackendError::GitError {
                    message: format!("Failed to get status: {e}"),
                })?;

        Ok(!statuses.is_empty())
    }
}
