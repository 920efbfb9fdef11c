#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Patch adapter models for `PatchPort`.
//!
//! This crate provides the data structures passed across the adaptation
//! seam: the per-file context handed to an adapter, and the adapted result
//! it returns.

use serde::{Deserialize, Serialize};

/// Context passed to a patch adapter for a single file.
///
/// The adapter contract is a pure function of this input: any backing
/// implementation (rule-based rewriter, model-backed CLI, human-in-the-loop
/// tool) can be substituted without touching the orchestrator.
#[derive(Debug, Clone)]
pub struct PatchContext {
    /// Repository-relative path of the file being backported.
    pub file_path: String,
    /// Unified diff of this file's change, as extracted from the commit.
    pub diff_text: String,
    /// The version identifier (branch or tag) being backported to.
    pub target_version: String,
    /// Full current content of the file on the target version, if it exists.
    pub original_content: Option<String>,
}

impl PatchContext {
    /// Create a new context for one file's diff.
    #[must_use]
    pub const fn new(file_path: String, diff_text: String, target_version: String) -> Self {
        Self {
            file_path,
            diff_text,
            target_version,
            original_content: None,
        }
    }

    /// Set the original file content.
    #[must_use]
    pub fn with_original_content(mut self, content: String) -> Self {
        self.original_content = Some(content);
        self
    }
}

/// Result of adapting one file's patch to the target version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptedPatch {
    /// The adapted file content to write to the working tree.
    pub content: String,
    /// Human-readable explanation of the modifications.
    ///
    /// Advisory and user-facing only; never affects control flow.
    pub explanation: String,
}
