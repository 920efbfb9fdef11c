//! Patch adapter trait definition.

use async_trait::async_trait;

use patchport_adapter_models::{AdaptedPatch, PatchContext};

/// Errors that can occur when using a patch adapter.
#[derive(Debug, thiserror::Error)]
pub enum PatchAdapterError {
    /// Execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to spawn the adapter process.
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    /// Process exited with non-zero status.
    #[error("Process failed with exit code {exit_code}: {stderr}")]
    ProcessFailed {
        /// Exit code of the adapter process.
        exit_code: i32,
        /// Captured stderr output.
        stderr: String,
    },

    /// Execution timed out.
    #[error("Execution timed out after {0} seconds")]
    Timeout(u64),

    /// Failed to parse output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),
}

/// Trait for patch adapter implementations.
///
/// Adapters take one file's diff plus a target version identifier and
/// return the adapted content along with a human-readable explanation.
/// Implementations may be backed by anything (a rule engine, a model CLI,
/// a human tool); the pipeline treats them as an opaque capability.
#[async_trait]
pub trait PatchAdapter: Send + Sync {
    /// Get the adapter name.
    fn adapter_name(&self) -> &'static str;

    /// Adapt one file's diff for the target version.
    ///
    /// Adaptation is read-only with respect to the repository; adapters
    /// must never write to the working tree.
    ///
    /// # Errors
    ///
    /// Returns an error if adaptation fails for this file. Any single
    /// failure aborts the whole backport request before any file is
    /// written.
    async fn adapt(&self, context: &PatchContext) -> Result<AdaptedPatch, PatchAdapterError>;
}
