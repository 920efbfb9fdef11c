//! Shared server state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use patchport_adapter::PatchAdapter;
use patchport_extractor::ExtensionFilter;
use patchport_validation::ValidationGate;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};

use crate::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// The configured patch adapter.
    pub adapter: Arc<dyn PatchAdapter>,
    /// Root directory holding per-repository working copies.
    pub workspace_root: PathBuf,
    /// Validation gate template for each request.
    pub gate: ValidationGate,
    /// Extension filter template for each request.
    pub extensions: Vec<String>,
    /// Advisory per-working-tree locks: one backport transaction owns a
    /// tree for its whole duration.
    locks: RwLock<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl AppState {
    /// Create state from the server configuration.
    #[must_use]
    pub fn new(config: ServerConfig, adapter: Arc<dyn PatchAdapter>) -> Self {
        Self {
            adapter,
            workspace_root: config.workspace_root,
            gate: ValidationGate::new(config.test_command),
            extensions: config.extensions,
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Extension filter for a new request.
    #[must_use]
    pub fn filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(self.extensions.clone())
    }

    /// Map a repository URL to its working-copy directory.
    ///
    /// A URL that is an existing local directory is used as the working
    /// copy directly; anything else maps to a stable directory under the
    /// workspace root derived from a hash of the URL.
    #[must_use]
    pub fn resolve_workdir(&self, repository_url: &str) -> PathBuf {
        let as_path = Path::new(repository_url);
        if as_path.is_dir() {
            return as_path.to_path_buf();
        }

        self.workspace_root.join(Self::hash_url(repository_url))
    }

    /// Hash a repository URL to a directory-safe identifier.
    fn hash_url(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let result = hasher.finalize();
        // First 16 bytes (32 hex chars) is plenty of uniqueness
        hex::encode(&result[..16])
    }

    /// Get (or create) the advisory lock for a working tree.
    pub async fn tree_lock(&self, workdir: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.write().await;
        locks
            .entry(workdir.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use patchport_adapter::PatchAdapterError;
    use patchport_adapter_models::{AdaptedPatch, PatchContext};

    struct NoopAdapter;

    #[async_trait]
    impl PatchAdapter for NoopAdapter {
        fn adapter_name(&self) -> &'static str {
            "noop"
        }

        async fn adapt(
            &self,
            _context: &PatchContext,
        ) -> Result<AdaptedPatch, PatchAdapterError> {
            Err(PatchAdapterError::ExecutionFailed("noop".to_string()))
        }
    }

    fn state() -> AppState {
        AppState::new(ServerConfig::default(), Arc::new(NoopAdapter))
    }

    #[test]
    fn test_resolve_workdir_hashes_remote_urls() {
        let state = state();

        let a = state.resolve_workdir("https://example.com/a.git");
        let b = state.resolve_workdir("https://example.com/b.git");

        assert_ne!(a, b);
        assert!(a.starts_with(&state.workspace_root));
        assert_eq!(
            a,
            state.resolve_workdir("https://example.com/a.git"),
            "same URL must map to the same directory"
        );
    }

    #[test]
    fn test_resolve_workdir_uses_local_directories_directly() {
        let dir = tempfile::tempdir().unwrap();
        let state = state();

        let resolved = state.resolve_workdir(dir.path().to_str().unwrap());
        assert_eq!(resolved, dir.path());
    }

    #[tokio::test]
    async fn test_tree_lock_is_shared_per_tree() {
        let state = state();

        let lock_a = state.tree_lock(Path::new("/tmp/a")).await;
        let lock_a2 = state.tree_lock(Path::new("/tmp/a")).await;
        let lock_b = state.tree_lock(Path::new("/tmp/b")).await;

        assert!(Arc::ptr_eq(&lock_a, &lock_a2));
        assert!(!Arc::ptr_eq(&lock_a, &lock_b));
    }
}
