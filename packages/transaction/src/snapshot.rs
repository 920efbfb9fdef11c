//! Full-content snapshots of working-tree files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::TransactionError;

/// Content of a working-tree file at a point in time.
///
/// `Absent` is the "file did not exist" sentinel: restoring it deletes the
/// file instead of writing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// The file existed with this content.
    Text(String),
    /// The file did not exist.
    Absent,
}

/// A captured snapshot of working-tree file contents, keyed by
/// repository-relative path.
///
/// Snapshots are the rollback source for a backport transaction: the full
/// pre-transaction content is captured up front because diff text alone
/// cannot reconstruct a file. The snapshot is discarded on commit and
/// consumed on rollback; it is never persisted.
#[derive(Debug, Clone)]
pub struct Snapshot {
    root: PathBuf,
    entries: BTreeMap<String, FileContent>,
}

impl Snapshot {
    /// Capture the current content of every given path under `root`.
    ///
    /// Missing files are recorded as `FileContent::Absent`, not errors.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::InvalidPath` if a path escapes `root`, or
    /// `TransactionError::Read` if an existing file cannot be read.
    pub fn capture<I, S>(root: &Path, paths: I) -> Result<Self, TransactionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = BTreeMap::new();

        for path in paths {
            let path = path.as_ref();
            let full_path = resolve_path(root, path)?;

            let content = if full_path.exists() {
                let text = fs::read_to_string(&full_path).map_err(|source| {
                    TransactionError::Read {
                        path: path.to_string(),
                        source,
                    }
                })?;
                FileContent::Text(text)
            } else {
                FileContent::Absent
            };

            entries.insert(path.to_string(), content);
        }

        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// The root the snapshot was captured under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The captured contents, keyed by repository-relative path.
    #[must_use]
    pub const fn contents(&self) -> &BTreeMap<String, FileContent> {
        &self.entries
    }

    /// Consume the snapshot, yielding the captured contents.
    #[must_use]
    pub fn into_contents(self) -> BTreeMap<String, FileContent> {
        self.entries
    }
}

/// Resolve a repository-relative path against `root`, rejecting anything
/// that could escape it.
pub(crate) fn resolve_path(root: &Path, path: &str) -> Result<PathBuf, TransactionError> {
    let relative = Path::new(path);

    let escapes = relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));

    if escapes {
        return Err(TransactionError::InvalidPath {
            path: path.to_string(),
        });
    }

    Ok(root.join(relative))
}
