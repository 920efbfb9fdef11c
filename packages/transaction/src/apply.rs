//! All-or-nothing application of a change set to a working tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::snapshot::{FileContent, resolve_path};
use crate::TransactionError;

/// Applies a mapping of repository-relative path to new content as a single
/// atomic transaction.
///
/// Each file's current content is captured into an in-memory backup
/// immediately before its write. If any write fails, every file captured up
/// to that point is restored to its captured content and the call fails;
/// files never touched are left as they were. The same primitive serves
/// rollback: applying the original contents restores the pre-transaction
/// tree with identical atomicity semantics.
///
/// Only working-tree file contents are mutated; version-control metadata is
/// never touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTransaction;

impl FileTransaction {
    /// Apply every change in `changes` under `root`, all-or-nothing.
    ///
    /// `FileContent::Text` writes the file (creating parent directories as
    /// needed); `FileContent::Absent` deletes it if present.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::Aborted` if any write fails; the tree is
    /// byte-identical to its pre-call state when this is returned. Returns
    /// `TransactionError::InvalidPath` (also after restoring) if a path
    /// escapes `root`.
    pub fn apply(
        root: &Path,
        changes: &BTreeMap<String, FileContent>,
    ) -> Result<(), TransactionError> {
        let mut backup: BTreeMap<String, FileContent> = BTreeMap::new();

        for (path, content) in changes {
            if let Err(e) = Self::backup_and_write(root, path, content, &mut backup) {
                log::warn!(
                    "Write failed for {path}, restoring {} file(s): {e}",
                    backup.len()
                );
                Self::restore(root, &backup);
                return Err(e);
            }
        }

        log::debug!("Applied {} file(s) under {}", changes.len(), root.display());

        Ok(())
    }

    /// Capture the current content of `path` into `backup`, then write the
    /// new content. The backup entry is recorded before the destructive
    /// write so a failure always has a restore source for every touched file.
    fn backup_and_write(
        root: &Path,
        path: &str,
        content: &FileContent,
        backup: &mut BTreeMap<String, FileContent>,
    ) -> Result<(), TransactionError> {
        let full_path = resolve_path(root, path)?;

        let previous = if full_path.exists() {
            let text =
                fs::read_to_string(&full_path).map_err(|source| TransactionError::Read {
                    path: path.to_string(),
                    source,
                })?;
            FileContent::Text(text)
        } else {
            FileContent::Absent
        };
        backup.insert(path.to_string(), previous);

        match content {
            FileContent::Text(text) => {
                if let Some(parent) = full_path.parent() {
                    fs::create_dir_all(parent).map_err(|source| TransactionError::Aborted {
                        path: path.to_string(),
                        source,
                    })?;
                }
                fs::write(&full_path, text).map_err(|source| TransactionError::Aborted {
                    path: path.to_string(),
                    source,
                })
            }
            FileContent::Absent => {
                if full_path.exists() {
                    fs::remove_file(&full_path).map_err(|source| TransactionError::Aborted {
                        path: path.to_string(),
                        source,
                    })?;
                }
                Ok(())
            }
        }
    }

    /// Restore every file in `backup` to its captured content.
    ///
    /// A file that fails to restore is logged and skipped so the remaining
    /// backups are still restored.
    fn restore(root: &Path, backup: &BTreeMap<String, FileContent>) {
        for (path, content) in backup {
            let Ok(full_path) = resolve_path(root, path) else {
                continue;
            };

            let result = match content {
                FileContent::Text(text) => fs::write(&full_path, text),
                FileContent::Absent => {
                    if full_path.exists() {
                        fs::remove_file(&full_path)
                    } else {
                        Ok(())
                    }
                }
            };

            if let Err(e) = result {
                log::error!("Failed to restore {path}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Snapshot;

    fn text(s: &str) -> FileContent {
        FileContent::Text(s.to_string())
    }

    #[test]
    fn test_apply_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "old a\n").unwrap();

        let mut changes = BTreeMap::new();
        changes.insert("a.py".to_string(), text("new a\n"));
        changes.insert("pkg/b.py".to_string(), text("new b\n"));

        FileTransaction::apply(dir.path(), &changes).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("a.py")).unwrap(),
            "new a\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("pkg/b.py")).unwrap(),
            "new b\n"
        );
    }

    #[test]
    fn test_apply_absent_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "content\n").unwrap();

        let mut changes = BTreeMap::new();
        changes.insert("a.py".to_string(), FileContent::Absent);

        FileTransaction::apply(dir.path(), &changes).unwrap();

        assert!(!dir.path().join("a.py").exists());
    }

    #[test]
    fn test_midway_failure_restores_touched_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "original a\n").unwrap();
        fs::write(dir.path().join("b.py"), "original b\n").unwrap();

        // "b.py/nested.py" fails because b.py is a file, not a directory.
        // BTreeMap order guarantees a.py is written first.
        let mut changes = BTreeMap::new();
        changes.insert("a.py".to_string(), text("changed a\n"));
        changes.insert("b.py/nested.py".to_string(), text("unreachable\n"));
        changes.insert("c.py".to_string(), text("never written\n"));

        let err = FileTransaction::apply(dir.path(), &changes).unwrap_err();
        assert!(matches!(err, TransactionError::Aborted { .. }));

        assert_eq!(
            fs::read_to_string(dir.path().join("a.py")).unwrap(),
            "original a\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("b.py")).unwrap(),
            "original b\n"
        );
        assert!(!dir.path().join("c.py").exists());
    }

    #[test]
    fn test_invalid_path_leaves_earlier_files_restored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "original\n").unwrap();

        let mut changes = BTreeMap::new();
        changes.insert("a.py".to_string(), text("changed\n"));
        changes.insert("z/../../escape.py".to_string(), text("nope\n"));

        let err = FileTransaction::apply(dir.path(), &changes).unwrap_err();
        assert!(matches!(err, TransactionError::InvalidPath { .. }));

        assert_eq!(
            fs::read_to_string(dir.path().join("a.py")).unwrap(),
            "original\n"
        );
    }

    #[test]
    fn test_snapshot_restore_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "alpha\n").unwrap();

        let snapshot = Snapshot::capture(dir.path(), ["a.py", "new.py"]).unwrap();

        // Mutate the tree: overwrite one file, create the other.
        let mut changes = BTreeMap::new();
        changes.insert("a.py".to_string(), text("mutated\n"));
        changes.insert("new.py".to_string(), text("created\n"));
        FileTransaction::apply(dir.path(), &changes).unwrap();

        // Rolling back is just applying the captured contents.
        FileTransaction::apply(dir.path(), snapshot.contents()).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("a.py")).unwrap(),
            "alpha\n"
        );
        assert!(!dir.path().join("new.py").exists());
    }
}
