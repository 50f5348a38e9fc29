//! Branch refs and HEAD.
//!
//! A branch ref is a single file under `.weft/refs/heads/<branch>` holding
//! the latest commit hash for that branch; an empty file means "no commits
//! yet". `HEAD` names the current branch indirectly with the textual form
//! `ref: refs/heads/<branch>`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{WeftError, WeftResult};
use crate::fsutil::atomic_write;

const HEAD_PREFIX: &str = "ref: refs/heads/";

/// Read/write access to refs under a store directory.
pub struct RefStore {
    weft_dir: PathBuf,
}

impl RefStore {
    pub fn new(weft_dir: &Path) -> Self {
        Self {
            weft_dir: weft_dir.to_path_buf(),
        }
    }

    fn branch_path(&self, branch: &str) -> PathBuf {
        self.weft_dir.join("refs").join("heads").join(branch)
    }

    fn head_path(&self) -> PathBuf {
        self.weft_dir.join("HEAD")
    }

    /// Create a branch ref with no commits, if it does not already exist.
    pub fn ensure_branch(&self, branch: &str) -> WeftResult<()> {
        let path = self.branch_path(branch);
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "")?;
        }
        Ok(())
    }

    /// Point a branch at a commit hash.
    pub fn update_branch(&self, branch: &str, hash: &str) -> WeftResult<()> {
        let path = self.branch_path(branch);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&path, hash.as_bytes())
    }

    /// Latest commit hash for a branch. `Ok(None)` means the branch exists
    /// but has no commits yet.
    pub fn read_branch(&self, branch: &str) -> WeftResult<Option<String>> {
        let path = self.branch_path(branch);
        if !path.exists() {
            return Err(WeftError::BranchNotFound(branch.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }

    /// Point HEAD at a branch.
    pub fn write_head(&self, branch: &str) -> WeftResult<()> {
        atomic_write(
            &self.head_path(),
            format!("{HEAD_PREFIX}{branch}\n").as_bytes(),
        )
    }

    /// The branch HEAD currently names.
    pub fn current_branch(&self) -> WeftResult<String> {
        let content = fs::read_to_string(self.head_path())?;
        let trimmed = content.trim();
        match trimmed.strip_prefix(HEAD_PREFIX) {
            Some(branch) if !branch.is_empty() => Ok(branch.to_string()),
            _ => Err(WeftError::Other(format!(
                "malformed HEAD: '{trimmed}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_branch_creates_empty_ref() {
        let dir = tempdir().unwrap();
        let refs = RefStore::new(dir.path());
        refs.ensure_branch("main").unwrap();
        assert_eq!(refs.read_branch("main").unwrap(), None);
    }

    #[test]
    fn test_ensure_branch_preserves_existing_hash() {
        let dir = tempdir().unwrap();
        let refs = RefStore::new(dir.path());
        refs.update_branch("main", "abc").unwrap();
        refs.ensure_branch("main").unwrap();
        assert_eq!(refs.read_branch("main").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_update_and_read_branch() {
        let dir = tempdir().unwrap();
        let refs = RefStore::new(dir.path());
        refs.update_branch("main", "abc123").unwrap();
        assert_eq!(
            refs.read_branch("main").unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_read_missing_branch_fails() {
        let dir = tempdir().unwrap();
        let refs = RefStore::new(dir.path());
        assert!(matches!(
            refs.read_branch("nope"),
            Err(WeftError::BranchNotFound(_))
        ));
    }

    #[test]
    fn test_head_round_trip() {
        let dir = tempdir().unwrap();
        let refs = RefStore::new(dir.path());
        refs.write_head("main").unwrap();
        assert_eq!(refs.current_branch().unwrap(), "main");

        let raw = std::fs::read_to_string(dir.path().join("HEAD")).unwrap();
        assert_eq!(raw, "ref: refs/heads/main\n");
    }

    #[test]
    fn test_malformed_head_fails() {
        let dir = tempdir().unwrap();
        let refs = RefStore::new(dir.path());
        std::fs::write(dir.path().join("HEAD"), "garbage").unwrap();
        assert!(refs.current_branch().is_err());
    }
}
