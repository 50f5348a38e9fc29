//! Staging index.
//!
//! Tracks specs pending generation. Stored as JSON at `.weft/index` and
//! persisted with a full read-modify-write on every mutation — there is
//! no partial update and no cross-process locking (two processes staging
//! concurrently is a documented last-write-wins race).

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeftResult;
use crate::fsutil::atomic_write;

/// One staged spec awaiting commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedSpec {
    /// Spec path, relative to the repository root.
    pub spec_path: String,
    /// SHA-256 of the spec's content at staging time.
    pub spec_hash: String,
    /// Output path, relative to the repository root.
    pub output_path: String,
    /// Hash of already-predicted content, if generation ran before commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_hash: Option<String>,
    /// When the spec was staged.
    pub staged_at: DateTime<Utc>,
}

/// The staging area.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    /// Staged specs, one entry per spec path.
    #[serde(default)]
    pub staged: Vec<StagedSpec>,
    /// Hash of the most recent commit, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
}

impl Index {
    /// Load the index from disk, or return an empty index if absent.
    pub fn load(path: &Path) -> WeftResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    /// Persist the index (atomic: temp + fsync + rename).
    pub fn save(&self, path: &Path) -> WeftResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }

    /// Stage a spec. Last-write-wins by spec path: any prior entry for
    /// the same path is replaced, regardless of content.
    pub fn stage(&mut self, entry: StagedSpec) {
        self.staged.retain(|s| s.spec_path != entry.spec_path);
        self.staged.push(entry);
    }

    /// Remove a staged entry. Returns true if one was present.
    pub fn unstage(&mut self, spec_path: &str) -> bool {
        let before = self.staged.len();
        self.staged.retain(|s| s.spec_path != spec_path);
        self.staged.len() != before
    }

    /// Drop every staged entry.
    pub fn clear(&mut self) {
        self.staged.clear();
    }

    /// Look up a staged entry by spec path.
    pub fn get(&self, spec_path: &str) -> Option<&StagedSpec> {
        self.staged.iter().find(|s| s.spec_path == spec_path)
    }
}
