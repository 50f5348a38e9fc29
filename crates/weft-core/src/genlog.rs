//! Append-only generation log.
//!
//! One JSON object per line at `.weft/logs/generations.jsonl`. Lines are
//! only ever appended — no entry is rewritten or deleted by normal
//! operation; even `reset` appends rather than erasing history.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{WeftError, WeftResult};

/// Token counts reported by the predictor for one generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

/// One generation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Commit hash this generation belongs to.
    pub hash: String,
    /// Commit message.
    pub message: String,
    /// Spec path, relative to the repository root.
    pub spec_path: String,
    /// Output path, relative to the repository root.
    pub output_path: String,
    /// Hash of the generated content in the object store.
    pub content_hash: String,
    /// When the entry was written.
    pub timestamp: DateTime<Utc>,
    /// Model that produced the content.
    pub model: String,
    /// Token usage for the generation.
    pub tokens: TokenUsage,
}

/// Handle on the JSONL log file.
pub struct GenerationLog {
    path: PathBuf,
}

impl GenerationLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Append one entry as a single JSON line.
    pub fn append(&self, entry: &LogEntry) -> WeftResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read entries, most recent first.
    ///
    /// `spec_path` filters by exact match; `limit` truncates the result.
    /// Malformed lines (e.g. interleaved by a concurrent writer) are
    /// skipped with a warning rather than failing the whole read.
    pub fn read(&self, spec_path: Option<&str>, limit: Option<usize>) -> WeftResult<Vec<LogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let data = std::fs::read_to_string(&self.path)?;
        let mut entries: Vec<LogEntry> = Vec::new();
        for (lineno, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => {
                    if spec_path.map_or(true, |p| entry.spec_path == p) {
                        entries.push(entry);
                    }
                }
                Err(e) => {
                    warn!(line = lineno + 1, error = %e, "skipping malformed log line");
                }
            }
        }

        entries.reverse();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// Resolve a commit-hash prefix to the full hash it names.
    ///
    /// Fails with `AmbiguousHash` when the prefix matches more than one
    /// distinct commit.
    pub fn resolve_hash(&self, prefix: &str) -> WeftResult<String> {
        let mut matches: Vec<String> = Vec::new();
        for entry in self.read(None, None)? {
            if entry.hash.starts_with(prefix) && !matches.contains(&entry.hash) {
                matches.push(entry.hash);
            }
        }

        match matches.len() {
            0 => Err(WeftError::CommitNotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            n => Err(WeftError::AmbiguousHash {
                prefix: prefix.to_string(),
                matches: n,
            }),
        }
    }

    /// Every entry recorded under the given full commit hash, in the
    /// order they were written.
    pub fn entries_for_commit(&self, hash: &str) -> WeftResult<Vec<LogEntry>> {
        let mut entries = self.read(None, None)?;
        entries.reverse(); // back to file order
        entries.retain(|e| e.hash == hash);
        Ok(entries)
    }
}
