//! Error types for weft operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// All possible weft errors.
#[derive(Debug)]
pub enum WeftError {
    /// No `.weft/` store directory found on the upward search.
    NotARepository(PathBuf),
    /// A spec file could not be parsed.
    ParseError { path: PathBuf, reason: String },
    /// A directory was visited twice during the ancestor walk (symlink loop).
    CircularReference(PathBuf),
    /// The cascade produced no specs at all.
    EmptyChain(PathBuf),
    /// Commit requested with nothing staged.
    NothingStaged,
    /// An object with the given hash was not found in the store.
    ObjectNotFound(String),
    /// A branch ref file does not exist.
    BranchNotFound(String),
    /// No log entry matched the given commit hash or prefix.
    CommitNotFound(String),
    /// A commit-hash prefix matched more than one log entry.
    AmbiguousHash { prefix: String, matches: usize },
    /// The external predictor failed for a spec.
    Predict { spec_path: PathBuf, reason: String },
    /// An I/O error occurred.
    Io(io::Error),
    /// JSON serialization/deserialization failed.
    Json(serde_json::Error),
    /// YAML front-matter deserialization failed.
    Yaml(serde_yaml::Error),
    /// Generic error with a message.
    Other(String),
}

impl fmt::Display for WeftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeftError::NotARepository(start) => write!(
                f,
                "not a weft repository (no .weft/ found above {}) — run `weft init` first",
                start.display()
            ),
            WeftError::ParseError { path, reason } => {
                write!(f, "failed to parse spec {}: {reason}", path.display())
            }
            WeftError::CircularReference(dir) => write!(
                f,
                "circular reference: directory {} appears twice in the ancestor walk",
                dir.display()
            ),
            WeftError::EmptyChain(leaf) => {
                if leaf.as_os_str().is_empty() {
                    write!(f, "no spec files to merge")
                } else {
                    write!(f, "no specs found in the cascade for {}", leaf.display())
                }
            }
            WeftError::NothingStaged => write!(f, "nothing staged — run `weft stage` first"),
            WeftError::ObjectNotFound(hash) => write!(f, "object not found: {hash}"),
            WeftError::BranchNotFound(branch) => write!(f, "branch not found: {branch}"),
            WeftError::CommitNotFound(prefix) => write!(f, "no commit matching '{prefix}'"),
            WeftError::AmbiguousHash { prefix, matches } => write!(
                f,
                "hash prefix '{prefix}' matches {matches} commits — use a longer prefix"
            ),
            WeftError::Predict { spec_path, reason } => {
                write!(f, "prediction failed for {}: {reason}", spec_path.display())
            }
            WeftError::Io(e) => write!(f, "I/O error: {e}"),
            WeftError::Json(e) => write!(f, "JSON error: {e}"),
            WeftError::Yaml(e) => write!(f, "YAML error: {e}"),
            WeftError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for WeftError {}

impl From<io::Error> for WeftError {
    fn from(e: io::Error) -> Self {
        WeftError::Io(e)
    }
}

impl From<serde_json::Error> for WeftError {
    fn from(e: serde_json::Error) -> Self {
        WeftError::Json(e)
    }
}

impl From<serde_yaml::Error> for WeftError {
    fn from(e: serde_yaml::Error) -> Self {
        WeftError::Yaml(e)
    }
}

/// Convenience alias for Results in weft.
pub type WeftResult<T> = Result<T, WeftError>;
