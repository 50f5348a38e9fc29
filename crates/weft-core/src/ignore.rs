//! Directory skip rules for spec discovery.
//!
//! The recursive spec walk takes an explicit skip predicate instead of a
//! hardcoded list, so callers can extend or replace the defaults. The
//! store directory itself is ALWAYS skipped.

/// The `.weft` store directory name. Never walked.
pub const STORE_DIR: &str = ".weft";

/// Dependency/vendor and VCS metadata directories skipped by default.
const DEFAULT_SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "vendor",
    ".venv",
    "__pycache__",
];

/// A set of directory names to skip during the spec walk.
#[derive(Debug, Clone)]
pub struct SkipList {
    dir_names: Vec<String>,
}

impl Default for SkipList {
    fn default() -> Self {
        let mut dir_names = vec![STORE_DIR.to_string()];
        dir_names.extend(DEFAULT_SKIPPED_DIRS.iter().map(|s| s.to_string()));
        SkipList { dir_names }
    }
}

impl SkipList {
    /// The default skip set: store directory, VCS metadata, vendor dirs.
    pub fn defaults() -> Self {
        Self::default()
    }

    /// An empty skip set — only the store directory is skipped.
    pub fn none() -> Self {
        SkipList {
            dir_names: vec![STORE_DIR.to_string()],
        }
    }

    /// Add a directory name to skip.
    pub fn skip(mut self, name: &str) -> Self {
        self.dir_names.push(name.to_string());
        self
    }

    /// Should a directory with this name be skipped?
    pub fn is_skipped(&self, name: &str) -> bool {
        self.dir_names.iter().any(|d| d == name)
    }
}
