//! Content-addressed object store.
//!
//! Generated content lives in `.weft/objects/` under a 2-character prefix
//! directory scheme (like git): hash `abcdef...` -> `ab/cdef...`. Objects
//! are never overwritten or mutated; identical content hashes to the same
//! path, so re-writing is a no-op. Nothing collects garbage — objects
//! accumulate.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{WeftError, WeftResult};
use crate::hash::hash_bytes;

/// Handle on the on-disk object directory.
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Create a store rooted at the given objects directory.
    pub fn new(objects_dir: &Path) -> Self {
        Self {
            root: objects_dir.to_path_buf(),
        }
    }

    /// Store content and return its hash.
    ///
    /// Idempotent: the hash is returned whether or not a write occurred,
    /// and an existing object is never touched.
    pub fn write(&self, content: &[u8]) -> WeftResult<String> {
        let hash = hash_bytes(content);
        let path = self.object_path(&hash);

        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            debug!(hash = %hash, bytes = content.len(), "stored object");
        }
        Ok(hash)
    }

    /// Read an object's content by hash.
    pub fn read(&self, hash: &str) -> WeftResult<Vec<u8>> {
        let path = self.object_path(hash);
        if !path.exists() {
            return Err(WeftError::ObjectNotFound(hash.to_string()));
        }
        Ok(fs::read(&path)?)
    }

    /// Check whether an object exists.
    pub fn contains(&self, hash: &str) -> bool {
        self.object_path(hash).exists()
    }

    /// Filesystem path for a hash: first 2 hex chars as the directory,
    /// the remainder as the filename.
    fn object_path(&self, hash: &str) -> PathBuf {
        if hash.len() < 3 {
            // Too short to split; map into a reserved name that can never
            // collide with a real 64-char digest path.
            return self.root.join("invalid").join(hash);
        }
        let (prefix, rest) = hash.split_at(2);
        self.root.join(prefix).join(rest)
    }
}
