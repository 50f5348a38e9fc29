//! Repository configuration.
//!
//! A small JSON document at `.weft/config` holding `provider`, `model`,
//! and `defaultBranch`, written once at init and mutated via get/set/unset
//! with dot-path addressing (`set("tokens.max", ...)` nests).

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::WeftResult;
use crate::fsutil::atomic_write;

/// Branch used when `defaultBranch` is unset.
pub const DEFAULT_BRANCH: &str = "main";

/// The configuration document.
#[derive(Debug, Clone)]
pub struct Config {
    doc: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        let mut doc = Map::new();
        doc.insert(
            "defaultBranch".to_string(),
            Value::String(DEFAULT_BRANCH.to_string()),
        );
        Config { doc }
    }
}

impl Config {
    /// Load from disk, or return defaults if the file is absent.
    pub fn load(path: &Path) -> WeftResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let doc: Map<String, Value> = serde_json::from_str(&data)?;
        Ok(Config { doc })
    }

    /// Persist to disk as pretty JSON.
    pub fn save(&self, path: &Path) -> WeftResult<()> {
        let json = serde_json::to_string_pretty(&self.doc)?;
        atomic_write(path, json.as_bytes())
    }

    /// Read a value by dot-path.
    pub fn get(&self, dot_path: &str) -> Option<&Value> {
        let mut current: &Value = self.doc.get(first_segment(dot_path))?;
        for segment in dot_path.split('.').skip(1) {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Set a value by dot-path, creating intermediate objects as needed.
    /// A non-object intermediate value is replaced by an object.
    pub fn set(&mut self, dot_path: &str, value: Value) {
        let segments: Vec<&str> = dot_path.split('.').collect();
        let (last, parents) = match segments.split_last() {
            Some(parts) => parts,
            None => return,
        };

        let mut current = &mut self.doc;
        for segment in parents {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = slot.as_object_mut().expect("slot was just made an object");
        }
        current.insert(last.to_string(), value);
    }

    /// Remove a value by dot-path. Returns true if something was removed.
    pub fn unset(&mut self, dot_path: &str) -> bool {
        let segments: Vec<&str> = dot_path.split('.').collect();
        let (last, parents) = match segments.split_last() {
            Some(parts) => parts,
            None => return false,
        };

        let mut current = &mut self.doc;
        for segment in parents {
            match current.get_mut(*segment).and_then(Value::as_object_mut) {
                Some(obj) => current = obj,
                None => return false,
            }
        }
        current.remove(*last).is_some()
    }

    /// Configured provider name, if any.
    pub fn provider(&self) -> Option<&str> {
        self.get("provider").and_then(Value::as_str)
    }

    /// Configured model name, if any.
    pub fn model(&self) -> Option<&str> {
        self.get("model").and_then(Value::as_str)
    }

    /// The default branch, falling back to `main`.
    pub fn default_branch(&self) -> &str {
        self.get("defaultBranch")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_BRANCH)
    }
}

fn first_segment(dot_path: &str) -> &str {
    dot_path.split('.').next().unwrap_or(dot_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_branch(), "main");
        assert!(config.provider().is_none());
        assert!(config.model().is_none());
    }

    #[test]
    fn test_set_get_flat() {
        let mut config = Config::default();
        config.set("provider", json!("anthropic"));
        config.set("model", json!("claude-sonnet"));
        assert_eq!(config.provider(), Some("anthropic"));
        assert_eq!(config.model(), Some("claude-sonnet"));
    }

    #[test]
    fn test_set_get_nested_dot_path() {
        let mut config = Config::default();
        config.set("tokens.max", json!(4096));
        assert_eq!(config.get("tokens.max"), Some(&json!(4096)));
        assert!(config.get("tokens").unwrap().is_object());
    }

    #[test]
    fn test_set_replaces_non_object_intermediate() {
        let mut config = Config::default();
        config.set("provider", json!("anthropic"));
        config.set("provider.region", json!("us"));
        assert_eq!(config.get("provider.region"), Some(&json!("us")));
    }

    #[test]
    fn test_unset() {
        let mut config = Config::default();
        config.set("tokens.max", json!(1));
        assert!(config.unset("tokens.max"));
        assert!(!config.unset("tokens.max"));
        assert!(config.get("tokens.max").is_none());
    }

    #[test]
    fn test_get_missing_is_none() {
        let config = Config::default();
        assert!(config.get("nope").is_none());
        assert!(config.get("nope.deeper").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");

        let mut config = Config::default();
        config.set("model", json!("m1"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.model(), Some("m1"));
        assert_eq!(loaded.default_branch(), "main");
    }

    #[test]
    fn test_load_missing_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("config")).unwrap();
        assert_eq!(config.default_branch(), "main");
    }
}
