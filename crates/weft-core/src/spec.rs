//! Spec files — per-output generation declarations.
//!
//! A spec is a markdown file with YAML front-matter that declares how one
//! output file should be generated. A directory-level spec (`.spec.md`)
//! carries defaults for every spec beneath it; the cascade resolver folds
//! those defaults into each leaf.

use std::path::PathBuf;

use serde::Serialize;
use serde_yaml::Mapping;

/// Reserved directory-level spec filename ("applies to this whole directory").
pub const DIR_SPEC_NAME: &str = ".spec.md";

/// Filename suffix that marks a file as a spec.
pub const SPEC_SUFFIX: &str = ".spec.md";

/// Typed front-matter with the reserved keys pulled out.
///
/// Unknown extension keys land in `extra`, which preserves the order they
/// appeared in the YAML document so merges stay deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Frontmatter {
    /// Display name for the spec.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// One-line description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Context file paths (relative until resolution).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// Skill file paths (relative until resolution).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// Path of the file this spec generates. Ancestor specs may omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Inline prompt override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Unknown extension keys, in document order.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Frontmatter {
    /// True if no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.context.is_empty()
            && self.skills.is_empty()
            && self.output.is_none()
            && self.prompt.is_none()
            && self.extra.is_empty()
    }
}

/// A single input/output example extracted from a spec body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    pub input: String,
    pub output: String,
}

/// A parsed spec file. Immutable once parsed; discarded after merge.
#[derive(Debug, Clone, Serialize)]
pub struct SpecFile {
    /// Absolute path the spec was read from.
    pub path: PathBuf,
    /// Parsed front-matter.
    pub frontmatter: Frontmatter,
    /// Markdown body with `<example>` blocks removed.
    pub body: String,
    /// Examples extracted from the body, in document order.
    pub examples: Vec<Example>,
    /// Original file contents.
    #[serde(skip)]
    pub raw: String,
}

impl SpecFile {
    /// True if this is a directory-level spec (named exactly `.spec.md`).
    pub fn is_dir_spec(&self) -> bool {
        self.path
            .file_name()
            .map(|n| n == DIR_SPEC_NAME)
            .unwrap_or(false)
    }
}
