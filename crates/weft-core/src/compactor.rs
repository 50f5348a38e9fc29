//! Compactor — merges an explicitly ordered list of spec files.
//!
//! Shares the merge rules with the cascade resolver, but the caller owns
//! the order, so there is no directory walk and no cycle detection. Used
//! to consolidate several spec fragments into one.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{WeftError, WeftResult};
use crate::merge::{
    dedupe_first, merge_body, merge_examples, merge_frontmatter, MergeOptions,
};
use crate::parser;
use crate::spec::{Example, Frontmatter};

/// The result of compacting an ordered list of specs.
#[derive(Debug, Clone, Serialize)]
pub struct MergedSpec {
    /// Merged front-matter. `context`/`skills` are always deduplicated.
    pub frontmatter: Frontmatter,
    /// Merged body.
    pub body: String,
    /// Merged examples, deduplicated by input.
    pub examples: Vec<Example>,
    /// The input paths, in the order they were merged.
    pub sources: Vec<PathBuf>,
}

/// Merges caller-ordered spec fragments.
#[derive(Debug, Clone, Default)]
pub struct Compactor {
    /// Merge strategies for this compactor instance.
    pub options: MergeOptions,
    /// When set, merged `context`/`skills` paths are rewritten relative to
    /// this directory after the merge.
    pub base_path: Option<PathBuf>,
}

impl Compactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite merged paths relative to the given directory.
    pub fn relative_to(mut self, base: &Path) -> Self {
        self.base_path = Some(base.to_path_buf());
        self
    }

    /// Merge the given specs in order. Every path must parse — unlike the
    /// cascade, these are explicit caller inputs, so there is no
    /// skip-and-warn degradation.
    pub fn compact(&self, ordered_paths: &[PathBuf]) -> WeftResult<MergedSpec> {
        if ordered_paths.is_empty() {
            return Err(WeftError::EmptyChain(PathBuf::new()));
        }

        let mut frontmatter = Frontmatter::default();
        let mut body = String::new();
        let mut examples: Vec<Example> = Vec::new();

        for path in ordered_paths {
            // Each fragment's relative paths resolve against its OWN
            // directory before merging, so fragments from different
            // directories keep their original meaning.
            let spec = parser::resolve_relative_paths(parser::parse(path)?);
            frontmatter = merge_frontmatter(&frontmatter, &spec.frontmatter, &self.options);
            body = merge_body(&body, &spec.body, self.options.body);
            examples = merge_examples(&examples, &spec.examples);
        }

        // Compaction consolidates: residual duplicates are collapsed even
        // under a `concatenate` strategy.
        frontmatter.context = dedupe_first(frontmatter.context.iter());
        frontmatter.skills = dedupe_first(frontmatter.skills.iter());

        if let Some(base) = &self.base_path {
            frontmatter.context = relativize_all(&frontmatter.context, base);
            frontmatter.skills = relativize_all(&frontmatter.skills, base);
        }

        Ok(MergedSpec {
            frontmatter,
            body,
            examples,
            sources: ordered_paths.to_vec(),
        })
    }
}

fn relativize_all(entries: &[String], base: &Path) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            make_relative(Path::new(entry), base)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| entry.clone())
        })
        .collect()
}

/// Compute a relative path from `base` to `path`, walking up with `..`
/// where needed. Returns None when the two share no common root (e.g. one
/// side is relative).
fn make_relative(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.is_relative() || base.is_relative() {
        return None;
    }

    let path_parts: Vec<_> = path.components().collect();
    let base_parts: Vec<_> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &path_parts[common..] {
        out.push(part.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    Some(out)
}
