//! Cascade resolver — folds ancestor spec fragments into one config.
//!
//! Given a leaf spec, the resolver walks up the directory tree collecting
//! directory-level `.spec.md` fragments, then merges them root-to-leaf so
//! deeper specs override shallower defaults.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::error::{WeftError, WeftResult};
use crate::merge::{merge_body, merge_examples, merge_frontmatter, MergeOptions};
use crate::parser::{self, lexical_normalize};
use crate::spec::{Example, Frontmatter, SpecFile, DIR_SPEC_NAME};

/// Default cap on how many ancestor directories the walk visits.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// The fully merged configuration for one leaf spec.
///
/// Recomputed on every resolve call — never cached, because spec files may
/// change between invocations.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Contributing specs in root-to-leaf order. The leaf is always last.
    pub chain: Vec<SpecFile>,
    /// Merged front-matter.
    pub frontmatter: Frontmatter,
    /// Merged body.
    pub body: String,
    /// Merged examples, deduplicated by input.
    pub examples: Vec<Example>,
    /// `context` entries as absolute paths, resolved against the leaf's directory.
    pub resolved_context: Vec<PathBuf>,
    /// `skills` entries as absolute paths, resolved against the leaf's directory.
    pub resolved_skills: Vec<PathBuf>,
}

/// Walks ancestor directories and merges spec fragments.
#[derive(Debug, Clone)]
pub struct CascadeResolver {
    /// Maximum number of ancestor directories to visit.
    pub max_depth: usize,
    /// Directory at which the upward walk stops (inclusive).
    pub stop_at: Option<PathBuf>,
    /// Merge strategies for this resolver instance.
    pub options: MergeOptions,
}

impl Default for CascadeResolver {
    fn default() -> Self {
        CascadeResolver {
            max_depth: DEFAULT_MAX_DEPTH,
            stop_at: None,
            options: MergeOptions::default(),
        }
    }
}

impl CascadeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the walk to stop at (and include) the given directory.
    pub fn stop_at(mut self, dir: &Path) -> Self {
        self.stop_at = Some(dir.to_path_buf());
        self
    }

    /// Resolve a leaf spec into its merged configuration.
    pub fn resolve(&self, leaf_spec_path: &Path) -> WeftResult<ResolvedConfig> {
        let leaf = absolutize(leaf_spec_path);
        let chain_paths = self.collect_chain_paths(&leaf)?;
        let chain = self.parse_chain(&leaf, &chain_paths)?;

        if chain.is_empty() {
            return Err(WeftError::EmptyChain(leaf));
        }

        let mut frontmatter = Frontmatter::default();
        let mut body = String::new();
        let mut examples: Vec<Example> = Vec::new();

        for spec in &chain {
            frontmatter = merge_frontmatter(&frontmatter, &spec.frontmatter, &self.options);
            body = merge_body(&body, &spec.body, self.options.body);
            examples = merge_examples(&examples, &spec.examples);
        }

        // Relative context/skills paths resolve against the LEAF's directory,
        // not each fragment's own directory.
        let leaf_dir = leaf.parent().unwrap_or(Path::new("/"));
        let resolved_context = resolve_against(leaf_dir, &frontmatter.context);
        let resolved_skills = resolve_against(leaf_dir, &frontmatter.skills);

        Ok(ResolvedConfig {
            chain,
            frontmatter,
            body,
            examples,
            resolved_context,
            resolved_skills,
        })
    }

    /// Walk ancestors and build the root-to-leaf list of spec paths.
    fn collect_chain_paths(&self, leaf: &Path) -> WeftResult<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = Vec::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();

        let stop_at = self
            .stop_at
            .as_ref()
            .map(|p| fs::canonicalize(p).unwrap_or_else(|_| p.clone()));

        let mut current = leaf
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        for _ in 0..self.max_depth {
            // Cycle detection on canonical paths: a directory can only
            // repeat if a symlink points back up the tree.
            let canonical = fs::canonicalize(&current).unwrap_or_else(|_| current.clone());
            if !visited.insert(canonical.clone()) {
                return Err(WeftError::CircularReference(current));
            }

            let dir_spec = current.join(DIR_SPEC_NAME);
            if dir_spec.is_file() {
                // New ancestors always go before what is already collected,
                // keeping root-to-leaf order.
                paths.insert(0, dir_spec);
            }

            if stop_at.as_deref() == Some(canonical.as_path()) {
                break;
            }
            match current.parent() {
                Some(parent) if parent != current => current = parent.to_path_buf(),
                _ => break, // filesystem root
            }
        }

        // The leaf itself comes last — unless it IS a directory-level spec,
        // in which case the walk already captured it.
        let leaf_is_dir_spec = leaf
            .file_name()
            .map(|n| n == DIR_SPEC_NAME)
            .unwrap_or(false);
        if !leaf_is_dir_spec {
            paths.push(leaf.to_path_buf());
        }

        Ok(paths)
    }

    /// Parse every path in the chain. A broken ancestor degrades to a
    /// warning and a skip; a broken leaf is fatal.
    fn parse_chain(&self, leaf: &Path, chain_paths: &[PathBuf]) -> WeftResult<Vec<SpecFile>> {
        let mut chain = Vec::with_capacity(chain_paths.len());
        let last = chain_paths.len().saturating_sub(1);

        for (i, path) in chain_paths.iter().enumerate() {
            match parser::parse(path) {
                Ok(spec) => chain.push(spec),
                Err(e) if i == last => return Err(e),
                Err(e) => {
                    warn!(
                        spec = %path.display(),
                        leaf = %leaf.display(),
                        error = %e,
                        "skipping unparsable ancestor spec"
                    );
                }
            }
        }
        Ok(chain)
    }
}

/// Make a path absolute against the current working directory.
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        let base = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        lexical_normalize(&base.join(path))
    }
}

/// Resolve relative entries against a base directory.
fn resolve_against(base: &Path, entries: &[String]) -> Vec<PathBuf> {
    entries
        .iter()
        .map(|entry| {
            let p = Path::new(entry);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                lexical_normalize(&base.join(p))
            }
        })
        .collect()
}
