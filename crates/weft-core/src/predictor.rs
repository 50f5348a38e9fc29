//! Predictor seam — the interface to content generation.
//!
//! The core never performs network I/O. Commit takes a `Predictor` by
//! reference; real LLM providers live outside this crate and register
//! themselves in a `ProviderRegistry` constructed at process startup.
//! There is no process-wide default provider.

use std::collections::BTreeMap;

use crate::resolver::ResolvedConfig;

/// Content produced for one spec.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// The generated output.
    pub content: String,
    /// Model that produced it.
    pub model: String,
    /// Prompt tokens consumed.
    pub input_tokens: u64,
    /// Completion tokens produced.
    pub output_tokens: u64,
}

/// Turns a resolved configuration into generated content.
pub trait Predictor {
    /// Generate content for a resolved spec.
    ///
    /// `existing` is the output file's current content, if it exists, so
    /// the provider can produce an incremental update rather than a
    /// from-scratch rewrite.
    fn predict(&self, config: &ResolvedConfig, existing: Option<&str>)
        -> Result<Prediction, String>;
}

/// Named predictors, passed by reference into the commands that need one.
///
/// Built once at startup; no implicit teardown, no global state.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn Predictor>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predictor under a provider name. Replaces any previous
    /// registration for that name.
    pub fn register(&mut self, name: &str, predictor: Box<dyn Predictor>) {
        self.providers.insert(name.to_string(), predictor);
    }

    /// Look up a predictor by provider name.
    pub fn get(&self, name: &str) -> Option<&dyn Predictor> {
        self.providers.get(name).map(|p| p.as_ref())
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}
