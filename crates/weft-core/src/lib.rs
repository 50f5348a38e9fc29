//! weft-core — Core library for spec-driven file generation.
//!
//! Weft lets a repository declare, per output file, a **spec** describing
//! how that file should be generated. Directory-level specs cascade
//! defaults down to leaf specs, and a git-like content-addressed store
//! stages specs, commits generated content by hash, and keeps an
//! append-only history of generations.

pub mod compactor;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod genlog;
pub mod hash;
pub mod ignore;
pub mod index;
pub mod merge;
pub mod object;
pub mod parser;
pub mod predictor;
pub mod refs;
pub mod repo;
pub mod resolver;
pub mod spec;

pub use error::{WeftError, WeftResult};
pub use repo::Repository;
pub use resolver::{CascadeResolver, ResolvedConfig};
