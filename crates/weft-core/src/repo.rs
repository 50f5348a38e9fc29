//! Repository — the main entry point for weft operations.
//!
//! A Repository ties together the object store, staging index, branch
//! refs, generation log, and config under one `.weft/` directory. All
//! operations are local-filesystem only; generation itself goes through
//! the external [`Predictor`] seam.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{WeftError, WeftResult};
use crate::genlog::{GenerationLog, LogEntry, TokenUsage};
use crate::hash::{hash_bytes, hash_str};
use crate::ignore::{SkipList, STORE_DIR};
use crate::index::{Index, StagedSpec};
use crate::object::ObjectStore;
use crate::predictor::Predictor;
use crate::refs::RefStore;
use crate::resolver::CascadeResolver;
use crate::spec::SPEC_SUFFIX;

/// Result of an init call.
#[derive(Debug)]
pub struct InitReport {
    /// Repository root.
    pub root: PathBuf,
    /// True when a store already existed and missing pieces were recreated.
    pub reinitialized: bool,
}

/// Result of a successful commit.
#[derive(Debug)]
pub struct CommitResult {
    /// The commit hash the branch ref now points at.
    pub hash: String,
    /// Log entries written, one per staged spec.
    pub entries: Vec<LogEntry>,
}

/// Result of a reset.
#[derive(Debug)]
pub struct ResetResult {
    /// Full hash of the commit reset to.
    pub hash: String,
    /// Output paths restored from the object store.
    pub restored: Vec<String>,
}

/// Staging and branch state, for status displays.
#[derive(Debug)]
pub struct StatusReport {
    /// Current branch name.
    pub branch: String,
    /// Latest commit on the branch, if any.
    pub head: Option<String>,
    /// Staged specs.
    pub staged: Vec<StagedSpec>,
}

/// A weft repository.
pub struct Repository {
    /// Root of the working directory (where `.weft/` lives).
    root: PathBuf,
    /// Path to the `.weft/` directory.
    weft_dir: PathBuf,
    /// Content-addressed object store.
    objects: ObjectStore,
    /// Branch refs and HEAD.
    refs: RefStore,
    /// Append-only generation log.
    log: GenerationLog,
}

impl Repository {
    /// Initialize the store skeleton in the given directory.
    ///
    /// Idempotent: on an already-initialized repository, missing pieces
    /// are recreated and existing history is left untouched (a "reinit",
    /// reported but not fatal).
    pub fn init(root: &Path) -> WeftResult<InitReport> {
        let weft_dir = root.join(STORE_DIR);
        let reinitialized = weft_dir.exists();

        fs::create_dir_all(weft_dir.join("objects"))?;
        fs::create_dir_all(weft_dir.join("refs").join("heads"))?;
        fs::create_dir_all(weft_dir.join("logs"))?;
        fs::create_dir_all(weft_dir.join("stash"))?;

        let config_path = weft_dir.join("config");
        let config = if config_path.exists() {
            Config::load(&config_path)?
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            config
        };

        let refs = RefStore::new(&weft_dir);
        let branch = config.default_branch().to_string();
        if !weft_dir.join("HEAD").exists() {
            refs.write_head(&branch)?;
        }
        refs.ensure_branch(&branch)?;

        let index_path = weft_dir.join("index");
        if !index_path.exists() {
            Index::default().save(&index_path)?;
        }

        Ok(InitReport {
            root: root.to_path_buf(),
            reinitialized,
        })
    }

    /// Open a repository whose root is known.
    pub fn open(root: &Path) -> WeftResult<Self> {
        let weft_dir = root.join(STORE_DIR);
        if !weft_dir.is_dir() {
            return Err(WeftError::NotARepository(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            objects: ObjectStore::new(&weft_dir.join("objects")),
            refs: RefStore::new(&weft_dir),
            log: GenerationLog::new(&weft_dir.join("logs").join("generations.jsonl")),
            weft_dir,
        })
    }

    /// Locate the repository by upward search from a starting path.
    pub fn discover(start: &Path) -> WeftResult<Self> {
        let start_abs = if start.is_absolute() {
            start.to_path_buf()
        } else {
            env::current_dir()?.join(start)
        };

        let mut current = start_abs.clone();
        loop {
            if current.join(STORE_DIR).is_dir() {
                return Self::open(&current);
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(WeftError::NotARepository(start_abs)),
            }
        }
    }

    /// Repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The object store.
    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// The generation log.
    pub fn log(&self) -> &GenerationLog {
        &self.log
    }

    /// Load the repository config.
    pub fn config(&self) -> WeftResult<Config> {
        Config::load(&self.weft_dir.join("config"))
    }

    /// Persist the repository config.
    pub fn save_config(&self, config: &Config) -> WeftResult<()> {
        config.save(&self.weft_dir.join("config"))
    }

    /// Branch HEAD currently points at.
    pub fn current_branch(&self) -> WeftResult<String> {
        self.refs.current_branch()
    }

    /// Latest commit hash on the current branch, if any.
    pub fn head(&self) -> WeftResult<Option<String>> {
        let branch = self.refs.current_branch()?;
        self.refs.read_branch(&branch)
    }

    /// Staging and branch state in one read.
    pub fn status(&self) -> WeftResult<StatusReport> {
        let branch = self.refs.current_branch()?;
        let head = self.refs.read_branch(&branch)?;
        let index = self.load_index()?;
        Ok(StatusReport {
            branch,
            head,
            staged: index.staged,
        })
    }

    /// Stage a spec for generation. Last-write-wins per spec path.
    ///
    /// Does not touch the object store — only the index.
    pub fn stage_spec(
        &self,
        spec_path: &Path,
        output_path: &Path,
        spec_content: &[u8],
    ) -> WeftResult<StagedSpec> {
        let entry = StagedSpec {
            spec_path: self.rel(spec_path),
            spec_hash: hash_bytes(spec_content),
            output_path: self.rel(output_path),
            predicted_hash: None,
            staged_at: Utc::now(),
        };

        let mut index = self.load_index()?;
        index.stage(entry.clone());
        self.save_index(&index)?;
        Ok(entry)
    }

    /// Stage a spec by resolving its cascade to find the output path.
    pub fn stage(&self, spec_path: &Path, resolver: &CascadeResolver) -> WeftResult<StagedSpec> {
        let spec_abs = self.abs(spec_path);
        let config = self.bounded(resolver).resolve(&spec_abs)?;
        let output = config.frontmatter.output.as_deref().filter(|o| !o.is_empty()).ok_or_else(|| {
            WeftError::Other(format!(
                "spec {} has no output field — cascade-only specs cannot be staged",
                spec_abs.display()
            ))
        })?;

        let output_abs = {
            let p = Path::new(output);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                spec_abs.parent().unwrap_or(&self.root).join(p)
            }
        };
        let content = fs::read(&spec_abs)?;
        self.stage_spec(&spec_abs, &output_abs, &content)
    }

    /// Currently staged specs.
    pub fn staged_specs(&self) -> WeftResult<Vec<StagedSpec>> {
        Ok(self.load_index()?.staged)
    }

    /// Remove one spec from the staging area. Returns true if it was staged.
    pub fn unstage_spec(&self, spec_path: &Path) -> WeftResult<bool> {
        let rel = self.rel(spec_path);
        let mut index = self.load_index()?;
        let removed = index.unstage(&rel);
        if removed {
            self.save_index(&index)?;
        }
        Ok(removed)
    }

    /// Drop every staged entry.
    pub fn clear_staged(&self) -> WeftResult<()> {
        let mut index = self.load_index()?;
        index.clear();
        self.save_index(&index)
    }

    /// Commit every staged spec: resolve, predict, persist, log, advance.
    ///
    /// At-least-once semantics, not strict atomicity: if any spec's
    /// generation fails, the commit aborts before touching the branch ref
    /// or clearing the index. Specs generated before the failure keep
    /// their output files and log entries but remain staged, so a retry
    /// regenerates them.
    pub fn commit(
        &self,
        message: &str,
        predictor: &dyn Predictor,
        resolver: &CascadeResolver,
    ) -> WeftResult<CommitResult> {
        let mut index = self.load_index()?;
        if index.staged.is_empty() {
            return Err(WeftError::NothingStaged);
        }

        let resolver = self.bounded(resolver);
        let hash = create_commit_hash(message, &index.staged)?;
        let mut entries = Vec::with_capacity(index.staged.len());

        for staged in &index.staged {
            let spec_abs = self.root.join(&staged.spec_path);
            let config = resolver.resolve(&spec_abs)?;

            let output_abs = self.root.join(&staged.output_path);
            let existing = fs::read_to_string(&output_abs).ok();

            let prediction = predictor
                .predict(&config, existing.as_deref())
                .map_err(|reason| WeftError::Predict {
                    spec_path: spec_abs.clone(),
                    reason,
                })?;

            let content_hash = self.objects.write(prediction.content.as_bytes())?;
            if let Some(parent) = output_abs.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output_abs, prediction.content.as_bytes())?;

            let entry = LogEntry {
                hash: hash.clone(),
                message: message.to_string(),
                spec_path: staged.spec_path.clone(),
                output_path: staged.output_path.clone(),
                content_hash,
                timestamp: Utc::now(),
                model: prediction.model,
                tokens: TokenUsage {
                    input: prediction.input_tokens,
                    output: prediction.output_tokens,
                },
            };
            self.log.append(&entry)?;
            entries.push(entry);
        }

        // Only after every staged spec succeeded: advance the branch ref
        // and clear the staging set.
        let branch = self.refs.current_branch()?;
        self.refs.update_branch(&branch, &hash)?;
        index.clear();
        index.last_commit = Some(hash.clone());
        self.save_index(&index)?;

        Ok(CommitResult { hash, entries })
    }

    /// Read the generation log, optionally filtered by spec path.
    pub fn read_log(
        &self,
        spec_path: Option<&Path>,
        limit: Option<usize>,
    ) -> WeftResult<Vec<LogEntry>> {
        let rel = spec_path.map(|p| self.rel(p));
        self.log.read(rel.as_deref(), limit)
    }

    /// Reset the branch to an earlier commit, restoring its outputs from
    /// the object store. History is append-only: the reset is recorded as
    /// a new log entry, never by rewriting old ones.
    pub fn reset(&self, hash_prefix: &str) -> WeftResult<ResetResult> {
        let hash = self.log.resolve_hash(hash_prefix)?;
        let entries = self.log.entries_for_commit(&hash)?;

        let mut restored = Vec::new();
        for entry in &entries {
            // Reset marker entries carry no output.
            if entry.output_path.is_empty() {
                continue;
            }
            let content = self.objects.read(&entry.content_hash)?;
            let output_abs = self.root.join(&entry.output_path);
            if let Some(parent) = output_abs.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output_abs, &content)?;
            restored.push(entry.output_path.clone());
        }

        let branch = self.refs.current_branch()?;
        self.refs.update_branch(&branch, &hash)?;

        let short = &hash[..8.min(hash.len())];
        self.log.append(&LogEntry {
            hash: hash.clone(),
            message: format!("reset to {short}"),
            spec_path: String::new(),
            output_path: String::new(),
            content_hash: String::new(),
            timestamp: Utc::now(),
            model: String::new(),
            tokens: TokenUsage::default(),
        })?;

        Ok(ResetResult { hash, restored })
    }

    /// Every spec file under the repository root, sorted.
    ///
    /// The walk skips the store directory and whatever else the caller's
    /// skip list names (vendor directories, VCS metadata, ...).
    pub fn find_all_specs(&self, skip: &SkipList) -> WeftResult<Vec<PathBuf>> {
        let mut specs = Vec::new();

        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                !(e.file_type().is_dir() && skip.is_skipped(&name))
            })
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.ends_with(SPEC_SUFFIX) {
                specs.push(entry.path().to_path_buf());
            }
        }

        specs.sort();
        Ok(specs)
    }

    fn load_index(&self) -> WeftResult<Index> {
        Index::load(&self.weft_dir.join("index"))
    }

    fn save_index(&self, index: &Index) -> WeftResult<()> {
        index.save(&self.weft_dir.join("index"))
    }

    /// A copy of the resolver bounded at the repository root, unless the
    /// caller already set a boundary.
    fn bounded(&self, resolver: &CascadeResolver) -> CascadeResolver {
        if resolver.stop_at.is_some() {
            resolver.clone()
        } else {
            resolver.clone().stop_at(&self.root)
        }
    }

    fn abs(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// A path relative to the repository root, for index/log storage.
    fn rel(&self, path: &Path) -> String {
        let abs = self.abs(path);
        abs.strip_prefix(&self.root)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| abs.to_string_lossy().into_owned())
    }
}

/// Hash a commit: canonical JSON of message, entries, and a wall-clock
/// timestamp. The timestamp is part of the input on purpose — commit
/// hashes are effectively random identifiers, not content fingerprints,
/// and are NOT reproducible from the same logical inputs.
pub fn create_commit_hash(message: &str, entries: &[StagedSpec]) -> WeftResult<String> {
    let canonical = serde_json::json!({
        "message": message,
        "entries": entries,
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(hash_str(&canonical.to_string()))
}
