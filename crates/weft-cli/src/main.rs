//! weft CLI — the human interface to weft.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use weft_core::compactor::Compactor;
use weft_core::ignore::SkipList;
use weft_core::merge::{ArrayStrategy, BodyStrategy, MergeOptions};
use weft_core::predictor::ProviderRegistry;
use weft_core::repo::Repository;
use weft_core::resolver::CascadeResolver;
use weft_core::{WeftError, WeftResult};

#[derive(Parser)]
#[command(name = "weft", about = "weft — spec-driven file generation", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the .weft store in the current directory.
    Init,

    /// Show branch, head, and staged specs.
    Status,

    /// Stage specs for generation.
    Stage {
        /// Spec files to stage.
        specs: Vec<PathBuf>,

        /// Stage every spec in the repository.
        #[arg(long)]
        all: bool,
    },

    /// Remove a spec from the staging area.
    Unstage {
        /// Spec file to unstage.
        spec: PathBuf,
    },

    /// Resolve a spec's cascade and print the merged configuration.
    Resolve {
        /// Leaf spec file.
        spec: PathBuf,

        /// Merge strategy for the context array.
        #[arg(long, default_value = "dedupe")]
        context_strategy: String,

        /// Merge strategy for the skills array.
        #[arg(long, default_value = "dedupe")]
        skills_strategy: String,

        /// Merge strategy for the body.
        #[arg(long, default_value = "append")]
        body_strategy: String,
    },

    /// Merge an explicit list of spec files into one.
    Compact {
        /// Spec files, in merge order.
        paths: Vec<PathBuf>,

        /// Rewrite merged paths relative to this directory.
        #[arg(long)]
        base: Option<PathBuf>,
    },

    /// List every spec file in the repository.
    Specs,

    /// Generate content for all staged specs.
    Commit {
        /// Commit message.
        #[arg(long, short)]
        message: String,
    },

    /// Show generation history.
    Log {
        /// Only entries for this spec.
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Maximum number of entries to show.
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Move the branch back to an earlier commit, restoring its outputs.
    Reset {
        /// Commit hash (supports unique prefix).
        hash: String,
    },

    /// Read or write repository configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print a config value by dot-path.
    Get { key: String },
    /// Set a config value by dot-path.
    Set { key: String, value: String },
    /// Remove a config value by dot-path.
    Unset { key: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> WeftResult<()> {
    match cli.command {
        Commands::Init => {
            let cwd = std::env::current_dir()?;
            let report = Repository::init(&cwd)?;
            if report.reinitialized {
                println!("reinitialized existing weft store in {}", report.root.display());
            } else {
                println!("initialized weft store in {}", report.root.display());
            }
        }

        Commands::Status => {
            let repo = discover()?;
            let status = repo.status()?;
            println!("on branch {}", status.branch);
            match &status.head {
                Some(hash) => println!("head {}", &hash[..12.min(hash.len())]),
                None => println!("no commits yet"),
            }
            if status.staged.is_empty() {
                println!("nothing staged");
            } else {
                println!("staged:");
                for entry in &status.staged {
                    println!("  {} -> {}", entry.spec_path, entry.output_path);
                }
            }
        }

        Commands::Stage { specs, all } => {
            let repo = discover()?;
            let resolver = CascadeResolver::new();
            let specs = if all {
                repo.find_all_specs(&SkipList::defaults())?
            } else {
                specs
            };
            if specs.is_empty() {
                return Err(WeftError::Other("no specs given — pass paths or --all".into()));
            }
            for spec in &specs {
                // Cascade-only specs have no output and cannot be staged.
                match repo.stage(spec, &resolver) {
                    Ok(entry) => println!("staged {} -> {}", entry.spec_path, entry.output_path),
                    Err(e) if all => eprintln!("skipping {}: {e}", spec.display()),
                    Err(e) => return Err(e),
                }
            }
        }

        Commands::Unstage { spec } => {
            let repo = discover()?;
            if repo.unstage_spec(&spec)? {
                println!("unstaged {}", spec.display());
            } else {
                println!("{} was not staged", spec.display());
            }
        }

        Commands::Resolve {
            spec,
            context_strategy,
            skills_strategy,
            body_strategy,
        } => {
            let repo = discover()?;
            let resolver = CascadeResolver {
                options: MergeOptions {
                    context: parse_strategy::<ArrayStrategy>(&context_strategy)?,
                    skills: parse_strategy::<ArrayStrategy>(&skills_strategy)?,
                    body: parse_strategy::<BodyStrategy>(&body_strategy)?,
                },
                ..CascadeResolver::new()
            }
            .stop_at(repo.root());

            let config = resolver.resolve(&spec)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        Commands::Compact { paths, base } => {
            let mut compactor = Compactor::new();
            if let Some(base) = &base {
                compactor = compactor.relative_to(base);
            }
            let merged = compactor.compact(&paths)?;
            println!("{}", serde_json::to_string_pretty(&merged)?);
        }

        Commands::Specs => {
            let repo = discover()?;
            for spec in repo.find_all_specs(&SkipList::defaults())? {
                println!("{}", spec.display());
            }
        }

        Commands::Commit { message } => {
            let repo = discover()?;
            let config = repo.config()?;

            // LLM providers register here at startup; none ship with the CLI yet.
            let registry = ProviderRegistry::new();
            let provider = config.provider().ok_or_else(|| {
                WeftError::Other("no provider configured — run `weft config set provider <name>`".into())
            })?;
            let predictor = registry.get(provider).ok_or_else(|| {
                WeftError::Other(format!("provider '{provider}' is not registered"))
            })?;

            let result = repo.commit(&message, predictor, &CascadeResolver::new())?;
            println!("committed {} ({} spec(s))", &result.hash[..12], result.entries.len());
        }

        Commands::Log { spec, limit } => {
            let repo = discover()?;
            for entry in repo.read_log(spec.as_deref(), limit)? {
                println!(
                    "{} {} {} -> {} [{}] in:{} out:{}",
                    &entry.hash[..12.min(entry.hash.len())],
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.spec_path,
                    entry.output_path,
                    entry.model,
                    entry.tokens.input,
                    entry.tokens.output,
                );
            }
        }

        Commands::Reset { hash } => {
            let repo = discover()?;
            let result = repo.reset(&hash)?;
            println!("reset to {}", &result.hash[..12]);
            for path in &result.restored {
                println!("  restored {path}");
            }
        }

        Commands::Config { action } => {
            let repo = discover()?;
            let mut config = repo.config()?;
            match action {
                ConfigAction::Get { key } => match config.get(&key) {
                    Some(value) => println!("{value}"),
                    None => return Err(WeftError::Other(format!("config key '{key}' is not set"))),
                },
                ConfigAction::Set { key, value } => {
                    config.set(&key, serde_json::Value::String(value));
                    repo.save_config(&config)?;
                }
                ConfigAction::Unset { key } => {
                    if !config.unset(&key) {
                        return Err(WeftError::Other(format!("config key '{key}' is not set")));
                    }
                    repo.save_config(&config)?;
                }
            }
        }
    }

    Ok(())
}

fn discover() -> WeftResult<Repository> {
    let cwd = std::env::current_dir()?;
    Repository::discover(&cwd)
}

fn parse_strategy<T: std::str::FromStr<Err = String>>(s: &str) -> WeftResult<T> {
    s.parse().map_err(WeftError::Other)
}
