use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use findex::config::PathMode;
use findex::utils::{AppConfig, remove_index};
use findex::{SearchEngine, output};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "findex", version)]
#[command(about = "Local full-text search with fuzzy, phrase and boolean queries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory to search
    #[arg(short, long, global = true, env = "SEARCH_PATH", default_value = ".")]
    root: PathBuf,

    /// Print absolute paths instead of root-relative ones
    #[arg(long, global = true)]
    absolute: bool,

    /// Keep the index in memory only
    #[arg(long, global = true)]
    no_persist: bool,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or update the index
    Index {
        /// Re-read every file instead of only changed ones
        #[arg(short, long)]
        force: bool,
    },
    /// Search the index (updates it first)
    Search {
        /// Query: words, "phrases", prefix*, fuzzy~N, AND, OR
        query: String,

        /// Only search files matching this glob (e.g. *.md, docs/**/*.txt)
        #[arg(short, long)]
        file: Option<String>,

        /// Number of results to skip
        #[arg(short, long, default_value_t = 0)]
        skip: usize,

        /// Results per page
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print the text around a character offset of a file
    Read {
        /// File path relative to the root
        file: String,

        /// Character offset, as reported by search
        offset: usize,
    },
    /// List a directory under the root
    List {
        /// Directory relative to the root (defaults to the root)
        path: Option<String>,
    },
    /// Show index statistics
    Stats,
    /// Remove the persisted index for the root
    Remove,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("findex=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Commands::Remove = cli.command {
        let root = cli.root.canonicalize().context("Invalid root path")?;
        remove_index(&root)?;
        println!("Removed index for: {}", root.display());
        return Ok(());
    }

    let app_config = AppConfig::load()?;
    let mut config = app_config.engine_config(&cli.root, !cli.no_persist)?;
    if cli.absolute {
        config = config.with_path_mode(PathMode::Absolute);
    }
    if let Commands::Search { limit: Some(limit), .. } = &cli.command {
        config = config.with_page_size(*limit);
    }

    let engine = SearchEngine::open(config)
        .with_context(|| format!("Failed to open {}", cli.root.display()))?
        .with_progress(!cli.json);

    match cli.command {
        Commands::Index { force } => {
            let stats = if force {
                engine.rebuild()?
            } else {
                engine.refresh()?
            };
            if cli.json {
                output::print_json(&stats)?;
            } else {
                output::print_refresh(&stats, color)?;
            }
        }
        Commands::Search {
            query, file, skip, ..
        } => {
            engine.refresh()?;
            let page = engine.search(&query, file.as_deref(), skip)?;
            if cli.json {
                output::print_json(&page)?;
            } else {
                output::print_search_page(&page, color)?;
            }
        }
        Commands::Read { file, offset } => {
            let chunk = engine.read_chunk(&file, offset)?;
            if cli.json {
                output::print_json(&chunk)?;
            } else {
                output::print_chunk(&chunk, &engine.render(&chunk.key), offset, color)?;
            }
        }
        Commands::List { path } => {
            let entries = engine.list_directory(path.as_deref())?;
            if cli.json {
                output::print_json(&entries)?;
            } else {
                output::print_listing(path.as_deref().unwrap_or(""), &entries, color)?;
            }
        }
        Commands::Stats => {
            let stats = engine.stats();
            if cli.json {
                output::print_json(&stats)?;
            } else {
                output::print_stats(&stats, color)?;
            }
        }
        Commands::Remove => {}
    }

    Ok(())
}
