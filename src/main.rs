//! gitbridge CLI - GitHub plugin backend with OAuth and code similarity search

use anyhow::Context;
use clap::{Parser, Subcommand};
use gitbridge::adapter::default_registry;
use gitbridge::config::{self, Config};
use gitbridge::server::{AppState, start_server};
use gitbridge::storage::SqliteStore;
use gitbridge::ui::{self, Icons};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "gitbridge")]
#[command(version)]
#[command(about = "GitHub plugin backend: OAuth, repository access and code similarity search")]
#[command(long_about = r#"
gitbridge exposes GitHub repository operations over HTTP for a conversational
agent plugin. Users authorize through GitHub OAuth (web or device flow); files
fetched through the API can be indexed for code similarity search.

Example usage:
  gitbridge init
  gitbridge serve --bind 127.0.0.1:5003
  gitbridge extract src/app.py
"#)]
struct Cli {
    /// Path to the config file (defaults to ./gitbridge.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind, overriding the config file
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the functions and classes found in a source file
    Extract {
        /// Python or JavaScript source file
        file: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show what the SQLite store holds
    Stats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if let Err(e) = run(cli).await {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { bind } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }

            ui::header(Icons::GLOBE, &format!("gitbridge listening on http://{}", config.server.bind));
            ui::info("store", &format!("{:?}", config.store.backend).to_lowercase());
            ui::info(
                "embeddings",
                if config.embedding.enabled {
                    config.embedding.model.as_str()
                } else {
                    "disabled"
                },
            );

            let state = AppState::from_config(config)?;
            start_server(state).await?;
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &Config::default(), force)?;

            let project_root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            config::ensure_gitignore(&project_root)?;

            ui::success(&format!("Wrote {}", path.display()));
            ui::info(
                "next",
                &format!(
                    "set GITHUB_CLIENT_ID / GITHUB_CLIENT_SECRET, then run {}",
                    ui::dim("gitbridge serve")
                ),
            );
        }

        Commands::Extract { file, json } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;

            let registry = default_registry();
            if registry.find_extractor(&file).is_none() {
                ui::warn(&format!("No extractor for {}", file.display()));
                return Ok(());
            }

            let entities = registry.extract(&file, &source)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entities)?);
            } else if entities.is_empty() {
                ui::warn("No top-level functions or classes found");
            } else {
                ui::header(Icons::FILE, &format!("{} ({} entities)", file.display(), entities.len()));
                println!("{}", ui::entity_table(&entities));
            }
        }

        Commands::Stats => {
            let config = Config::load(cli.config.as_deref())?;
            if !config.store.path.exists() {
                ui::warn(&format!("No database at {}", config.store.path.display()));
                return Ok(());
            }

            let store = SqliteStore::open(&config.store.path)?;
            let stats = store.stats()?;

            ui::header(Icons::STATS, &format!("gitbridge store ({})", config.store.path.display()));
            println!(
                "{}",
                ui::metrics_table(&[
                    ("Sessions", stats.sessions.to_string()),
                    ("Pending OAuth states", stats.pending_states.to_string()),
                    ("Code embeddings", stats.embeddings.to_string()),
                ])
            );
        }
    }

    Ok(())
}
