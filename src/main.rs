//! # WakeUp CLI (`wakeup`)
//!
//! ## Usage
//!
//! ```bash
//! wakeup --config ./config.json <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wakeup serve` | Start the HTTP upload server |
//! | `wakeup ingest <path>` | Run the upload pipeline on a local file |
//! | `wakeup show <hash>` | Print the stored pages of a document |
//! | `wakeup plan <hash> --per-batch N` | Split a document's pages into batches |
//! | `wakeup schedule` | Run the configured daily deliveries (blocks) |
//! | `wakeup model <capability> <provider>` | Call a hosted model API |

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wakeup::config;
use wakeup::gateway::{create_client, Capability, ModelOptions, ModelResponse, Provider};
use wakeup::plan::batch_pages;
use wakeup::scheduler::{schedule_delivery, Scheduler};
use wakeup::server;
use wakeup::storage::load_pages;
use wakeup::upload::process_upload;

/// Environment variable consulted when `model` is run without `--token`.
const TOKEN_ENV: &str = "WAKEUP_API_TOKEN";

/// WakeUp: PDF upload, page storage, and hosted model API access.
#[derive(Parser)]
#[command(name = "wakeup", version)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, global = true, default_value = "./config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP upload server on `server.bind`.
    Serve,

    /// Process a local PDF exactly as an upload would be.
    Ingest {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print the stored pages of a document.
    Show {
        /// Content hash of the document.
        hash: String,
    },

    /// Split a stored document into batches of pages.
    Plan {
        /// Content hash of the document.
        hash: String,

        /// Number of pages per batch.
        #[arg(long, default_value_t = 5)]
        per_batch: usize,
    },

    /// Run the daily deliveries from the `schedule` section. Never returns.
    Schedule,

    /// Send one request to a hosted model API.
    Model {
        /// Capability, e.g. `text-to-text`, `speech-to-text`, `model-list`.
        capability: Capability,

        /// Provider: openai, groq, cerebras, mistral, infodev.
        provider: Provider,

        /// JSON request body (or form fields for file capabilities).
        #[arg(long)]
        body: Option<String>,

        /// File to attach (speech-to-text, image-to-text).
        #[arg(long)]
        file: Option<PathBuf>,

        /// Where to write binary responses (audio).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Bearer token; defaults to $WAKEUP_API_TOKEN.
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wakeup=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = cli.config;

    match cli.command {
        Commands::Serve => {
            let cfg = config::load_config(&config_path)?;
            server::run_server(&cfg).await?;
        }
        Commands::Ingest { path } => {
            let cfg = config::load_config(&config_path)?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let outcome = tokio::task::spawn_blocking(move || {
                process_upload(&cfg, &filename, &bytes)
            })
            .await??;
            println!("File uploaded and processed successfully");
            println!("  hash:  {}", outcome.hash);
            println!("  pages: {}", outcome.pages);
        }
        Commands::Show { hash } => {
            let cfg = config::load_config(&config_path)?;
            for (i, text) in stored_pages(&cfg, &hash)?.iter().enumerate() {
                println!("--- page {} ---", i + 1);
                println!("{}", text);
            }
        }
        Commands::Plan { hash, per_batch } => {
            let cfg = config::load_config(&config_path)?;
            let pages = stored_pages(&cfg, &hash)?;
            let batches = batch_pages(&pages, per_batch)?;
            println!(
                "{} pages in {} batches of up to {}",
                pages.len(),
                batches.len(),
                per_batch
            );
            let mut first = 1;
            for (i, batch) in batches.iter().enumerate() {
                println!(
                    "  batch {}: pages {}-{}",
                    i + 1,
                    first,
                    first + batch.len() - 1
                );
                first += batch.len();
            }
        }
        Commands::Schedule => {
            let cfg = config::load_config(&config_path)?;
            if cfg.schedule.is_empty() {
                bail!("No deliveries configured in `schedule`");
            }
            let mut scheduler = Scheduler::new();
            for delivery in &cfg.schedule {
                schedule_delivery(&mut scheduler, delivery)?;
            }
            tracing::info!(
                jobs = scheduler.len(),
                next_run = ?scheduler.next_run(),
                "scheduler started"
            );
            tokio::task::spawn_blocking(move || scheduler.run_forever()).await?;
        }
        // Talks to remote APIs only; no config file is read.
        Commands::Model {
            capability,
            provider,
            body,
            file,
            output,
            token,
        } => {
            run_model(capability, provider, body, file, output, token).await?;
        }
    }

    Ok(())
}

fn stored_pages(cfg: &config::Config, hash: &str) -> anyhow::Result<Vec<String>> {
    let dir = cfg.storage_folder.join(hash);
    if !dir.is_dir() {
        bail!("No document stored under hash {}", hash);
    }
    load_pages(&dir).with_context(|| format!("Failed to read pages from {}", dir.display()))
}

async fn run_model(
    capability: Capability,
    provider: Provider,
    body: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    token: Option<String>,
) -> anyhow::Result<()> {
    let token = match token {
        Some(t) => t,
        None => std::env::var(TOKEN_ENV)
            .with_context(|| format!("--token not given and {} not set", TOKEN_ENV))?,
    };

    let client = create_client(capability, provider, &token)?;

    let body = match body {
        Some(raw) => serde_json::from_str(&raw).with_context(|| "--body is not valid JSON")?,
        None => serde_json::Value::Null,
    };
    let mut options = ModelOptions::json(body);
    if let Some(path) = file {
        let bytes =
            std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        options = options.with_attachment(name, bytes);
    }

    match client.run(options).await? {
        ModelResponse::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        ModelResponse::Text(text) => println!("{}", text),
        ModelResponse::Binary(bytes) => {
            let Some(path) = output else {
                bail!(
                    "{} returned {} bytes of binary data; pass --output to save it",
                    capability,
                    bytes.len()
                );
            };
            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
    }

    Ok(())
}
