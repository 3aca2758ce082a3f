//! # Scripture Harness CLI (`scr`)
//!
//! The `scr` binary is the command-line interface to the fetching
//! pipeline. It provides commands for cache initialization, catalog
//! discovery, Scripture fetching, and TSV annotation-row fetching.
//!
//! ## Usage
//!
//! ```bash
//! scr --config ./config/scr.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scr init` | Create the SQLite cache database and purge expired rows |
//! | `scr catalog` | List resources discovered for the configured language/org |
//! | `scr fetch "<reference>"` | Fetch Scripture text for a reference |
//! | `scr rows "<reference>"` | Fetch TSV annotation rows for a reference |
//!
//! ## Examples
//!
//! ```bash
//! # One verse, every translation
//! scr fetch "John 3:16"
//!
//! # A chapter range from one translation, as JSON
//! scr fetch "Genesis 1-3" --resource ult --json
//!
//! # Translation notes with the upstream access trace
//! scr rows "Titus 1:1" --subject notes --trace
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use scripture_harness::cache::{CacheTier, MemoryCache, TieredCache};
use scripture_harness::catalog::{subjects, SCRIPTURE_SUBJECTS};
use scripture_harness::client::HttpSource;
use scripture_harness::config::{self, Config};
use scripture_harness::fetcher::ResourceFetcher;
use scripture_harness::sqlite_cache::SqliteCache;
use scripture_harness::tracer::Tracer;

/// Scripture Harness CLI — fetch Scripture and translation-helps content
/// from a Door43-style content catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; without one, sensible defaults against the public Door43 catalog
/// apply. See `config/scr.example.toml`.
#[derive(Parser)]
#[command(
    name = "scr",
    about = "Scripture Harness — a catalog-driven Scripture and translation-helps fetching pipeline",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply if absent.
    #[arg(long, global = true, default_value = "./config/scr.toml")]
    config: PathBuf,

    /// Override the configured language (e.g. `en`, `es-419`).
    #[arg(long, global = true)]
    language: Option<String>,

    /// Override the configured organization (e.g. `unfoldingWord`).
    #[arg(long, global = true)]
    organization: Option<String>,

    /// Override the configured release stage (`prod`, `preprod`, `latest`).
    #[arg(long, global = true)]
    stage: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the cache database.
    ///
    /// Creates the SQLite file and schema, then purges expired rows.
    /// Idempotent — running it multiple times is safe.
    Init,

    /// List resources discovered for the configured language/organization.
    Catalog {
        /// Restrict to a resource family: `bible`, `notes`, `questions`, `links`.
        #[arg(long)]
        subject: Option<String>,

        /// Print the entries as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Fetch Scripture text for a reference (e.g. `"John 3:16-18"`).
    Fetch {
        /// The Scripture reference.
        reference: String,

        /// Narrow translations by a name substring (e.g. `ult`, `ust`).
        #[arg(long)]
        resource: Option<String>,

        /// Print passages as JSON.
        #[arg(long)]
        json: bool,

        /// Print the upstream/cache access trace to stderr.
        #[arg(long)]
        trace: bool,
    },

    /// Fetch TSV annotation rows for a reference.
    Rows {
        /// The Scripture reference.
        reference: String,

        /// Resource family: `notes`, `questions`, or `links`.
        #[arg(long, default_value = "notes")]
        subject: String,

        /// Print rows as JSON.
        #[arg(long)]
        json: bool,

        /// Print the upstream/cache access trace to stderr.
        #[arg(long)]
        trace: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = config::load_or_default(&cli.config)?;
    if let Some(language) = &cli.language {
        config.catalog.language = language.clone();
    }
    if let Some(organization) = &cli.organization {
        config.catalog.organization = organization.clone();
    }
    if let Some(stage) = &cli.stage {
        config.catalog.stage = stage.clone();
    }

    match cli.command {
        Commands::Init => cmd_init(&config).await,
        Commands::Catalog { subject, json } => cmd_catalog(&config, subject.as_deref(), json).await,
        Commands::Fetch {
            reference,
            resource,
            json,
            trace,
        } => cmd_fetch(&config, &reference, resource.as_deref(), json, trace).await,
        Commands::Rows {
            reference,
            subject,
            json,
            trace,
        } => cmd_rows(&config, &reference, &subject, json, trace).await,
    }
}

async fn build_fetcher(config: &Config) -> Result<ResourceFetcher> {
    let mut tiers: Vec<Arc<dyn CacheTier>> = Vec::new();
    if config.cache.memory {
        tiers.push(Arc::new(MemoryCache::new()));
    }
    tiers.push(Arc::new(SqliteCache::connect(&config.cache.path).await?));
    let cache = Arc::new(TieredCache::new(tiers));
    let source = Arc::new(HttpSource::new(&config.http)?);
    Ok(ResourceFetcher::new(cache, source, config))
}

async fn cmd_init(config: &Config) -> Result<()> {
    let cache = SqliteCache::connect(&config.cache.path).await?;
    let purged = cache.purge_expired().await?;
    println!(
        "Cache initialized at {} ({} expired rows purged)",
        config.cache.path.display(),
        purged
    );
    Ok(())
}

fn subject_filter(subject: Option<&str>) -> Result<Option<Vec<&'static str>>> {
    let subject = match subject {
        Some(s) => s,
        None => return Ok(None),
    };
    let subjects: Vec<&'static str> = match subject {
        "bible" => SCRIPTURE_SUBJECTS.to_vec(),
        "notes" => vec![subjects::TRANSLATION_NOTES],
        "questions" => vec![subjects::TRANSLATION_QUESTIONS],
        "links" => vec![subjects::TRANSLATION_WORDS_LINKS],
        other => anyhow::bail!(
            "Unknown subject '{}'. Must be bible, notes, questions, or links.",
            other
        ),
    };
    Ok(Some(subjects))
}

async fn cmd_catalog(config: &Config, subject: Option<&str>, json: bool) -> Result<()> {
    let fetcher = build_fetcher(config).await?;
    let tracer = Tracer::new();
    let filter = subject_filter(subject)?;

    let entries = fetcher
        .catalog()
        .resolve(
            fetcher.language(),
            fetcher.organization(),
            filter.as_deref(),
            fetcher.stage(),
            &tracer,
        )
        .await?;

    if entries.is_empty() {
        println!(
            "No resources found for {}/{}",
            fetcher.language(),
            fetcher.organization()
        );
        return Ok(());
    }

    if json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "owner": e.owner,
                    "name": e.name,
                    "subject": e.subject,
                    "title": e.title,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for entry in &entries {
            println!(
                "{}/{}  [{}]",
                entry.owner,
                entry.name,
                entry.subject.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

async fn cmd_fetch(
    config: &Config,
    reference: &str,
    resource: Option<&str>,
    json: bool,
    trace: bool,
) -> Result<()> {
    let fetcher = build_fetcher(config).await?;
    let tracer = Tracer::new();

    let passages = fetcher.fetch_scripture(reference, resource, &tracer).await?;

    if trace {
        eprintln!("{}", serde_json::to_string_pretty(&tracer.trace())?);
    }

    if passages.is_empty() {
        println!("No text found for '{}'", reference);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&passages)?);
    } else {
        for passage in &passages {
            println!("── {} ──", passage.translation);
            println!("{}\n", passage.text.trim_start_matches('\n'));
        }
    }
    Ok(())
}

async fn cmd_rows(
    config: &Config,
    reference: &str,
    subject: &str,
    json: bool,
    trace: bool,
) -> Result<()> {
    let fetcher = build_fetcher(config).await?;
    let tracer = Tracer::new();

    let subjects = subject_filter(Some(subject))?.unwrap_or_default();
    let subject_name = subjects
        .first()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("subject filter resolved to nothing"))?;

    let rows = fetcher
        .fetch_tsv_resource(reference, subject_name, &tracer)
        .await?;

    if trace {
        eprintln!("{}", serde_json::to_string_pretty(&tracer.trace())?);
    }

    if rows.is_empty() {
        println!("No rows found for '{}'", reference);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            let mut columns: Vec<(&String, &String)> = row.iter().collect();
            columns.sort();
            for (column, value) in columns {
                if !value.is_empty() {
                    println!("{}: {}", column, value);
                }
            }
            println!();
        }
    }
    Ok(())
}
