//! Shard Audit Tools Main Program
//!
//! Precomputes proof-of-retrievability challenges for shard files:
//! 1. Load configuration (file, environment, command line overrides)
//! 2. Stream each shard once through a fresh audit
//! 3. Print the public and private records as JSON
//!
//! `inspect` reloads previously printed records without the shard bytes.

use anyhow::{Context, Result};
use audit_tools::config::{self, AuditConfig};
use audit_tools::shard::audit_files_batch;
use audit_tools::{AuditRecords, AuditStream};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Shard proof-of-retrievability audit precomputation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (falls back to AUDIT_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate challenges and records for one or more shard files
    Generate {
        /// Shard files to audit
        #[arg(required = true)]
        shards: Vec<PathBuf>,

        /// Number of challenges per shard (overrides config file)
        #[arg(short = 'n', long)]
        challenges: Option<usize>,

        /// Read chunk size in bytes (overrides config file)
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Rebuild an audit from a JSON record file and print its summary
    Inspect {
        /// JSON file with `public` and `private` records
        records: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Initialize logging
    init_logging(&args.log_level)?;

    info!("🚀 Starting shard audit tools v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Generate {
            shards,
            challenges,
            chunk_size,
        } => {
            // 2. Load configuration, command line arguments override config file
            let mut config = load_configuration(args.config.as_deref())?;
            if let Some(challenges) = challenges {
                config.num_challenges = challenges;
            }
            if let Some(chunk_size) = chunk_size {
                config.chunk_size = chunk_size;
            }
            config::validate_config(&config).context("Invalid audit configuration")?;

            run_generate(&shards, &config).await
        }
        Command::Inspect { records } => run_inspect(&records).await,
    }
}

/// Initialize logging system
///
/// Logs go to stderr so stdout carries only the JSON records.
fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => {
            eprintln!("⚠️  Unknown log level: {}, using INFO", log_level);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Load configuration file
fn load_configuration(config_path: Option<&Path>) -> Result<AuditConfig> {
    match config_path {
        Some(path) if path.exists() => {
            info!("📋 Loading configuration: {}", path.display());
            config::load_config(path).context("Failed to load configuration")
        }
        Some(path) => {
            warn!(
                "Configuration file {} does not exist, using environment/defaults",
                path.display()
            );
            config::load_config_from_env().context("Failed to load configuration from env")
        }
        None => config::load_config_from_env().context("Failed to load configuration from env"),
    }
}

/// Audit every shard concurrently and print one JSON document per shard
async fn run_generate(shards: &[PathBuf], config: &AuditConfig) -> Result<()> {
    info!(
        "🔍 Auditing {} shard(s): {} challenges, {} byte chunks",
        shards.len(),
        config.num_challenges,
        config.chunk_size
    );

    let results = audit_files_batch(shards, config).await;
    let mut failures = 0usize;

    for (path, result) in shards.iter().zip(results) {
        match result {
            Ok(audit) => {
                let json = serde_json::to_string_pretty(&audit)
                    .context("Failed to serialize audit records")?;
                println!("{}", json);
            }
            Err(e) => {
                error!("❌ {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} shard audits failed", failures, shards.len());
    }

    info!("✅ All {} shard audits completed", shards.len());
    Ok(())
}

/// Rebuild an audit from persisted records and print its summary
async fn run_inspect(path: &Path) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read records file {}", path.display()))?;

    let records: AuditRecords =
        serde_json::from_str(&contents).context("Failed to parse audit records")?;

    let audit = AuditStream::from_parts(&records.private, &records.public)
        .context("Records are not self-consistent")?;

    let private = audit.private_record()?;
    println!("state:      {:?}", audit.state());
    println!("root:       {}", private.root);
    println!("depth:      {}", private.depth);
    println!("challenges: {}", audit.num_challenges());
    println!("leaves:     {}", audit.public_record()?.len());

    info!("✅ Records verified: {}", path.display());
    Ok(())
}
