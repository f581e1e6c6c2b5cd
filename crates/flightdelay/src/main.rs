use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use flightdelay_classifier::{classify, fields, Classification, FlightRecord};
use flightdelay_core::config::PipelineConfig;
use flightdelay_core::{batch, stream};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Flight delay enrichment pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "FLIGHTDELAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify the raw object row by row and upload the processed CSV
    Stream(StorageArgs),
    /// Enrich the whole dataset, publish it and run the aggregate reports
    Batch(BatchArgs),
    /// Classify one record and print the outcome
    Classify(ClassifyArgs),
}

#[derive(Args, Debug, Default)]
struct StorageArgs {
    /// Serve the bucket from a local directory instead of S3
    #[arg(long)]
    local_dir: Option<PathBuf>,
    /// Bucket name
    #[arg(long)]
    bucket: Option<String>,
    /// Key of the raw CSV object
    #[arg(long)]
    raw_key: Option<String>,
    /// Key for the processed CSV written by `stream`
    #[arg(long)]
    processed_key: Option<String>,
}

#[derive(Args, Debug, Default)]
struct BatchArgs {
    #[command(flatten)]
    storage: StorageArgs,
    /// Key for the enriched dataset
    #[arg(long)]
    transformed_key: Option<String>,
    /// Prefix for report objects
    #[arg(long)]
    reports_prefix: Option<String>,
    /// Print each report table to stdout
    #[arg(long)]
    show_reports: bool,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Scheduled departure, e.g. 2024-01-01T09:30:00
    #[arg(long, default_value = "")]
    departure: String,
    /// Delay in minutes
    #[arg(long, default_value = "")]
    delay_minutes: String,
    /// Delay reason
    #[arg(long, default_value = "")]
    reason: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Stream(args) => handle_stream(cli.config, args).await,
        Command::Batch(args) => handle_batch(cli.config, args).await,
        Command::Classify(args) => handle_classify(args),
    }
}

fn load_config(path: Option<PathBuf>, storage: &StorageArgs) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let mut config =
        PipelineConfig::load(path.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = &storage.local_dir {
        config.storage.local_dir = Some(dir.clone());
    }
    if let Some(bucket) = &storage.bucket {
        config.storage.s3.bucket = bucket.clone();
    }
    if let Some(key) = &storage.raw_key {
        config.keys.raw = key.clone();
    }
    if let Some(key) = &storage.processed_key {
        config.keys.processed = key.clone();
    }
    Ok(config)
}

async fn handle_stream(path: Option<PathBuf>, args: StorageArgs) -> Result<()> {
    let config = load_config(path, &args)?;
    let store = config
        .storage
        .connect()
        .await
        .context("failed to connect to object storage")?;

    let response = stream::handle_event(store.as_ref(), &config.keys).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        bail!("stream transform failed with status {}", response.status_code);
    }
    Ok(())
}

async fn handle_batch(path: Option<PathBuf>, args: BatchArgs) -> Result<()> {
    let mut config = load_config(path, &args.storage)?;
    if let Some(key) = args.transformed_key {
        config.keys.transformed = key;
    }
    if let Some(prefix) = args.reports_prefix {
        config.keys.reports_prefix = prefix;
    }

    let store = config
        .storage
        .connect()
        .await
        .context("failed to connect to object storage")?;

    let run = batch::run_batch(store.as_ref(), &config.keys)
        .await
        .context("batch run failed")?;

    if args.show_reports {
        for report in &run.reports {
            println!("{}\n{}\n", report.kind.title(), report.frame);
        }
    }
    println!("{}", serde_json::to_string_pretty(&run.summary)?);
    info!(run_id = %run.summary.run_id, "batch complete");
    Ok(())
}

fn handle_classify(args: ClassifyArgs) -> Result<()> {
    let record = FlightRecord::from_pairs([
        (fields::SCHEDULED_DEPARTURE, args.departure),
        (fields::DELAY_MINUTES, args.delay_minutes),
        (fields::DELAY_REASON, args.reason),
    ]);

    let output = match classify(record) {
        Classification::Accepted(enriched) => json!({
            "status": "accepted",
            "record": enriched.record,
            "derived": enriched.derived,
        }),
        Classification::Rejected(rejection) => json!({
            "status": "rejected",
            "reason": rejection.reason.code(),
            "message": rejection.reason.to_string(),
            "record": rejection.record,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
