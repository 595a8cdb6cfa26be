//! AttestIndex CLI — the production command-line interface for AttestIndex.
//!
//! # Commands
//! ```
//! attestindex backfill --contract <addr> --explorer-url <url> --rpc-url <url>
//! attestindex watch    --contract <addr> --rpc-url <url> --ws-url <url>
//! attestindex decode   --calldata <hex>
//! attestindex info
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing::info;

use attestindex_core::{IndexerConfig, SinkSchema};
use attestindex_evm::{checksum, decode_attestation_data, normalize_subject, AttestCallDecoder};
use attestindex_pipeline::{Pipeline, PipelineMetrics};
use attestindex_sink::FileSink;
use attestindex_source::{BlockSubscription, ExplorerClient, ProviderClient, TransactionFetcher};

mod logging;

#[derive(Parser)]
#[command(
    name = "attestindex",
    about = "On-chain attestation indexer — AttestIndex CLI",
    long_about = "
AttestIndex CLI: index attest() transactions sent to an attestation registry
contract into JSONL and CSV artifacts. Built on alloy-rs.

ENVIRONMENT VARIABLES:
  ATTESTINDEX_EXPLORER_KEY   Explorer API key (for backfill)
",
    version
)]
struct Cli {
    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log filter directives, e.g. "info,attestindex_source=debug"
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit JSON structured logs
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by the two indexing commands. Every flag is optional; a
/// value given on the command line overrides the config file.
#[derive(Args)]
struct SharedArgs {
    /// Attestation registry contract address (0x…)
    #[arg(long)]
    contract: Option<String>,

    /// JSON-RPC HTTP endpoint
    #[arg(long)]
    rpc_url: Option<String>,

    /// Structured (JSONL) artifact path
    #[arg(long)]
    jsonl: Option<PathBuf>,

    /// Tabular (CSV) artifact path
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Output schema: raw-fields (v1) or feedback-counters (v2)
    #[arg(long)]
    schema: Option<SinkSchema>,

    /// Number of decode workers
    #[arg(long)]
    workers: Option<usize>,

    /// Capacity of the bounded transaction queue
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// JSON config file with the same fields as the flags
    #[arg(long)]
    config: Option<String>,
}

#[derive(Args)]
struct BackfillArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Etherscan-compatible explorer API base URL
    #[arg(long)]
    explorer_url: Option<String>,

    /// Explorer API key (overrides ATTESTINDEX_EXPLORER_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// First block of the backfill window
    #[arg(long)]
    start_block: Option<u64>,

    /// Last block of the backfill window
    #[arg(long)]
    end_block: Option<u64>,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// JSON-RPC WebSocket endpoint for the newHeads subscription
    #[arg(long)]
    ws_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Index historical attestations from an explorer transaction listing
    Backfill(BackfillArgs),

    /// Follow new blocks over WebSocket and index attestations live
    Watch(WatchArgs),

    /// Decode attest() calldata offline and print the result
    Decode {
        /// Raw calldata (0x-prefixed hex)
        #[arg(long)]
        calldata: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show build, selector, and schema info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        cli.log_level.clone()
    };
    logging::init_tracing(&logging::LogConfig {
        level,
        json: cli.log_json,
    });

    match cli.command {
        Commands::Backfill(args) => cmd_backfill(args).await,
        Commands::Watch(args) => cmd_watch(args).await,
        Commands::Decode { calldata, json } => cmd_decode(&calldata, json),
        Commands::Info => cmd_info(),
    }
}

// ─── Command implementations ─────────────────────────────────────────────────

async fn cmd_backfill(args: BackfillArgs) -> Result<()> {
    let mut config = resolve_config(&args.shared)?;
    if let Some(explorer_url) = &args.explorer_url {
        config.explorer_url = explorer_url.clone();
    }
    config.explorer_api_key = args
        .api_key
        .clone()
        .or(config.explorer_api_key)
        .or_else(|| std::env::var("ATTESTINDEX_EXPLORER_KEY").ok());
    if args.start_block.is_some() {
        config.start_block = args.start_block;
    }
    if args.end_block.is_some() {
        config.end_block = args.end_block;
    }
    if config.explorer_url.is_empty() {
        bail!("no explorer endpoint: pass --explorer-url or set it in the config file");
    }

    let contract = parse_contract(&config.contract)?;

    let explorer = ExplorerClient::new(&config)?;
    let refs = explorer.fetch_contract_txs().await?;
    println!(
        "Explorer listed {} transactions for {}",
        refs.len(),
        config.contract
    );

    let provider = Arc::new(ProviderClient::new(config.rpc_http_url.clone())?);
    let decoder = AttestCallDecoder::new(contract)?;
    let sink = FileSink::create(&config.jsonl_path, &config.csv_path, config.sink_schema)?;
    let pipeline = Arc::new(Pipeline::new(decoder, provider, &config));

    let metrics = pipeline.backfill(refs, Box::new(sink)).await?;
    print_summary(&config, &metrics);
    Ok(())
}

async fn cmd_watch(args: WatchArgs) -> Result<()> {
    let mut config = resolve_config(&args.shared)?;
    if let Some(ws_url) = &args.ws_url {
        config.rpc_ws_url = Some(ws_url.clone());
    }
    let ws_url = config
        .rpc_ws_url
        .clone()
        .ok_or_else(|| anyhow!("no WebSocket endpoint: pass --ws-url or set it in the config file"))?;

    let contract = parse_contract(&config.contract)?;

    let provider = Arc::new(ProviderClient::new(config.rpc_http_url.clone())?);
    let decoder = AttestCallDecoder::new(contract)?;
    let sink = FileSink::create(&config.jsonl_path, &config.csv_path, config.sink_schema)?;
    let pipeline = Arc::new(Pipeline::new(
        decoder,
        Arc::clone(&provider) as Arc<dyn TransactionFetcher>,
        &config,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, draining pipeline");
            let _ = shutdown_tx.send(true);
        }
    });

    let (refs_tx, refs_rx) = mpsc::channel(config.queue_capacity.max(1));
    let subscription = BlockSubscription::new(ws_url, config.contract.clone(), provider);
    let listener = tokio::spawn(async move { subscription.run(refs_tx, shutdown_rx).await });

    println!(
        "Watching {} for attestations (Ctrl-C to stop)",
        config.contract
    );
    let metrics = pipeline.run(refs_rx, Box::new(sink)).await?;
    listener.await??;

    print_summary(&config, &metrics);
    Ok(())
}

fn cmd_decode(calldata: &str, as_json: bool) -> Result<()> {
    let bytes = hex::decode(calldata.strip_prefix("0x").unwrap_or(calldata))
        .context("invalid calldata hex")?;

    // Offline decode has no transaction context, so address the call to the
    // decoder's own contract to pass the destination filter.
    let decoder = AttestCallDecoder::new(Address::ZERO)?;
    let to = format!("{:#x}", decoder.contract());
    let call = decoder
        .decode(Some(&to), &bytes)?
        .ok_or_else(|| anyhow!("empty calldata"))?;

    let payload = decode_attestation_data(&call.payload.attestation_data)?;
    let subject = normalize_subject(&call.payload.subject)?;

    if as_json {
        let value = serde_json::json!({
            "schemaId": format!("0x{}", hex::encode(call.payload.schema_id)),
            "expirationDate": call.payload.expiration_date,
            "subject": checksum(subject),
            "validationPayloads": call.validation_payloads.len(),
            "attestation": payload.as_ref().map(|p| serde_json::json!({
                "isPositive": p.is_positive,
                "articlePage": p.article_page,
                "submitter": checksum(p.submitter),
            })),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Schema ID:  0x{}", hex::encode(call.payload.schema_id));
        println!("Expiration: {}", call.payload.expiration_date);
        println!("Subject:    {}", checksum(subject));
        match &payload {
            Some(p) => {
                println!("Positive:   {}", p.is_positive);
                println!("Article:    {}", p.article_page);
                println!("Submitter:  {}", checksum(p.submitter));
            }
            None => println!("Attestation: (no data)"),
        }
    }
    Ok(())
}

fn cmd_info() -> Result<()> {
    let decoder = AttestCallDecoder::new(Address::ZERO)?;
    println!("attestindex {}", env!("CARGO_PKG_VERSION"));
    println!("attest selector: 0x{}", hex::encode(decoder.selector()));
    for schema in [SinkSchema::RawFields, SinkSchema::FeedbackCounters] {
        println!("schema {schema}: {}", schema.columns().join(", "));
    }
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Load the config file if one was given, then apply flag overrides.
fn resolve_config(shared: &SharedArgs) -> Result<IndexerConfig> {
    let mut config: IndexerConfig = match &shared.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read config file '{path}'"))?;
            serde_json::from_str(&raw).with_context(|| format!("parse config file '{path}'"))?
        }
        None => IndexerConfig::default(),
    };

    if let Some(contract) = &shared.contract {
        config.contract = contract.clone();
    }
    if let Some(rpc_url) = &shared.rpc_url {
        config.rpc_http_url = rpc_url.clone();
    }
    if let Some(jsonl) = &shared.jsonl {
        config.jsonl_path = jsonl.clone();
    }
    if let Some(csv) = &shared.csv {
        config.csv_path = csv.clone();
    }
    if let Some(schema) = shared.schema {
        config.sink_schema = schema;
    }
    if let Some(workers) = shared.workers {
        config.workers = workers;
    }
    if let Some(queue_capacity) = shared.queue_capacity {
        config.queue_capacity = queue_capacity;
    }

    if config.contract.is_empty() {
        bail!("no contract address: pass --contract or set it in the config file");
    }
    if config.rpc_http_url.is_empty() {
        bail!("no JSON-RPC endpoint: pass --rpc-url or set it in the config file");
    }

    Ok(config)
}

fn parse_contract(raw: &str) -> Result<Address> {
    raw.parse()
        .map_err(|_| anyhow!("invalid contract address '{raw}'"))
}

fn print_summary(config: &IndexerConfig, metrics: &PipelineMetrics) {
    println!("Run complete:");
    println!("  records written : {}", metrics.records_written);
    println!("  skipped         : {}", metrics.transactions_skipped);
    println!("  decode errors   : {}", metrics.decode_errors);
    println!("  fetch errors    : {}", metrics.fetch_errors);
    println!("  JSONL           : {}", config.jsonl_path.display());
    println!("  CSV             : {}", config.csv_path.display());
}
