//! Solana CSV Exporter
//!
//! Exports the transaction history of a wallet to CSV using Helius enhanced
//! transactions (native SOL transfers, SPL token transfers and swaps).
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin solana-csv-exporter -- -a <ADDRESS> [-o transactions.csv]
//! ```
//!
//! ## Environment Variables
//!
//! - HELIUS_API_KEY - Helius API key (required, may live in `.env`)
//! - HELIUS_API_URL - API base URL (default: https://api.helius.xyz)
//! - REQUEST_TIMEOUT_SECS - Per-request timeout (default: 30)
//! - MAX_ATTEMPTS - Requests per page, retries on rate limits / transient errors included (default: 5)
//! - BACKOFF_INITIAL_MS / BACKOFF_MAX_MS - Backoff bounds (default: 1000 / 60000)
//! - PAGE_DELAY_MS - Pause between pages (default: 100)
//! - RUST_LOG - Logging level (optional, default: info)

use anyhow::Context;
use clap::Parser;
use solexport::export_core::config::DEFAULT_OUTPUT;
use solexport::{ExportConfig, ExportError, OutputFormat, RuntimeConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Export Solana transaction history to CSV")]
struct Cli {
    /// Solana wallet address
    #[arg(short, long)]
    address: String,

    /// Output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Resume from this signature (exclusive)
    #[arg(long)]
    before: Option<String>,

    /// Stop once this signature is reached
    #[arg(long)]
    until: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let export_config = ExportConfig {
        address: cli.address,
        output_path: cli.output,
        format: cli.format,
        before: cli.before,
        until: cli.until,
    };

    // Both checks happen before any network call
    export_config.validate()?;
    let runtime_config = RuntimeConfig::from_env()?;

    let output_path = export_config.output_path.clone();
    let summary = match solexport::run(export_config, runtime_config).await {
        Ok(summary) => summary,
        Err(ExportError::Writer(e)) => {
            return Err(e).with_context(|| format!("failed to write {}", output_path.display()));
        }
        Err(e) => return Err(e.into()),
    };

    if summary.interrupted {
        anyhow::bail!(
            "Operation cancelled by user ({} rows written to {})",
            summary.rows_written,
            output_path.display()
        );
    }

    println!(
        "Exported {} transactions to {} ({} skipped)",
        summary.rows_written,
        output_path.display(),
        summary.skipped
    );

    Ok(())
}
