use crate::export_core::{
    aggregator::aggregate,
    balance_extractor::extract_transaction,
    config::{ConfigError, ExportConfig, RuntimeConfig},
    helius_client::{FetchError, HeliusClient, TransactionSource},
    output_writer::create_writer,
    writer_backend::{WriterBackend, WriterError},
};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Writer(#[from] WriterError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub pages: usize,
    pub transactions: usize,
    pub rows_written: usize,
    pub skipped: usize,
    pub interrupted: bool,
}

/// Drain `source`, turning every record into one row. Malformed records are
/// skipped with a warning; fetch and write failures abort the export.
pub async fn export_transactions<S>(
    source: &mut S,
    writer: &mut dyn WriterBackend,
    wallet: &str,
    summary: &mut ExportSummary,
) -> Result<(), ExportError>
where
    S: TransactionSource + ?Sized,
{
    while let Some(page) = source.next_page().await? {
        summary.pages += 1;

        for record in page {
            summary.transactions += 1;
            if process_record(record, wallet, writer, summary).await? {
                summary.rows_written += 1;
            }
        }

        log::info!(
            "📥 Page {}: {} transactions so far, {} rows written",
            summary.pages,
            summary.transactions,
            summary.rows_written
        );
    }

    writer.flush().await?;
    Ok(())
}

async fn process_record(
    record: Value,
    wallet: &str,
    writer: &mut dyn WriterBackend,
    summary: &mut ExportSummary,
) -> Result<bool, ExportError> {
    let row = match extract_transaction(record, wallet).and_then(|tx| aggregate(&tx, wallet)) {
        Ok(row) => row,
        Err(e) => {
            log::warn!("⚠️  Skipping malformed transaction: {}", e);
            summary.skipped += 1;
            return Ok(false);
        }
    };

    log::debug!(
        "{} sent={} {} received={} {} fee={}",
        row.signature,
        row.sent_amount,
        row.sent_currency.as_deref().unwrap_or("-"),
        row.received_amount,
        row.received_currency.as_deref().unwrap_or("-"),
        row.fee_amount
    );

    writer.write(&row).await?;
    Ok(true)
}

/// Full run: validate, fetch every page, write rows. Ctrl-C stops the
/// export early; rows written so far are flushed.
pub async fn run(export_config: ExportConfig, runtime_config: RuntimeConfig) -> Result<ExportSummary, ExportError> {
    export_config.validate()?;

    log::info!("🚀 Exporting transactions for {}", export_config.address);
    log::info!("   Output: {}", export_config.output_path.display());
    log::info!("   API: {}", runtime_config.api_url);
    if let Some(before) = &export_config.before {
        log::info!("   Before: {}", before);
    }
    if let Some(until) = &export_config.until {
        log::info!("   Until: {}", until);
    }

    let client = HeliusClient::new(&runtime_config)?;
    let mut writer = create_writer(export_config.format, &export_config.output_path)?;
    log::info!("📊 Backend: {}", writer.backend_type());

    let mut pager = client
        .fetch_all(&export_config.address)
        .before(export_config.before.clone())
        .until(export_config.until.clone());

    let mut summary = ExportSummary::default();

    let interrupted = tokio::select! {
        result = export_transactions(&mut pager, writer.as_mut(), &export_config.address, &mut summary) => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        log::warn!("🛑 Interrupted, flushing {} rows written so far", summary.rows_written);
        writer.flush().await?;
        summary.interrupted = true;
    }

    log::info!(
        "✅ Export finished: {} pages, {} transactions, {} rows, {} skipped",
        summary.pages,
        summary.transactions,
        summary.rows_written,
        summary.skipped
    );

    Ok(summary)
}
