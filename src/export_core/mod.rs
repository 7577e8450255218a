pub mod address;
pub mod aggregator;
pub mod balance_extractor;
pub mod classifier;
pub mod config;
pub mod error_handler;
pub mod helius_client;
pub mod output_writer;
pub mod types;
pub mod writer_backend;

mod lib;

pub use config::{ExportConfig, OutputFormat, RuntimeConfig};
pub use helius_client::{HeliusClient, TransactionSource};
pub use lib::{export_transactions, run, ExportError, ExportSummary};
pub use types::ExportRow;
