//! Export a Solana wallet's transaction history (Helius enhanced
//! transactions) to CSV, one row per transaction.

pub mod export_core;

pub use export_core::{run, ExportConfig, ExportError, ExportSummary, OutputFormat, RuntimeConfig};
