//! Wire types for Helius enhanced transactions and the domain types the
//! exporter derives from them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Pseudo-mint used for native SOL movements
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Fee currency label written to every row
pub const FEE_CURRENCY: &str = "SOL";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Scale applied to UI (float) token amounts when no raw amount is given
pub const UI_DECIMALS: u32 = 9;

// ---------------------------------------------------------------------------
// Helius enhanced transaction (subset of fields used by the exporter)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedTransaction {
    pub signature: String,
    pub timestamp: i64,
    pub fee: u64,
    #[serde(default)]
    pub fee_payer: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub native_transfers: Option<Vec<NativeTransfer>>,
    #[serde(default)]
    pub token_transfers: Option<Vec<TokenTransfer>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    /// Lamports
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    pub mint: String,
    /// UI amount (already divided by decimals)
    #[serde(default)]
    pub token_amount: Option<f64>,
    #[serde(default)]
    pub raw_token_amount: Option<RawTokenAmount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenAmount {
    pub token_amount: String,
    pub decimals: u8,
}

/// Native SOL movements in lamports, as an exact decimal
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}

/// Compare absolute values
pub fn cmp_magnitude(a: &Decimal, b: &Decimal) -> Ordering {
    a.abs().cmp(&b.abs())
}

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// One movement of value relative to the exported wallet.
/// Negative amounts left the wallet, positive amounts arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceChange {
    pub mint: String,
    pub amount: Decimal,
    pub counterparty: Option<String>,
}

impl BalanceChange {
    pub fn is_inflow(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    pub fn is_outflow(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub signature: String,
    pub block_time: DateTime<Utc>,
    /// Lamports
    pub fee: u64,
    pub fee_payer: Option<String>,
    pub changes: Vec<BalanceChange>,
}

/// One output row per transaction. Amounts are normalized (no trailing
/// zeros) and serialize as decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub date: DateTime<Utc>,
    pub signature: String,
    pub source: String,
    pub destination: String,
    pub sent_amount: Decimal,
    pub sent_currency: Option<String>,
    pub received_amount: Decimal,
    pub received_currency: Option<String>,
    pub fee_amount: Decimal,
    pub fee_currency: String,
}
