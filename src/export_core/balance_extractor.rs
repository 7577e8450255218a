use crate::export_core::types::{
    lamports_to_sol, BalanceChange, EnhancedTransaction, RawTransaction, TokenTransfer, SOL_MINT, UI_DECIMALS,
};
use chrono::DateTime;
use rust_decimal::Decimal;
use serde_json::Value;

/// Reasons an API record cannot become a `RawTransaction`
#[derive(Debug, thiserror::Error)]
pub enum MalformedTransaction {
    #[error("undecodable record ({signature}): {source}")]
    Decode {
        signature: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{signature}: timestamp {timestamp} out of range")]
    Timestamp { signature: String, timestamp: i64 },
    #[error("{signature}: token transfer of {mint} has no amount")]
    MissingAmount { signature: String, mint: String },
    #[error("{signature}: transfer of {mint} has unrepresentable amount '{raw}'")]
    InvalidAmount { signature: String, mint: String, raw: String },
    #[error("{signature}: transfer of {mint} names neither sender nor recipient")]
    MissingAccounts { signature: String, mint: String },
    #[error("{signature}: total of {mint} overflows")]
    AmountOverflow { signature: String, mint: String },
    #[error("empty signature")]
    EmptySignature,
}

/// Decode one JSON record from the API and express its transfers relative to
/// `wallet`.
pub fn extract_transaction(record: Value, wallet: &str) -> Result<RawTransaction, MalformedTransaction> {
    let signature_hint = record
        .get("signature")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string();

    let tx: EnhancedTransaction = serde_json::from_value(record).map_err(|source| MalformedTransaction::Decode {
        signature: signature_hint,
        source,
    })?;

    to_raw_transaction(&tx, wallet)
}

pub fn to_raw_transaction(tx: &EnhancedTransaction, wallet: &str) -> Result<RawTransaction, MalformedTransaction> {
    if tx.signature.is_empty() {
        return Err(MalformedTransaction::EmptySignature);
    }

    let block_time = DateTime::from_timestamp(tx.timestamp, 0).ok_or_else(|| MalformedTransaction::Timestamp {
        signature: tx.signature.clone(),
        timestamp: tx.timestamp,
    })?;

    let mut changes = Vec::new();

    for transfer in tx.token_transfers.iter().flatten() {
        let amount = token_amount(transfer, &tx.signature)?;
        if let Some(change) = relative_change(
            &tx.signature,
            wallet,
            &transfer.mint,
            amount,
            transfer.from_user_account.as_deref(),
            transfer.to_user_account.as_deref(),
        )? {
            changes.push(change);
        }
    }

    for transfer in tx.native_transfers.iter().flatten() {
        let amount = lamports_to_sol(transfer.amount);
        if let Some(change) = relative_change(
            &tx.signature,
            wallet,
            SOL_MINT,
            amount,
            transfer.from_user_account.as_deref(),
            transfer.to_user_account.as_deref(),
        )? {
            changes.push(change);
        }
    }

    log::debug!(
        "{}: {} relevant balance changes (type={})",
        tx.signature,
        changes.len(),
        tx.kind.as_deref().unwrap_or("UNKNOWN")
    );

    Ok(RawTransaction {
        signature: tx.signature.clone(),
        block_time,
        fee: tx.fee,
        fee_payer: tx.fee_payer.clone().filter(|p| !p.is_empty()),
        changes,
    })
}

/// Raw amount wins over the UI float when both are present. UI floats are
/// rounded to `UI_DECIMALS` places.
fn token_amount(transfer: &TokenTransfer, signature: &str) -> Result<Decimal, MalformedTransaction> {
    let invalid = |raw: String| MalformedTransaction::InvalidAmount {
        signature: signature.to_string(),
        mint: transfer.mint.clone(),
        raw,
    };

    if let Some(raw) = &transfer.raw_token_amount {
        let value = raw
            .token_amount
            .trim()
            .parse::<i128>()
            .map_err(|_| invalid(raw.token_amount.clone()))?;
        return Decimal::try_from_i128_with_scale(value, u32::from(raw.decimals))
            .map_err(|_| invalid(format!("{} (decimals {})", raw.token_amount, raw.decimals)));
    }

    match transfer.token_amount {
        Some(ui) => Decimal::from_f64_retain(ui)
            .map(|d| d.round_dp(UI_DECIMALS))
            .ok_or_else(|| invalid(ui.to_string())),
        None => Err(MalformedTransaction::MissingAmount {
            signature: signature.to_string(),
            mint: transfer.mint.clone(),
        }),
    }
}

/// Outflows are negative with the recipient as counterparty, inflows positive
/// with the sender as counterparty. Self-transfers and transfers between
/// third parties yield nothing. An empty account is a mint or burn; a missing
/// one on both sides is malformed.
fn relative_change(
    signature: &str,
    wallet: &str,
    mint: &str,
    amount: Decimal,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<BalanceChange>, MalformedTransaction> {
    if from.is_none() && to.is_none() {
        return Err(MalformedTransaction::MissingAccounts {
            signature: signature.to_string(),
            mint: mint.to_string(),
        });
    }

    let from = from.filter(|a| !a.is_empty());
    let to = to.filter(|a| !a.is_empty());
    let magnitude = amount.abs();

    if magnitude.is_zero() {
        return Ok(None);
    }

    let change = match (from == Some(wallet), to == Some(wallet)) {
        (true, false) => Some(BalanceChange {
            mint: mint.to_string(),
            amount: -magnitude,
            counterparty: to.map(str::to_string),
        }),
        (false, true) => Some(BalanceChange {
            mint: mint.to_string(),
            amount: magnitude,
            counterparty: from.map(str::to_string),
        }),
        _ => None,
    };
    Ok(change)
}
