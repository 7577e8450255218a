//! Collapse a classified transaction into one export row.
//!
//! A currency that appears on both sides is netted first, so a round trip of
//! the same mint inside one transaction is never counted twice. When several
//! currencies remain on one side, the largest (compared at a common scale) is
//! reported as primary; ties go to the smallest mint. This is a provisional
//! heuristic for multi-asset trades.

use crate::export_core::balance_extractor::MalformedTransaction;
use crate::export_core::classifier::{classify, Classification, Leg};
use crate::export_core::types::{cmp_magnitude, lamports_to_sol, ExportRow, RawTransaction, FEE_CURRENCY};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub fn aggregate(tx: &RawTransaction, wallet: &str) -> Result<ExportRow, MalformedTransaction> {
    let classification = classify(tx, wallet)?;
    Ok(build_row(tx, wallet, classification))
}

pub fn build_row(tx: &RawTransaction, wallet: &str, classification: Classification) -> ExportRow {
    let Classification { mut sent, mut received } = net_opposing(classification);

    let dropped = sent.len().saturating_sub(1) + received.len().saturating_sub(1);
    if dropped > 0 {
        log::debug!(
            "{}: multi-asset transaction, {} secondary legs not reported",
            tx.signature,
            dropped
        );
    }

    let sent_primary = take_primary(&mut sent);
    let received_primary = take_primary(&mut received);

    let (source, destination) = match (&sent_primary, &received_primary) {
        (Some((_, leg)), _) => (wallet.to_string(), leg.counterparty.clone().unwrap_or_default()),
        (None, Some((_, leg))) => (leg.counterparty.clone().unwrap_or_default(), wallet.to_string()),
        (None, None) => (
            tx.fee_payer.clone().unwrap_or_else(|| wallet.to_string()),
            String::new(),
        ),
    };

    let (sent_amount, sent_currency) = split(sent_primary);
    let (received_amount, received_currency) = split(received_primary);

    ExportRow {
        date: tx.block_time,
        signature: tx.signature.clone(),
        source,
        destination,
        sent_amount,
        sent_currency,
        received_amount,
        received_currency,
        fee_amount: fee_for(tx, wallet),
        fee_currency: FEE_CURRENCY.to_string(),
    }
}

/// Fee is charged to the row when the wallet paid it (or the payer is unknown)
pub fn fee_for(tx: &RawTransaction, wallet: &str) -> Decimal {
    match tx.fee_payer.as_deref() {
        Some(payer) if payer != wallet => Decimal::ZERO,
        _ => lamports_to_sol(tx.fee).normalize(),
    }
}

fn net_opposing(classification: Classification) -> Classification {
    let Classification { mut sent, mut received } = classification;

    let both: Vec<String> = sent
        .keys()
        .filter(|mint| received.contains_key(*mint))
        .cloned()
        .collect();

    for mint in both {
        let (Some(mut out_leg), Some(mut in_leg)) = (sent.remove(&mint), received.remove(&mint)) else {
            continue;
        };

        match cmp_magnitude(&in_leg.amount, &out_leg.amount) {
            Ordering::Greater => {
                in_leg.amount = in_leg.amount - out_leg.amount;
                received.insert(mint, in_leg);
            }
            Ordering::Less => {
                out_leg.amount = out_leg.amount - in_leg.amount;
                sent.insert(mint, out_leg);
            }
            Ordering::Equal => {}
        }
    }

    Classification { sent, received }
}

/// Largest leg by magnitude; the map is ordered so equal magnitudes keep the
/// smallest mint.
fn take_primary(bucket: &mut BTreeMap<String, Leg>) -> Option<(String, Leg)> {
    let mut best: Option<(&String, &Leg)> = None;
    for (mint, leg) in bucket.iter() {
        best = match best {
            Some((_, current)) if cmp_magnitude(&leg.amount, &current.amount) != Ordering::Greater => best,
            _ => Some((mint, leg)),
        };
    }

    let mint = best.map(|(mint, _)| mint.clone())?;
    bucket.remove_entry(&mint)
}

fn split(primary: Option<(String, Leg)>) -> (Decimal, Option<String>) {
    match primary {
        Some((mint, leg)) => (leg.amount.normalize(), Some(mint)),
        None => (Decimal::ZERO, None),
    }
}
