use crate::export_core::balance_extractor::MalformedTransaction;
use crate::export_core::types::{cmp_magnitude, BalanceChange, RawTransaction};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Summed movement of one currency in one direction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Leg {
    /// Always non-negative
    pub amount: Decimal,
    /// Counterparty of the largest single movement in this leg
    pub counterparty: Option<String>,
    largest: Decimal,
}

impl Leg {
    /// Returns `None` if the running total overflows
    fn absorb(&mut self, magnitude: Decimal, counterparty: Option<&String>) -> Option<()> {
        self.amount = self.amount.checked_add(magnitude)?;

        // Ties break on the smallest address so input order never matters
        let replace = match cmp_magnitude(&magnitude, &self.largest) {
            Ordering::Greater => true,
            Ordering::Equal => match (counterparty, self.counterparty.as_ref()) {
                (Some(candidate), Some(current)) => candidate < current,
                (Some(_), None) => true,
                _ => false,
            },
            Ordering::Less => false,
        };

        if replace {
            self.largest = magnitude;
            self.counterparty = counterparty.cloned();
        }
        Some(())
    }
}

/// Sent and received buckets for one transaction, keyed by mint
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    pub sent: BTreeMap<String, Leg>,
    pub received: BTreeMap<String, Leg>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.received.is_empty()
    }
}

/// Split a transaction's balance changes into sent (negative) and received
/// (positive) buckets. Zero changes and changes whose counterparty is the
/// wallet itself are ignored.
pub fn classify(tx: &RawTransaction, wallet: &str) -> Result<Classification, MalformedTransaction> {
    let mut classification = Classification::default();

    for change in &tx.changes {
        if change.amount.is_zero() || change.counterparty.as_deref() == Some(wallet) {
            continue;
        }

        let bucket = if change.is_outflow() {
            &mut classification.sent
        } else {
            &mut classification.received
        };

        record(bucket, change).ok_or_else(|| MalformedTransaction::AmountOverflow {
            signature: tx.signature.clone(),
            mint: change.mint.clone(),
        })?;
    }

    Ok(classification)
}

fn record(bucket: &mut BTreeMap<String, Leg>, change: &BalanceChange) -> Option<()> {
    bucket
        .entry(change.mint.clone())
        .or_default()
        .absorb(change.amount.abs(), change.counterparty.as_ref())
}
