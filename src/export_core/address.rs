//! Syntactic checks for wallet addresses and transaction signatures.
//!
//! Addresses are base58 encoded 32-byte public keys (32-44 characters).
//! Signatures are base58 encoded 64-byte ed25519 signatures.

use solana_pubkey::Pubkey;
use std::str::FromStr;

const SIGNATURE_LEN: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("invalid signature '{signature}': {reason}")]
    InvalidSignature { signature: String, reason: String },
}

pub fn validate_address(address: &str) -> Result<Pubkey, AddressError> {
    let invalid = |reason: String| AddressError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    if address.len() < 32 || address.len() > 44 {
        return Err(invalid(format!(
            "must be 32-44 characters (base58 Pubkey), got {}",
            address.len()
        )));
    }

    Pubkey::from_str(address).map_err(|e| invalid(e.to_string()))
}

pub fn validate_signature(signature: &str) -> Result<(), AddressError> {
    let invalid = |reason: String| AddressError::InvalidSignature {
        signature: signature.to_string(),
        reason,
    };

    let bytes = bs58::decode(signature)
        .into_vec()
        .map_err(|e| invalid(format!("base58 decode failed: {e}")))?;

    if bytes.len() != SIGNATURE_LEN {
        return Err(invalid(format!("expected {} bytes, got {}", SIGNATURE_LEN, bytes.len())));
    }

    Ok(())
}
