//! Domain models for token transfers.
//!
//! These models are chain-client agnostic and represent the canonical
//! form of transfer data within the domain layer.

mod amount;
mod transfer;

pub use amount::*;
pub use transfer::*;

pub use alloy_primitives::{Address, TxHash, U256};

use crate::error::AddressError;

// =============================================================================
// Address Input
// =============================================================================

/// Parse and checksum-validate a textual address.
///
/// Parsing never coerces: a `0x` prefix and exactly 40 hex digits are
/// required, and a mixed-case body must carry a valid EIP-55 checksum.
/// All-lowercase and all-uppercase bodies carry no checksum and are accepted.
pub fn parse_address(s: &str) -> Result<Address, AddressError> {
    let body = s.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;
    if body.len() != 40 {
        return Err(AddressError::InvalidLength(body.len()));
    }
    if !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidHex);
    }

    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(s, None).map_err(|_| AddressError::BadChecksum);
    }
    s.parse().map_err(|_| AddressError::InvalidHex)
}

/// Whether `s` parses as an address.
pub fn is_valid_address(s: &str) -> bool {
    parse_address(s).is_ok()
}

// =============================================================================
// Tests
// =============================================================================
