//! ABI helpers for the handful of ERC-20 calls the adapter makes.
//!
//! Return data comes from an arbitrary user-chosen contract: every offset
//! and length read from it is bounds-checked before use.

use courier_core::error::{ChainError, ChainResult};
use courier_core::models::{Address, U256};

/// `balanceOf(address)`
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// `decimals()`
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];
/// `symbol()`
pub const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
/// `name()`
pub const NAME_SELECTOR: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];
/// `Error(string)` revert payload
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

const WORD: usize = 32;

/// Calldata for `balanceOf(owner)`.
pub fn balance_of(owner: &Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&BALANCE_OF_SELECTOR);
    data.extend_from_slice(owner.into_word().as_slice());
    data
}

/// Decode a `uint256` return value.
pub fn decode_u256(data: &[u8]) -> ChainResult<U256> {
    Ok(U256::from_be_slice(word_at(data, 0)?))
}

/// Decode a `uint8` return value.
pub fn decode_u8(data: &[u8]) -> ChainResult<u8> {
    let value = decode_u256(data)?;
    u8::try_from(value).map_err(|_| ChainError::Decode(format!("uint8 out of range: {value}")))
}

/// Decode a `string` return value.
///
/// Some older tokens return `bytes32` instead; that form is accepted with
/// trailing zero bytes stripped.
pub fn decode_string(data: &[u8]) -> ChainResult<String> {
    if data.len() == WORD {
        let end = data.iter().position(|b| *b == 0).unwrap_or(WORD);
        return String::from_utf8(data[..end].to_vec())
            .map_err(|e| ChainError::Decode(format!("bytes32 string: {e}")));
    }

    let offset = word_to_usize(word_at(data, 0)?)?;
    let start = offset
        .checked_add(WORD)
        .ok_or_else(|| ChainError::Decode("string offset overflows".into()))?;
    let len_word = data
        .get(offset..start)
        .ok_or_else(|| ChainError::Decode("string offset out of bounds".into()))?;
    let len = word_to_usize(len_word)?;
    let end = start
        .checked_add(len)
        .ok_or_else(|| ChainError::Decode("string length overflows".into()))?;
    let bytes = data
        .get(start..end)
        .ok_or_else(|| ChainError::Decode("string length out of bounds".into()))?;

    String::from_utf8(bytes.to_vec()).map_err(|e| ChainError::Decode(format!("string: {e}")))
}

/// Reason carried by an `Error(string)` revert payload.
pub fn decode_revert(data: &[u8]) -> Option<String> {
    let payload = data.strip_prefix(&ERROR_SELECTOR)?;
    decode_string(payload).ok()
}

/// Parse a hex quantity such as `"0x1a"`.
pub fn parse_quantity(s: &str) -> ChainResult<U256> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::Decode(format!("quantity without 0x: {s}")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).map_err(|e| ChainError::Decode(format!("quantity {s}: {e}")))
}

/// Parse a hex quantity that must fit in a `u64` (gas, block numbers, chain id).
pub fn parse_u64_quantity(s: &str) -> ChainResult<u64> {
    let value = parse_quantity(s)?;
    u64::try_from(value).map_err(|_| ChainError::Decode(format!("quantity out of range: {s}")))
}

/// Render a hex quantity.
pub fn to_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

/// Parse hex call output.
pub fn parse_bytes(s: &str) -> ChainResult<Vec<u8>> {
    hex::decode(s.trim_start_matches("0x")).map_err(|e| ChainError::Decode(format!("hex: {e}")))
}

fn word_at(data: &[u8], index: usize) -> ChainResult<&[u8]> {
    data.get(index * WORD..(index + 1) * WORD)
        .ok_or_else(|| ChainError::Decode(format!("expected {} bytes, got {}", (index + 1) * WORD, data.len())))
}

fn word_to_usize(word: &[u8]) -> ChainResult<usize> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(ChainError::Decode("offset too large".into()));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(low))
        .map_err(|_| ChainError::Decode("offset too large".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(value: u64) -> Vec<u8> {
        U256::from(value).to_be_bytes::<32>().to_vec()
    }

    fn abi_string(s: &str) -> Vec<u8> {
        let mut data = word(32);
        data.extend(word(s.len() as u64));
        let mut body = s.as_bytes().to_vec();
        body.resize(s.len().div_ceil(32) * 32, 0);
        data.extend(body);
        data
    }

    #[test]
    fn test_balance_of_calldata() {
        let data = balance_of(&Address::repeat_byte(0x11));
        assert_eq!(data.len(), 36);
        assert_eq!(hex::encode(&data[..4]), "70a08231");
        assert_eq!(&data[16..], &[0x11; 20]);
    }

    #[test]
    fn test_decode_integers() {
        assert_eq!(decode_u256(&word(5_000_000)).unwrap(), U256::from(5_000_000u64));
        assert_eq!(decode_u8(&word(18)).unwrap(), 18);
        assert!(decode_u8(&word(256)).is_err());
        assert!(decode_u256(&[0u8; 4]).is_err());
    }

    // Test critique: un solde au-delà de u128 reste exact
    #[test]
    fn test_decode_full_width_balance() {
        let mut data = vec![0u8; 32];
        data[15] = 0x01;
        assert_eq!(decode_u256(&data).unwrap(), U256::from(1u8) << 128usize);
        assert_eq!(decode_u256(&[0xff; 32]).unwrap(), U256::MAX);
    }

    #[test]
    fn test_decode_string_and_bytes32() {
        assert_eq!(decode_string(&abi_string("ZEN")).unwrap(), "ZEN");

        let mut legacy = b"MKR".to_vec();
        legacy.resize(32, 0);
        assert_eq!(decode_string(&legacy).unwrap(), "MKR");

        let mut truncated = abi_string("ZEN");
        truncated.truncate(64);
        assert!(decode_string(&truncated).is_err());
    }

    // Test critique: des offsets hostiles donnent une erreur, jamais un panic
    #[test]
    fn test_decode_string_hostile_offsets() {
        let mut data = word(u64::MAX - 4);
        data.extend(word(3));
        assert!(matches!(decode_string(&data), Err(ChainError::Decode(_))));

        let mut data = word(32);
        data.extend(word(u64::MAX - 4));
        assert!(matches!(decode_string(&data), Err(ChainError::Decode(_))));

        let mut data = word(32);
        data.extend(word(u64::MAX));
        data.extend([0u8; 32]);
        assert!(matches!(decode_string(&data), Err(ChainError::Decode(_))));
    }

    #[test]
    fn test_decode_revert_reason() {
        let mut data = ERROR_SELECTOR.to_vec();
        data.extend(abi_string("ERC20: transfer amount exceeds balance"));
        assert_eq!(
            decode_revert(&data).as_deref(),
            Some("ERC20: transfer amount exceeds balance")
        );
        assert_eq!(decode_revert(&[0xde, 0xad, 0xbe, 0xef]), None);
    }

    #[test]
    fn test_quantities() {
        assert_eq!(parse_quantity("0x1a").unwrap(), U256::from(26u8));
        assert_eq!(parse_quantity("0x").unwrap(), U256::ZERO);
        assert!(parse_quantity("26").is_err());
        assert_eq!(parse_u64_quantity("0xea60").unwrap(), 60_000);
        assert!(parse_u64_quantity(&format!("0x1{}", "0".repeat(16))).is_err());
        assert_eq!(to_quantity(U256::from(26u8)), "0x1a");
        assert_eq!(to_quantity(U256::ZERO), "0x0");
    }
}
