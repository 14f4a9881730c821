//! Exact decimal amounts and base-unit scaling.
//!
//! Human amounts are compared and scaled as digit strings. No floating
//! point is involved anywhere between the input field and the calldata.

use std::cmp::Ordering;

use serde::{Serialize, Serializer};

use super::U256;
use crate::error::AmountError;

/// A decimal number in plain notation (`12`, `0.5`, `-3.25`, `.5`).
///
/// Stored normalized: no leading zeros in the integer part, no trailing
/// zeros in the fractional part, zero is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecimalAmount {
    negative: bool,
    int: String,
    frac: String,
}

impl DecimalAmount {
    /// Parse plain decimal notation. Surrounding whitespace is ignored.
    ///
    /// Exponents, thousands separators and anything but one optional sign,
    /// digits and a single `.` are rejected.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let not_a_number = || AmountError::NotANumber(input.to_string());
        let s = input.trim();

        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (int, frac) = match unsigned.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (unsigned, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int.is_empty() && frac.is_empty() {
            return Err(not_a_number());
        }
        if !all_digits(int) || !all_digits(frac) {
            return Err(not_a_number());
        }

        let int = int.trim_start_matches('0').to_string();
        let frac = frac.trim_end_matches('0').to_string();
        let negative = negative && !(int.is_empty() && frac.is_empty());

        Ok(Self {
            negative,
            int,
            frac,
        })
    }

    /// Decimal view of an integer amount of base units.
    pub fn from_base_units(value: U256, decimals: u8) -> Self {
        let digits = value.to_string();
        let decimals = decimals as usize;
        let padded = if digits.len() <= decimals {
            format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int, frac) = padded.split_at(padded.len() - decimals);

        Self {
            negative: false,
            int: int.trim_start_matches('0').to_string(),
            frac: frac.trim_end_matches('0').to_string(),
        }
    }

    /// Scale to integer base units.
    ///
    /// Returns `None` for negative values, values with more fractional
    /// digits than `decimals`, and values that overflow `uint256`.
    pub fn to_base_units(&self, decimals: u8) -> Option<U256> {
        if self.negative || !self.fits_decimals(decimals) {
            return None;
        }
        let decimals = decimals as usize;
        let digits = format!(
            "{}{}{}",
            self.int,
            self.frac,
            "0".repeat(decimals - self.frac.len())
        );
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Some(U256::ZERO);
        }
        U256::from_str_radix(digits, 10).ok()
    }

    /// The fractional part needs no more than `decimals` digits.
    pub fn fits_decimals(&self, decimals: u8) -> bool {
        self.frac.len() <= decimals as usize
    }

    pub fn is_zero(&self) -> bool {
        self.int.is_empty() && self.frac.is_empty()
    }

    /// Strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.negative && !self.is_zero()
    }

    /// Number of significant fractional digits.
    pub fn scale(&self) -> usize {
        self.frac.len()
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.int
            .len()
            .cmp(&other.int.len())
            .then_with(|| self.int.cmp(&other.int))
            .then_with(|| self.frac.cmp(&other.frac))
    }
}

impl Ord for DecimalAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for DecimalAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        if self.int.is_empty() {
            f.write_str("0")?;
        } else {
            f.write_str(&self.int)?;
        }
        if !self.frac.is_empty() {
            write!(f, ".{}", self.frac)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for DecimalAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DecimalAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Render base units as a human decimal string (`1500000000000000000`, 18 → `1.5`).
pub fn format_units(value: U256, decimals: u8) -> String {
    DecimalAmount::from_base_units(value, decimals).to_string()
}

/// Parse a human decimal string into base units.
///
/// Returns `None` when the input is not a non-negative number representable
/// with `decimals` fractional digits.
pub fn parse_units(input: &str, decimals: u8) -> Option<U256> {
    DecimalAmount::parse(input).ok()?.to_base_units(decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> DecimalAmount {
        DecimalAmount::parse(s).unwrap()
    }

    #[test]
    fn parse_accepts_plain_notation() {
        assert_eq!(dec("10").to_string(), "10");
        assert_eq!(dec(" 0.50 ").to_string(), "0.5");
        assert_eq!(dec(".5").to_string(), "0.5");
        assert_eq!(dec("5.").to_string(), "5");
        assert_eq!(dec("007").to_string(), "7");
        assert_eq!(dec("-2.5").to_string(), "-2.5");
        assert_eq!(dec("-0").to_string(), "0");
    }

    #[test]
    fn parse_rejects_non_numeric() {
        for bad in ["", ".", "-", "abc", "1e3", "1,000", "1.2.3", "12abc", "0x10", "--1"] {
            assert!(DecimalAmount::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    // Test critique: comparaison exacte, sans flottants
    #[test]
    fn ordering_is_exact() {
        assert!(dec("10") > dec("5"));
        assert!(dec("0.51") > dec("0.5"));
        assert!(dec("0.6") > dec("0.51"));
        assert!(dec("1.000000000000000001") > dec("1"));
        assert!(dec("-1") < dec("0"));
        assert!(dec("-2") < dec("-1"));
        assert_eq!(dec("5.0").cmp(&dec("5")), Ordering::Equal);
    }

    #[test]
    fn positivity() {
        assert!(dec("0.0001").is_positive());
        assert!(!dec("0").is_positive());
        assert!(!dec("0.000").is_positive());
        assert!(!dec("-3").is_positive());
    }

    #[test]
    fn base_units_scaling() {
        let units = |s: &str| U256::from_str_radix(s, 10).unwrap();
        assert_eq!(parse_units("2", 18), Some(units("2000000000000000000")));
        assert_eq!(parse_units("1.5", 6), Some(U256::from(1_500_000u64)));
        assert_eq!(parse_units("0", 6), Some(U256::ZERO));
        // Too many fractional digits for the token
        assert_eq!(parse_units("0.0000001", 6), None);
        assert!(!dec("0.0000001").fits_decimals(6));
        assert_eq!(parse_units("-1", 6), None);
        // Beyond u128, within uint256
        assert_eq!(
            parse_units("340282366920938463463374607431768211456", 0),
            Some(U256::from(1u8) << 128usize)
        );
        // Overflows uint256
        assert_eq!(parse_units(&"9".repeat(80), 0), None);
    }

    #[test]
    fn format_units_renders_balances() {
        let units = |s: &str| U256::from_str_radix(s, 10).unwrap();
        assert_eq!(format_units(units("5000000000000000000"), 18), "5");
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u8), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(42u8), 0), "42");
        assert_eq!(
            format_units(U256::MAX, 18),
            "115792089237316195423570985008687907853269984665640564039457.584007913129639935"
        );
    }
}
