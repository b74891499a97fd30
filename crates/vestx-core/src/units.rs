//! Conversion between decimal token strings and base units.
//!
//! Integer arithmetic only: `"0.5"` is parsed digit by digit, never through
//! a float.

use crate::constants::{TOKEN_DECIMALS, UNITS_PER_TOKEN};
use crate::error::VestxError;
use crate::types::Amount;

/// Parse `"100000"`, `"0.25"` or `"1."` into base units.
pub fn parse_token_amount(s: &str) -> Result<Amount, VestxError> {
    let s = s.trim();
    let bad = || VestxError::InvalidTokenAmount(s.to_string());

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(bad());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad());
    }
    if frac.len() > TOKEN_DECIMALS as usize {
        return Err(bad());
    }

    let whole_units: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse::<Amount>().map_err(|_| bad())?
    };
    let frac_units: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = TOKEN_DECIMALS as usize);
        padded.parse::<Amount>().map_err(|_| bad())?
    };

    whole_units
        .checked_mul(UNITS_PER_TOKEN)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or(VestxError::MathOverflow)
}

/// Render base units as a decimal token string without trailing zeros.
pub fn format_token_amount(amount: Amount) -> String {
    let whole = amount / UNITS_PER_TOKEN;
    let frac = amount % UNITS_PER_TOKEN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:0>width$}", frac, width = TOKEN_DECIMALS as usize);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_tokens() {
        assert_eq!(parse_token_amount("300001").unwrap(), 300_001 * UNITS_PER_TOKEN);
        assert_eq!(parse_token_amount(" 1 ").unwrap(), UNITS_PER_TOKEN);
    }

    #[test]
    fn parses_fractions() {
        assert_eq!(parse_token_amount("0.5").unwrap(), UNITS_PER_TOKEN / 2);
        assert_eq!(parse_token_amount(".000000000000000001").unwrap(), 1);
        assert_eq!(parse_token_amount("2.").unwrap(), 2 * UNITS_PER_TOKEN);
    }

    #[test]
    fn rejects_garbage() {
        for s in ["", ".", "-1", "1e6", "1.2.3", "0.0000000000000000001", "abc"] {
            assert!(parse_token_amount(s).is_err(), "{s:?} should be rejected");
        }
    }

    #[test]
    fn formats_without_trailing_zeros() {
        assert_eq!(format_token_amount(400_000 * UNITS_PER_TOKEN), "400000");
        assert_eq!(format_token_amount(UNITS_PER_TOKEN + UNITS_PER_TOKEN / 4), "1.25");
        assert_eq!(format_token_amount(1), "0.000000000000000001");
        assert_eq!(format_token_amount(0), "0");
    }
}
