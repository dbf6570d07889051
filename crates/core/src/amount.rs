//! Minor-currency-unit amounts.
//!
//! Every monetary value in the system is a signed integer in the smallest
//! currency unit (e.g. cents). Floating point never enters the accounting
//! path; decimal strings exist only at the transport boundary.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A signed amount in minor currency units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(value: i64) -> Self {
        Self(value)
    }

    pub const fn minor(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Parse a decimal string in major units ("100", "100.5", "-3.20") into
    /// minor units. At most two fractional digits are accepted.
    pub fn parse_decimal(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(CoreError::invalid_amount(format!("'{s}' is not a number")));
        }
        if frac.len() > 2 {
            return Err(CoreError::invalid_amount(
                "at most two fractional digits are allowed",
            ));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::invalid_amount(format!("'{s}' is not a number")));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| CoreError::invalid_amount("amount out of range"))?
        };
        let mut frac_minor: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse()
                .map_err(|_| CoreError::invalid_amount("amount out of range"))?
        };
        if frac.len() == 1 {
            frac_minor *= 10;
        }

        let minor = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac_minor))
            .ok_or_else(|| CoreError::invalid_amount("amount out of range"))?;

        Ok(Self(if negative { -minor } else { minor }))
    }

    /// Render as a major-unit decimal string ("100.00").
    pub fn to_decimal(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }

    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_forms() {
        assert_eq!(Amount::parse_decimal("100").unwrap(), Amount::from_minor(10_000));
        assert_eq!(Amount::parse_decimal("100.5").unwrap(), Amount::from_minor(10_050));
        assert_eq!(Amount::parse_decimal("100.00").unwrap(), Amount::from_minor(10_000));
        assert_eq!(Amount::parse_decimal("0.07").unwrap(), Amount::from_minor(7));
        assert_eq!(Amount::parse_decimal(".50").unwrap(), Amount::from_minor(50));
        assert_eq!(Amount::parse_decimal("-3.20").unwrap(), Amount::from_minor(-320));
    }

    #[test]
    fn rejects_garbage_and_overflow() {
        for bad in ["", ".", "abc", "1.234", "1,00", "1e3", "NaN"] {
            assert!(
                matches!(Amount::parse_decimal(bad), Err(CoreError::InvalidAmount(_))),
                "expected rejection for {bad:?}"
            );
        }
        assert!(Amount::parse_decimal("99999999999999999999").is_err());
    }

    #[test]
    fn renders_minor_units_as_decimal() {
        assert_eq!(Amount::from_minor(10_000).to_decimal(), "100.00");
        assert_eq!(Amount::from_minor(7).to_decimal(), "0.07");
        assert_eq!(Amount::from_minor(-320).to_decimal(), "-3.20");
        assert_eq!(Amount::ZERO.to_decimal(), "0.00");
    }

    #[test]
    fn round_trips_through_decimal() {
        for minor in [0, 1, 99, 100, 12_345, -12_345, i64::MAX / 100 * 100] {
            let amount = Amount::from_minor(minor);
            assert_eq!(Amount::parse_decimal(&amount.to_decimal()).unwrap(), amount);
        }
    }
}
