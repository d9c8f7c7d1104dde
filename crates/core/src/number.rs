//! Decimal-text numbers
//!
//! The store encodes every number as decimal text. `Number` keeps that text
//! verbatim after validating it, so arbitrary-precision decimals survive a
//! round trip without ever passing through a binary float.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated decimal number in the store's text encoding
///
/// Accepted grammar: optional sign, digits with an optional fraction (or a
/// bare fraction such as `.5`), and an optional exponent (`1e10`, `2.5E-3`).
///
/// Equality is textual: `Number("1.0") != Number("1.00")`. The mapper never
/// rewrites number text, so this matches round-trip identity. Compare
/// [`Number::canonical`] forms for numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Number(String);

/// Returned when text is not a valid decimal number
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid number text {0:?}")]
pub struct InvalidNumber(pub String);

impl Number {
    /// Parse and validate decimal text
    pub fn parse(text: &str) -> Result<Self, InvalidNumber> {
        if is_decimal_text(text) {
            Ok(Number(text.to_string()))
        } else {
            Err(InvalidNumber(text.to_string()))
        }
    }

    /// Number from a finite float, using the shortest text that round-trips
    ///
    /// Returns `None` for NaN and infinities, which the store cannot hold.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_finite() {
            Some(Number(value.to_string()))
        } else {
            None
        }
    }

    /// The decimal text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret as an `i64` if the text is an in-range integer literal
    pub fn to_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Interpret as an `f64` (may lose precision)
    pub fn to_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }

    /// True when the text has no fraction and no exponent
    pub fn is_integer_literal(&self) -> bool {
        !self.0.contains(['.', 'e', 'E'])
    }

    /// Text that is equal for numerically equal numbers
    ///
    /// Significant digits without leading or trailing zeros, followed by the
    /// exponent: `1`, `1.0` and `0.1e1` all give `1e0`. Zero is `0` whatever
    /// its sign.
    pub fn canonical(&self) -> String {
        let text = self.0.as_str();
        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(at) => (&unsigned[..at], &unsigned[at + 1..]),
            None => (unsigned, "0"),
        };
        let exponent: i64 = exponent.parse().unwrap_or(if exponent.starts_with('-') {
            i64::MIN / 2
        } else {
            i64::MAX / 2
        });
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

        let digits = format!("{}{}", whole, fraction);
        let digits = digits.trim_start_matches('0');
        let significant = digits.trim_end_matches('0');
        if significant.is_empty() {
            return "0".to_string();
        }
        let shift = (digits.len() - significant.len()) as i64 - fraction.len() as i64;
        format!(
            "{}{}e{}",
            if negative { "-" } else { "" },
            significant,
            exponent.saturating_add(shift)
        )
    }
}

fn is_decimal_text(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

impl FromStr for Number {
    type Err = InvalidNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Number::parse(s)
    }
}

impl TryFrom<String> for Number {
    type Error = InvalidNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_decimal_text(&value) {
            Ok(Number(value))
        } else {
            Err(InvalidNumber(value))
        }
    }
}

impl From<Number> for String {
    fn from(n: Number) -> Self {
        n.0
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number(value.to_string())
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number(value.to_string())
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number(value.to_string())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
