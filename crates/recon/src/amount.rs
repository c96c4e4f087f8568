//! Lenient amount parsing into integer minor units.
//!
//! The data layer hands over amounts as JSON numbers, numeric strings, empty
//! strings or nulls. Everything is converted to `i64` minor units here, once,
//! so the rest of the engine never sees a float or a string amount.

use serde::Deserialize;

/// An amount exactly as the data layer delivered it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(serde_json::Number),
    Text(String),
    /// Booleans, arrays, objects. Never a value; read back as unparseable.
    Other(serde_json::Value),
}

impl RawAmount {
    /// Decimal text of the raw value. Floats are printed without exponent.
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => i.to_string(),
                (None, Some(f)) => format!("{f}"),
                (None, None) => n.to_string(),
            },
            Self::Text(s) => s.clone(),
            Self::Other(v) => v.to_string(),
        }
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Outcome of reading one amount field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAmount {
    /// Null, absent, or blank.
    Missing,
    Value(i64),
    /// Present but not a decimal number (or out of range). Carries the raw text.
    Unparseable(String),
}

impl ParsedAmount {
    pub fn from_raw(raw: Option<&RawAmount>, minor_digits: u32) -> Self {
        let Some(raw) = raw else {
            return Self::Missing;
        };
        let text = raw.as_text();
        if text.trim().is_empty() {
            return Self::Missing;
        }
        match parse_minor(&text, minor_digits) {
            Some(value) => Self::Value(value),
            None => Self::Unparseable(text),
        }
    }

    /// Lenient policy: anything that is not a value counts as zero.
    pub fn or_zero(&self) -> i64 {
        match self {
            Self::Value(v) => *v,
            Self::Missing | Self::Unparseable(_) => 0,
        }
    }
}

/// Parse a decimal literal (`"12000"`, `"-12.50"`, `"+.5"`) into minor units.
///
/// Fractional digits beyond `minor_digits` are rounded half away from zero.
/// Returns `None` for anything else, including thousands separators,
/// exponents, and values that overflow `i64`.
pub fn parse_minor(text: &str, minor_digits: u32) -> Option<i64> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = minor_digits as usize;
    let scale = 10i64.checked_pow(minor_digits)?;

    let mut value: i64 = 0;
    for b in whole.bytes() {
        value = value.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
    }
    value = value.checked_mul(scale)?;

    let kept = &frac[..frac.len().min(digits)];
    let mut minor: i64 = 0;
    for b in kept.bytes() {
        minor = minor * 10 + i64::from(b - b'0');
    }
    for _ in kept.len()..digits {
        minor *= 10;
    }
    value = value.checked_add(minor)?;

    if let Some(&first_dropped) = frac.as_bytes().get(digits) {
        if first_dropped >= b'5' {
            value = value.checked_add(1)?;
        }
    }

    Some(if negative { -value } else { value })
}

/// Sum of minor-unit amounts, saturating at the `i64` bounds.
pub fn total<I: IntoIterator<Item = i64>>(amounts: I) -> i64 {
    amounts.into_iter().fold(0, i64::saturating_add)
}

/// Integer mean rounded half away from zero. Zero when `count` is zero.
pub fn rounded_average(total: i64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    let count = count as i64;
    let quotient = total / count;
    let remainder = total % count;
    if remainder.abs() * 2 >= count {
        quotient + total.signum()
    } else {
        quotient
    }
}
