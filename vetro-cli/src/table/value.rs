//! Cell value representation for tabular feature data

use serde::{Deserialize, Serialize};

/// A single cell in a feature table
///
/// CSV input always produces `Text`; `Number` exists for values that arrive
/// already typed (programmatic construction).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Null/empty value
    #[default]
    Null,
    /// Numeric value
    Number(f64),
    /// Textual value, kept verbatim
    Text(String),
}

/// Normalized view of a cell used for equality checks
#[derive(Debug, Clone, PartialEq)]
enum Canonical<'a> {
    Blank,
    Number(f64),
    /// Plain decimal text with trailing fraction zeros removed
    Decimal(String),
    Text(&'a str),
}

impl CellValue {
    /// Build a text cell
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Check if this value carries no data (null, NaN or empty text)
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Number(n) => n.is_nan(),
            CellValue::Text(s) => s.is_empty(),
        }
    }

    fn canonical(&self) -> Canonical<'_> {
        match self {
            CellValue::Null => Canonical::Blank,
            CellValue::Number(n) if n.is_nan() => Canonical::Blank,
            CellValue::Number(n) => Canonical::Number(*n),
            CellValue::Text(s) if s.is_empty() => Canonical::Blank,
            CellValue::Text(s) => match plain_decimal(s) {
                Some(decimal) => Canonical::Decimal(decimal),
                None => Canonical::Text(s),
            },
        }
    }

    /// Compare two cells under the diff equality rule.
    ///
    /// Blank equals blank. Decimal text compares digit for digit after
    /// dropping trailing fraction zeros (`"5.0"` == `"5"`), so long integers
    /// and zero-padded codes never collapse. A typed number equals decimal
    /// text with the same `f64` value. Anything else compares verbatim.
    pub fn same_as(&self, other: &CellValue) -> bool {
        match (self.canonical(), other.canonical()) {
            (Canonical::Blank, Canonical::Blank) => true,
            (Canonical::Number(a), Canonical::Number(b)) => a == b,
            (Canonical::Decimal(a), Canonical::Decimal(b)) => a == b,
            (Canonical::Number(n), Canonical::Decimal(d)) | (Canonical::Decimal(d), Canonical::Number(n)) => {
                d.parse::<f64>().is_ok_and(|parsed| parsed == n)
            }
            (Canonical::Text(a), Canonical::Text(b)) => a == b,
            _ => false,
        }
    }

    /// Stringify for the wire. Blank values have no string form.
    pub fn to_wire_string(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            CellValue::Null => None,
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

/// Normalize text written as a plain decimal: optional `-`, digits, optional
/// fraction. A leading zero is only allowed as the whole integer part, so
/// `"05401"` stays text. Exponents and signs other than `-` stay text too.
fn plain_decimal(text: &str) -> Option<String> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer) || (integer.len() > 1 && integer.starts_with('0')) {
        return None;
    }
    let fraction = match fraction {
        Some(fraction) if !all_digits(fraction) => return None,
        Some(fraction) => fraction.trim_end_matches('0'),
        None => "",
    };

    let is_zero = integer == "0" && fraction.is_empty();
    let sign = if negative && !is_zero { "-" } else { "" };
    if fraction.is_empty() {
        Some(format!("{}{}", sign, integer))
    } else {
        Some(format!("{}{}.{}", sign, integer, fraction))
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "(null)"),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}
