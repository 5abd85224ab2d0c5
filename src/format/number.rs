//! Locale-aware integer, float and decimal formats.
//!
//! Patterns use the familiar `#,##0.00` shape:
//!
//! - a `,` in the integer part enables grouping; the group size is the number of digit
//!   placeholders after the last `,`
//! - `0` placeholders in the integer part set the minimum number of integer digits
//! - after `.`, each `0` is a required fraction digit and each `#` an optional one

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::error::{CodecError, CodecResult, ConversionError};
use crate::types::{CellType, CellValue};

use super::locale::Locale;

/// Which numeric cell type a [`NumberFormat`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Float,
    Decimal,
}

impl NumberKind {
    pub fn from_cell_type(cell_type: CellType) -> Option<Self> {
        match cell_type {
            CellType::Integer => Some(NumberKind::Integer),
            CellType::Float => Some(NumberKind::Float),
            CellType::Decimal => Some(NumberKind::Decimal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    kind: NumberKind,
    decimal_separator: char,
    grouping_separator: char,
    group_size: Option<usize>,
    min_integer_digits: usize,
    min_fraction_digits: usize,
    max_fraction_digits: Option<usize>,
    pattern: Option<String>,
}

impl NumberFormat {
    /// A format without grouping that keeps every significant fraction digit.
    pub fn plain(kind: NumberKind, locale: &Locale) -> Self {
        Self {
            kind,
            decimal_separator: locale.decimal_separator(),
            grouping_separator: locale.grouping_separator(),
            group_size: None,
            min_integer_digits: 1,
            min_fraction_digits: 0,
            max_fraction_digits: if kind == NumberKind::Integer { Some(0) } else { None },
            pattern: None,
        }
    }

    pub fn with_pattern(kind: NumberKind, pattern: &str, locale: &Locale) -> CodecResult<Self> {
        let invalid = |why: &str| CodecError::config(format!("invalid number pattern '{pattern}': {why}"));

        let (int_part, frac_part) = match pattern.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (pattern, None),
        };
        if int_part.is_empty() || !int_part.chars().all(|c| matches!(c, '#' | '0' | ',')) {
            return Err(invalid("integer part may only contain '#', '0' and ','"));
        }
        if int_part.contains("0#") {
            return Err(invalid("'#' may not follow '0' in the integer part"));
        }

        let group_size = match int_part.rfind(',') {
            Some(pos) => {
                let size = int_part.len() - pos - 1;
                if size == 0 {
                    return Err(invalid("grouping separator must be followed by digits"));
                }
                Some(size)
            }
            None => None,
        };
        let min_integer_digits = int_part.chars().filter(|&c| c == '0').count();

        let (min_fraction_digits, max_fraction_digits) = match frac_part {
            None => (0, Some(0)),
            Some(f) => {
                if !f.chars().all(|c| matches!(c, '#' | '0')) {
                    return Err(invalid("fraction part may only contain '#' and '0'"));
                }
                if f.contains("#0") {
                    return Err(invalid("'0' may not follow '#' in the fraction part"));
                }
                (f.chars().filter(|&c| c == '0').count(), Some(f.len()))
            }
        };
        if kind == NumberKind::Integer && max_fraction_digits.unwrap_or(0) > 0 {
            return Err(invalid("integer cells cannot declare fraction digits"));
        }

        Ok(Self {
            kind,
            decimal_separator: locale.decimal_separator(),
            grouping_separator: locale.grouping_separator(),
            group_size,
            min_integer_digits,
            min_fraction_digits,
            max_fraction_digits,
            pattern: Some(pattern.to_owned()),
        })
    }

    pub fn kind(&self) -> NumberKind {
        self.kind
    }

    pub fn describe(&self) -> String {
        let noun = match self.kind {
            NumberKind::Integer => "integer",
            NumberKind::Float => "float",
            NumberKind::Decimal => "decimal",
        };
        match &self.pattern {
            Some(p) => format!("{noun} with pattern '{p}'"),
            None => format!("{noun} (decimal separator '{}')", self.decimal_separator),
        }
    }

    fn is_grouping_char(&self, c: char) -> bool {
        self.group_size.is_some()
            && (c == self.grouping_separator || (self.grouping_separator.is_whitespace() && c == ' '))
    }

    pub fn parse(&self, text: &str) -> Result<CellValue, ConversionError> {
        let fail = |message: &str| ConversionError::new(self.describe(), message);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(CellValue::Empty);
        }

        // Normalize into a plain "-123.45e6" string, rejecting anything unconsumed.
        let mut normalized = String::with_capacity(trimmed.len());
        let mut chars = trimmed.chars().peekable();
        if let Some(&sign) = chars.peek() {
            if sign == '-' || sign == '+' {
                if sign == '-' {
                    normalized.push('-');
                }
                chars.next();
            }
        }

        let mut digits = 0usize;
        let mut seen_decimal = false;
        let mut seen_exponent = false;
        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                digits += 1;
                normalized.push(c);
            } else if c == self.decimal_separator && !seen_decimal && !seen_exponent {
                if self.kind == NumberKind::Integer {
                    return Err(fail("unexpected decimal separator"));
                }
                seen_decimal = true;
                normalized.push('.');
            } else if self.is_grouping_char(c) && !seen_decimal && !seen_exponent && digits > 0 {
                continue;
            } else if (c == 'e' || c == 'E') && self.kind == NumberKind::Float && digits > 0 && !seen_exponent {
                seen_exponent = true;
                normalized.push('e');
                if let Some(&s) = chars.peek() {
                    if s == '-' || s == '+' {
                        normalized.push(s);
                        chars.next();
                    }
                }
                if !chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(fail("exponent has no digits"));
                }
            } else {
                return Err(fail(&format!("unexpected character '{c}'")));
            }
        }
        if digits == 0 {
            return Err(fail("no digits"));
        }

        match self.kind {
            NumberKind::Integer => i64::from_str(&normalized)
                .map(CellValue::Integer)
                .map_err(|e| fail(&e.to_string())),
            NumberKind::Float => f64::from_str(&normalized)
                .map(CellValue::Float)
                .map_err(|e| fail(&e.to_string())),
            NumberKind::Decimal => Decimal::from_str(&normalized)
                .map(CellValue::Decimal)
                .map_err(|e| fail(&e.to_string())),
        }
    }

    pub fn format(&self, value: &CellValue) -> Result<String, ConversionError> {
        let plain = match value {
            CellValue::Empty => return Ok(String::new()),
            CellValue::Integer(v) => v.to_string(),
            CellValue::Decimal(d) => match self.max_fraction_digits {
                Some(n) if self.kind != NumberKind::Integer => d.round_dp(n as u32).to_string(),
                _ => d.to_string(),
            },
            CellValue::Float(f) => {
                if !f.is_finite() {
                    return Err(ConversionError::new(self.describe(), format!("cannot format {f}")));
                }
                match self.max_fraction_digits {
                    Some(n) if self.kind != NumberKind::Integer => format!("{f:.n$}"),
                    _ => f.to_string(),
                }
            }
            other => {
                return Err(ConversionError::new(
                    self.describe(),
                    format!("cannot format {:?} value as a number", other.cell_type()),
                ));
            }
        };

        let (negative, body) = match plain.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, plain.as_str()),
        };
        let (int_digits, frac_digits) = body.split_once('.').unwrap_or((body, ""));

        if self.kind == NumberKind::Integer && !frac_digits.trim_end_matches('0').is_empty() {
            return Err(ConversionError::new(self.describe(), format!("{plain} is not a whole number")));
        }

        let mut frac = frac_digits.to_owned();
        if let Some(max) = self.max_fraction_digits {
            frac.truncate(max);
        }
        if self.max_fraction_digits.is_some() || self.pattern.is_some() {
            while frac.len() > self.min_fraction_digits && frac.ends_with('0') {
                frac.pop();
            }
        }
        while frac.len() < self.min_fraction_digits {
            frac.push('0');
        }

        let mut int_part = int_digits.trim_start_matches('0').to_owned();
        while int_part.len() < self.min_integer_digits.max(if frac.is_empty() { 1 } else { 0 }) {
            int_part.insert(0, '0');
        }

        let mut out = String::with_capacity(plain.len() + 4);
        let is_zero = int_part.chars().chain(frac.chars()).all(|c| c == '0');
        if negative && !is_zero {
            out.push('-');
        }
        match self.group_size {
            Some(size) => {
                for (i, c) in int_part.chars().enumerate() {
                    if i > 0 && (int_part.len() - i) % size == 0 {
                        out.push(self.grouping_separator);
                    }
                    out.push(c);
                }
            }
            None => out.push_str(&int_part),
        }
        if !frac.is_empty() {
            out.push(self.decimal_separator);
            out.push_str(&frac);
        }
        Ok(out)
    }
}

/// Converts a float to a decimal for formats that scale values exactly.
pub(crate) fn decimal_from_f64(v: f64, expected: &str) -> Result<Decimal, ConversionError> {
    Decimal::from_f64(v).ok_or_else(|| ConversionError::new(expected, format!("{v} cannot be represented as a decimal")))
}
