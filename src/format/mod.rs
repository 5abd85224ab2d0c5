//! Format providers: conversion between cell text and typed [`CellValue`]s.
//!
//! [`CellFormat`] is a tagged union over the concrete providers. It is built once per schema
//! cell via [`CellFormat::build`], which is where every configuration error surfaces; parse and
//! format calls afterwards only ever fail with a [`ConversionError`].
//!
//! - [`number`]: locale-aware integers, floats and decimals with `#,##0.00` patterns
//! - [`implied`]: implied-decimal integers
//! - [`boolean`]: configurable true/false literals
//! - [`pattern`]: regex-constrained strings
//! - [`enumeration`]: closed text ↔ value maps
//! - [`date`]: `strftime` dates and date-times

pub mod boolean;
pub mod date;
pub mod enumeration;
pub mod implied;
pub mod locale;
pub mod number;
pub mod pattern;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult, ConversionError};
use crate::types::{CellType, CellValue};

pub use boolean::BooleanFormat;
pub use date::DateFormat;
pub use enumeration::{EnumEntry, EnumFormat};
pub use implied::ImpliedDecimalFormat;
pub use locale::Locale;
pub use number::{NumberFormat, NumberKind};
pub use pattern::PatternFormat;

/// How a schema cell asks for its format to be built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatSpec {
    /// Interpreted per cell type: number pattern, boolean literals, date pattern or regex.
    Pattern(String),
    /// Integer text with this many implied fraction digits.
    ImpliedDecimal(u32),
    /// Closed set of external texts mapped to internal values.
    Enum(Vec<EnumEntry>),
}

/// Everything that determines which [`CellFormat`] a cell gets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatKey {
    pub cell_type: CellType,
    pub spec: Option<FormatSpec>,
    pub locale: String,
}

impl FormatKey {
    pub fn new(cell_type: CellType, spec: Option<&FormatSpec>, locale: &Locale) -> Self {
        Self {
            cell_type,
            spec: spec.cloned(),
            locale: locale.tag().to_owned(),
        }
    }
}

/// A constructed converter for one cell type.
#[derive(Debug, Clone, PartialEq)]
pub enum CellFormat {
    /// Unconstrained text; `custom` selects [`CellValue::Custom`] over [`CellValue::String`].
    Text { custom: bool },
    Pattern(PatternFormat),
    Number(NumberFormat),
    ImpliedDecimal(ImpliedDecimalFormat),
    Boolean(BooleanFormat),
    Date(DateFormat),
    Enum(EnumFormat),
}

impl CellFormat {
    /// The format used when a cell declares no format spec.
    pub fn default_for(cell_type: CellType, locale: &Locale) -> Self {
        match cell_type {
            CellType::String => CellFormat::Text { custom: false },
            CellType::Custom => CellFormat::Text { custom: true },
            CellType::Integer => CellFormat::Number(NumberFormat::plain(NumberKind::Integer, locale)),
            CellType::Float => CellFormat::Number(NumberFormat::plain(NumberKind::Float, locale)),
            CellType::Decimal => CellFormat::Number(NumberFormat::plain(NumberKind::Decimal, locale)),
            CellType::Boolean => CellFormat::Boolean(BooleanFormat::standard()),
            CellType::Date => CellFormat::Date(DateFormat::date()),
            CellType::DateTime => CellFormat::Date(DateFormat::date_time()),
        }
    }

    /// Construct the format for a cell, rejecting a format that does not apply to the cell type.
    pub fn build(cell_type: CellType, spec: Option<&FormatSpec>, locale: &Locale) -> CodecResult<Self> {
        let Some(spec) = spec else {
            return Ok(Self::default_for(cell_type, locale));
        };
        match (spec, cell_type) {
            (FormatSpec::Enum(entries), _) => Ok(CellFormat::Enum(EnumFormat::new(
                entries.clone(),
                Self::default_for(cell_type, locale),
            )?)),
            (FormatSpec::ImpliedDecimal(decimals), t) => match NumberKind::from_cell_type(t) {
                Some(kind) => Ok(CellFormat::ImpliedDecimal(ImpliedDecimalFormat::new(*decimals, kind)?)),
                None => Err(CodecError::config(format!(
                    "implied decimal format requires a numeric cell, not {t:?}"
                ))),
            },
            (FormatSpec::Pattern(p), CellType::String) => Ok(CellFormat::Pattern(PatternFormat::new(p, false)?)),
            (FormatSpec::Pattern(p), CellType::Custom) => Ok(CellFormat::Pattern(PatternFormat::new(p, true)?)),
            (FormatSpec::Pattern(p), t @ (CellType::Integer | CellType::Float | CellType::Decimal)) => {
                let kind = NumberKind::from_cell_type(t).unwrap_or(NumberKind::Decimal);
                Ok(CellFormat::Number(NumberFormat::with_pattern(kind, p, locale)?))
            }
            (FormatSpec::Pattern(p), CellType::Boolean) => Ok(CellFormat::Boolean(BooleanFormat::from_pattern(p)?)),
            (FormatSpec::Pattern(p), CellType::Date) => Ok(CellFormat::Date(DateFormat::new(p, false)?)),
            (FormatSpec::Pattern(p), CellType::DateTime) => Ok(CellFormat::Date(DateFormat::new(p, true)?)),
        }
    }

    /// Description of the expected text, used in error records.
    pub fn describe(&self) -> String {
        match self {
            CellFormat::Text { custom: false } => "text".to_owned(),
            CellFormat::Text { custom: true } => "custom text".to_owned(),
            CellFormat::Pattern(f) => f.describe(),
            CellFormat::Number(f) => f.describe(),
            CellFormat::ImpliedDecimal(f) => f.describe(),
            CellFormat::Boolean(f) => f.describe(),
            CellFormat::Date(f) => f.describe(),
            CellFormat::Enum(f) => f.describe(),
        }
    }

    /// Convert text to a value. Empty text yields [`CellValue::Empty`]; anything that is not
    /// consumed entirely is a [`ConversionError`].
    pub fn parse(&self, text: &str) -> Result<CellValue, ConversionError> {
        match self {
            CellFormat::Text { .. } if text.is_empty() => Ok(CellValue::Empty),
            CellFormat::Text { custom: false } => Ok(CellValue::String(text.to_owned())),
            CellFormat::Text { custom: true } => Ok(CellValue::Custom(text.to_owned())),
            CellFormat::Pattern(f) => f.parse(text),
            CellFormat::Number(f) => f.parse(text),
            CellFormat::ImpliedDecimal(f) => f.parse(text),
            CellFormat::Boolean(f) => f.parse(text),
            CellFormat::Date(f) => f.parse(text),
            CellFormat::Enum(f) => f.parse(text),
        }
    }

    /// Render a value as text.
    pub fn format(&self, value: &CellValue) -> Result<String, ConversionError> {
        match self {
            CellFormat::Text { .. } => Ok(value.to_string()),
            CellFormat::Pattern(f) => f.format(value),
            CellFormat::Number(f) => f.format(value),
            CellFormat::ImpliedDecimal(f) => f.format(value),
            CellFormat::Boolean(f) => f.format(value),
            CellFormat::Date(f) => f.format(value),
            CellFormat::Enum(f) => f.format(value),
        }
    }
}

/// Parse `text` as `cell_type`, with `format` when given or the type default for `locale`.
pub fn parse_value(
    cell_type: CellType,
    text: &str,
    format: Option<&CellFormat>,
    locale: &Locale,
) -> Result<CellValue, ConversionError> {
    match format {
        Some(f) => f.parse(text),
        None => CellFormat::default_for(cell_type, locale).parse(text),
    }
}

/// Render `value` with `format`, or with its type-default string conversion.
pub fn format_value(value: &CellValue, format: Option<&CellFormat>) -> Result<String, ConversionError> {
    match format {
        Some(f) => f.format(value),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::{CellFormat, FormatSpec, Locale, format_value, parse_value};
    use crate::types::{CellType, CellValue};

    #[test]
    fn build_dispatches_pattern_per_type() {
        let root = Locale::root();
        let spec = FormatSpec::Pattern("ja;nej".to_string());
        let f = CellFormat::build(CellType::Boolean, Some(&spec), &root).unwrap();
        assert_eq!(f.parse("JA").unwrap(), CellValue::Boolean(true));
        assert_eq!(f.parse("nej").unwrap(), CellValue::Boolean(false));
        assert!(f.parse("unknown").is_err());

        let spec = FormatSpec::Pattern("#,##0.00".to_string());
        let f = CellFormat::build(CellType::Decimal, Some(&spec), &root).unwrap();
        assert_eq!(
            f.format(&CellValue::Decimal(Decimal::from_str("1234.5").unwrap())).unwrap(),
            "1,234.50"
        );
    }

    #[test]
    fn implied_decimal_requires_numeric_cell() {
        let spec = FormatSpec::ImpliedDecimal(2);
        assert!(CellFormat::build(CellType::String, Some(&spec), &Locale::root()).is_err());
        let f = CellFormat::build(CellType::Decimal, Some(&spec), &Locale::root()).unwrap();
        assert_eq!(f.format(&CellValue::Integer(1)).unwrap(), "100");
        assert_eq!(
            f.parse("314").unwrap(),
            CellValue::Decimal(Decimal::from_str("3.14").unwrap())
        );
    }

    #[test]
    fn identical_boolean_literals_fail_at_build_time() {
        let spec = FormatSpec::Pattern("x;x".to_string());
        assert!(CellFormat::build(CellType::Boolean, Some(&spec), &Locale::root()).is_err());
    }

    #[test]
    fn parse_value_without_format_uses_locale() {
        let sv = Locale::from_tag("sv").unwrap();
        assert_eq!(
            parse_value(CellType::Float, "2,5", None, &sv).unwrap(),
            CellValue::Float(2.5)
        );
        assert_eq!(parse_value(CellType::Integer, "", None, &sv).unwrap(), CellValue::Empty);
        assert_eq!(format_value(&CellValue::Integer(7), None).unwrap(), "7");
    }

    proptest! {
        #[test]
        fn integer_round_trip(v in any::<i64>()) {
            let f = CellFormat::default_for(CellType::Integer, &Locale::root());
            let text = f.format(&CellValue::Integer(v)).unwrap();
            prop_assert_eq!(f.parse(&text).unwrap(), CellValue::Integer(v));
        }

        #[test]
        fn float_round_trip_with_comma_locale(v in -1.0e12f64..1.0e12f64) {
            let f = CellFormat::default_for(CellType::Float, &Locale::from_tag("de").unwrap());
            let text = f.format(&CellValue::Float(v)).unwrap();
            prop_assert_eq!(f.parse(&text).unwrap(), CellValue::Float(v));
        }

        #[test]
        fn decimal_round_trip(mantissa in any::<i64>(), scale in 0u32..10) {
            let d = Decimal::new(mantissa, scale);
            let f = CellFormat::default_for(CellType::Decimal, &Locale::root());
            let text = f.format(&CellValue::Decimal(d)).unwrap();
            prop_assert_eq!(f.parse(&text).unwrap(), CellValue::Decimal(d));
        }

        #[test]
        fn date_round_trip(days in 0i64..200_000) {
            let date = NaiveDate::from_ymd_opt(1600, 1, 1).unwrap() + chrono::Duration::days(days);
            let f = CellFormat::default_for(CellType::Date, &Locale::root());
            let text = f.format(&CellValue::Date(date)).unwrap();
            prop_assert_eq!(f.parse(&text).unwrap(), CellValue::Date(date));
        }
    }
}
