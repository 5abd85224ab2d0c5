//! Implied decimal: numbers written as integers with a fixed number of implied fraction
//! digits, e.g. `314` with two implied decimals is `3.14`.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{CodecError, CodecResult, ConversionError};
use crate::types::CellValue;

use super::number::{NumberKind, decimal_from_f64};

// Decimal holds 28 significant digits; leave room for the integer part.
const MAX_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpliedDecimalFormat {
    decimals: u32,
    kind: NumberKind,
}

impl ImpliedDecimalFormat {
    pub fn new(decimals: u32, kind: NumberKind) -> CodecResult<Self> {
        if decimals > MAX_DECIMALS {
            return Err(CodecError::config(format!(
                "implied decimals must be at most {MAX_DECIMALS}, got {decimals}"
            )));
        }
        Ok(Self { decimals, kind })
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn describe(&self) -> String {
        format!("integer digits with {} implied decimals", self.decimals)
    }

    fn scale(&self) -> Decimal {
        Decimal::from(10i64.pow(self.decimals))
    }

    /// Divides the digits by 10^decimals.
    pub fn parse(&self, text: &str) -> Result<CellValue, ConversionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(CellValue::Empty);
        }
        let digits = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConversionError::new(self.describe(), format!("'{text}' is not an integer")));
        }
        let normalized = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let mut value = Decimal::from_str(normalized)
            .map_err(|e| ConversionError::new(self.describe(), e.to_string()))?;
        value
            .set_scale(self.decimals)
            .map_err(|e| ConversionError::new(self.describe(), e.to_string()))?;

        match self.kind {
            NumberKind::Decimal => Ok(CellValue::Decimal(value)),
            NumberKind::Float => value
                .to_f64()
                .map(CellValue::Float)
                .ok_or_else(|| ConversionError::new(self.describe(), "value out of range for a float")),
            NumberKind::Integer => {
                if value.fract().is_zero() {
                    value
                        .to_i64()
                        .map(CellValue::Integer)
                        .ok_or_else(|| ConversionError::new(self.describe(), "value out of range for an integer"))
                } else {
                    Err(ConversionError::new(self.describe(), format!("{value} is not a whole number")))
                }
            }
        }
    }

    /// Multiplies the value by 10^decimals, rounding away any remaining fraction.
    pub fn format(&self, value: &CellValue) -> Result<String, ConversionError> {
        let decimal = match value {
            CellValue::Empty => return Ok(String::new()),
            CellValue::Integer(v) => Decimal::from(*v),
            CellValue::Decimal(d) => *d,
            CellValue::Float(f) => decimal_from_f64(*f, &self.describe())?,
            other => {
                return Err(ConversionError::new(
                    self.describe(),
                    format!("cannot format {:?} value as an implied decimal", other.cell_type()),
                ));
            }
        };
        let scaled = decimal
            .checked_mul(self.scale())
            .ok_or_else(|| ConversionError::new(self.describe(), format!("{decimal} overflows when scaled")))?;
        Ok(scaled.round().normalize().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::ImpliedDecimalFormat;
    use crate::format::number::NumberKind;
    use crate::types::CellValue;

    #[test]
    fn formats_by_shifting_the_decimal_point() {
        let f = ImpliedDecimalFormat::new(2, NumberKind::Decimal).unwrap();
        assert_eq!(f.format(&CellValue::Integer(1)).unwrap(), "100");
        assert_eq!(
            f.format(&CellValue::Decimal(Decimal::from_str("3.14").unwrap())).unwrap(),
            "314"
        );
        assert_eq!(
            f.format(&CellValue::Decimal(Decimal::from_str("-0.5").unwrap())).unwrap(),
            "-50"
        );
    }

    #[test]
    fn parses_by_dividing() {
        let f = ImpliedDecimalFormat::new(2, NumberKind::Decimal).unwrap();
        assert_eq!(
            f.parse("314").unwrap(),
            CellValue::Decimal(Decimal::from_str("3.14").unwrap())
        );
        assert!(f.parse("3.14").is_err());
        assert!(f.parse("31x").is_err());
    }

    #[test]
    fn integer_target_requires_whole_value() {
        let f = ImpliedDecimalFormat::new(2, NumberKind::Integer).unwrap();
        assert_eq!(f.parse("500").unwrap(), CellValue::Integer(5));
        assert!(f.parse("501").is_err());
    }

    #[test]
    fn too_many_decimals_is_config_error() {
        assert!(ImpliedDecimalFormat::new(19, NumberKind::Decimal).is_err());
    }
}
