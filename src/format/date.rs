use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{CodecError, CodecResult, ConversionError};
use crate::types::CellValue;

pub const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%d";
pub const DEFAULT_DATE_TIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Date or date-time values using a `strftime` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
    with_time: bool,
}

impl DateFormat {
    pub fn new(pattern: &str, with_time: bool) -> CodecResult<Self> {
        if pattern.is_empty() || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(CodecError::config(format!("invalid date pattern '{pattern}'")));
        }
        Ok(Self {
            pattern: pattern.to_owned(),
            with_time,
        })
    }

    pub fn date() -> Self {
        Self {
            pattern: DEFAULT_DATE_PATTERN.to_owned(),
            with_time: false,
        }
    }

    pub fn date_time() -> Self {
        Self {
            pattern: DEFAULT_DATE_TIME_PATTERN.to_owned(),
            with_time: true,
        }
    }

    pub fn describe(&self) -> String {
        format!("date with pattern '{}'", self.pattern)
    }

    /// chrono rejects trailing input, so partial matches fail.
    pub fn parse(&self, text: &str) -> Result<CellValue, ConversionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(CellValue::Empty);
        }
        let fail = |e: chrono::ParseError| ConversionError::new(self.describe(), e.to_string());
        if self.with_time {
            NaiveDateTime::parse_from_str(trimmed, &self.pattern)
                .map(CellValue::DateTime)
                .map_err(fail)
        } else {
            NaiveDate::parse_from_str(trimmed, &self.pattern)
                .map(CellValue::Date)
                .map_err(fail)
        }
    }

    pub fn format(&self, value: &CellValue) -> Result<String, ConversionError> {
        match value {
            CellValue::Empty => Ok(String::new()),
            CellValue::Date(d) if !self.with_time => Ok(d.format(&self.pattern).to_string()),
            CellValue::DateTime(dt) if self.with_time => Ok(dt.format(&self.pattern).to_string()),
            other => Err(ConversionError::new(
                self.describe(),
                format!("cannot format {:?} value with this date format", other.cell_type()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::DateFormat;
    use crate::types::CellValue;

    #[test]
    fn custom_pattern_round_trip() {
        let f = DateFormat::new("%d/%m/%Y", false).unwrap();
        let v = f.parse("24/12/2023").unwrap();
        assert_eq!(v, CellValue::Date(NaiveDate::from_ymd_opt(2023, 12, 24).unwrap()));
        assert_eq!(f.format(&v).unwrap(), "24/12/2023");
    }

    #[test]
    fn trailing_text_is_rejected() {
        let f = DateFormat::date();
        assert!(f.parse("2023-12-24x").is_err());
        assert!(f.parse("2023-13-01").is_err());
    }

    #[test]
    fn date_time_default_accepts_optional_fraction() {
        let f = DateFormat::date_time();
        let v = f.parse("2023-12-24T18:30:00").unwrap();
        let expected = NaiveDateTime::parse_from_str("2023-12-24 18:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(v, CellValue::DateTime(expected));
        assert_eq!(f.format(&v).unwrap(), "2023-12-24T18:30:00");
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        assert!(DateFormat::new("%Q", false).is_err());
    }
}
