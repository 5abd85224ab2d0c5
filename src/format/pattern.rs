use regex::Regex;

use crate::error::{CodecError, CodecResult, ConversionError};
use crate::types::CellValue;

/// String values constrained by a regular expression that must match the whole text.
#[derive(Debug, Clone)]
pub struct PatternFormat {
    pattern: String,
    regex: Regex,
    custom: bool,
}

impl PatternFormat {
    /// `custom` selects whether parsed values become [`CellValue::Custom`] or
    /// [`CellValue::String`].
    pub fn new(pattern: &str, custom: bool) -> CodecResult<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| CodecError::config(format!("invalid regex pattern '{pattern}': {e}")))?;
        Ok(Self {
            pattern: pattern.to_owned(),
            regex,
            custom,
        })
    }

    pub fn describe(&self) -> String {
        format!("text matching '{}'", self.pattern)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn parse(&self, text: &str) -> Result<CellValue, ConversionError> {
        if text.is_empty() {
            return Ok(CellValue::Empty);
        }
        if !self.regex.is_match(text) {
            return Err(ConversionError::new(self.describe(), format!("'{text}' does not match")));
        }
        Ok(if self.custom {
            CellValue::Custom(text.to_owned())
        } else {
            CellValue::String(text.to_owned())
        })
    }

    pub fn format(&self, value: &CellValue) -> Result<String, ConversionError> {
        let text = match value {
            CellValue::Empty => return Ok(String::new()),
            CellValue::String(s) | CellValue::Custom(s) => s.clone(),
            other => other.to_string(),
        };
        if self.regex.is_match(&text) {
            Ok(text)
        } else {
            Err(ConversionError::new(self.describe(), format!("'{text}' does not match")))
        }
    }
}

impl PartialEq for PatternFormat {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.custom == other.custom
    }
}

#[cfg(test)]
mod tests {
    use super::PatternFormat;
    use crate::types::CellValue;

    #[test]
    fn requires_full_match() {
        let f = PatternFormat::new("[A-Z]{2}[0-9]+", true).unwrap();
        assert_eq!(f.parse("SE123").unwrap(), CellValue::Custom("SE123".to_string()));
        assert!(f.parse("SE123x").is_err());
        assert!(f.parse("xSE123").is_err());
        assert!(f.format(&CellValue::Custom("se1".to_string())).is_err());
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let f = PatternFormat::new("a|b", false).unwrap();
        assert!(f.parse("ab").is_err());
        assert_eq!(f.parse("b").unwrap(), CellValue::String("b".to_string()));
    }

    #[test]
    fn invalid_regex_is_config_error() {
        assert!(PatternFormat::new("(", false).is_err());
    }
}
