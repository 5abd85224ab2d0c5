use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult, ConversionError};
use crate::types::CellValue;

use super::CellFormat;

/// One external text and the internal value it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumEntry {
    pub text: String,
    pub value: String,
}

impl EnumEntry {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// Maps a closed set of texts to values. The value text is converted with the cell type's
/// default format, so an enum can produce strings as well as numbers or booleans.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumFormat {
    entries: Vec<EnumEntry>,
    inner: Box<CellFormat>,
}

impl EnumFormat {
    pub fn new(entries: Vec<EnumEntry>, inner: CellFormat) -> CodecResult<Self> {
        if entries.is_empty() {
            return Err(CodecError::config("enum format needs at least one entry"));
        }
        for (i, e) in entries.iter().enumerate() {
            if entries[..i].iter().any(|p| p.text == e.text) {
                return Err(CodecError::config(format!("enum text '{}' is declared twice", e.text)));
            }
            if entries[..i].iter().any(|p| p.value == e.value) {
                return Err(CodecError::config(format!("enum value '{}' is declared twice", e.value)));
            }
            if let Err(err) = inner.parse(&e.value) {
                return Err(CodecError::config(format!(
                    "enum value '{}' cannot be converted: {err}",
                    e.value
                )));
            }
        }
        Ok(Self {
            entries,
            inner: Box::new(inner),
        })
    }

    pub fn describe(&self) -> String {
        let texts: Vec<&str> = self.entries.iter().map(|e| e.text.as_str()).collect();
        format!("one of [{}]", texts.join(", "))
    }

    pub fn parse(&self, text: &str) -> Result<CellValue, ConversionError> {
        if text.is_empty() {
            return Ok(CellValue::Empty);
        }
        let entry = self
            .entries
            .iter()
            .find(|e| e.text == text)
            .ok_or_else(|| ConversionError::new(self.describe(), format!("'{text}' is not a known value")))?;
        self.inner.parse(&entry.value)
    }

    pub fn format(&self, value: &CellValue) -> Result<String, ConversionError> {
        if value.is_empty() {
            return Ok(String::new());
        }
        let internal = self.inner.format(value)?;
        self.entries
            .iter()
            .find(|e| e.value == internal)
            .map(|e| e.text.clone())
            .ok_or_else(|| ConversionError::new(self.describe(), format!("'{internal}' has no enum text")))
    }
}
