use crate::error::{CodecError, CodecResult, ConversionError};
use crate::types::CellValue;

const DEFAULT_TRUE: &[&str] = &["true", "on", "1", "yes"];
const DEFAULT_FALSE: &[&str] = &["false", "off", "0", "no"];

/// Case-insensitive boolean literals. The first literal of each set is used when formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanFormat {
    true_literals: Vec<String>,
    false_literals: Vec<String>,
}

impl BooleanFormat {
    /// Accepts `true/on/1/yes` and `false/off/0/no`.
    pub fn standard() -> Self {
        Self {
            true_literals: DEFAULT_TRUE.iter().map(|s| s.to_string()).collect(),
            false_literals: DEFAULT_FALSE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build from explicit literals. Identical (or overlapping) true and false literals are
    /// a configuration error.
    pub fn new<T, F>(true_literals: T, false_literals: F) -> CodecResult<Self>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let true_literals: Vec<String> = true_literals.into_iter().map(Into::into).collect();
        let false_literals: Vec<String> = false_literals.into_iter().map(Into::into).collect();
        if true_literals.is_empty() || false_literals.is_empty() {
            return Err(CodecError::config("boolean format needs at least one true and one false literal"));
        }
        if let Some(dup) = true_literals
            .iter()
            .find(|t| false_literals.iter().any(|f| f.to_lowercase() == t.to_lowercase()))
        {
            return Err(CodecError::config(format!(
                "boolean literal '{dup}' is used for both true and false"
            )));
        }
        Ok(Self {
            true_literals,
            false_literals,
        })
    }

    /// Parse a `true|yes;false|no` pattern: `;` separates the true and false sets, `|`
    /// separates alternatives within a set.
    pub fn from_pattern(pattern: &str) -> CodecResult<Self> {
        let (t, f) = pattern.split_once(';').ok_or_else(|| {
            CodecError::config(format!("boolean pattern '{pattern}' must have the form 'true;false'"))
        })?;
        let split = |s: &str| -> Vec<String> {
            s.split('|').map(str::trim).filter(|l| !l.is_empty()).map(str::to_owned).collect()
        };
        Self::new(split(t), split(f))
    }

    pub fn describe(&self) -> String {
        format!(
            "boolean ({} / {})",
            self.true_literals.join("|"),
            self.false_literals.join("|")
        )
    }

    pub fn parse(&self, text: &str) -> Result<CellValue, ConversionError> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(CellValue::Empty);
        }
        if self.true_literals.iter().any(|l| l.to_lowercase() == needle) {
            Ok(CellValue::Boolean(true))
        } else if self.false_literals.iter().any(|l| l.to_lowercase() == needle) {
            Ok(CellValue::Boolean(false))
        } else {
            Err(ConversionError::new(self.describe(), format!("'{text}' is not a boolean literal")))
        }
    }

    pub fn format(&self, value: &CellValue) -> Result<String, ConversionError> {
        match value {
            CellValue::Empty => Ok(String::new()),
            CellValue::Boolean(true) => Ok(self.true_literals[0].clone()),
            CellValue::Boolean(false) => Ok(self.false_literals[0].clone()),
            other => Err(ConversionError::new(
                self.describe(),
                format!("cannot format {:?} value as a boolean", other.cell_type()),
            )),
        }
    }
}
