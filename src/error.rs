use std::fmt;

use thiserror::Error;

/// Convenience result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Error type returned by parse, compose and format construction.
///
/// This is a single error enum shared by both directions of the codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Underlying I/O error on the text stream. Always fatal.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error (as-needed quoting is delegated to the `csv` crate).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A schema could not be deserialized from JSON.
    #[error("schema json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The schema declares an internally inconsistent format.
    #[error("invalid format configuration: {message}")]
    FormatConfig { message: String },

    /// A recoverable condition escalated because its validation action is `Exception`.
    #[error("{0}")]
    Record(RecordError),

    /// The configured maximum number of recorded errors was exceeded.
    #[error("maximum number of errors ({max}) exceeded; {} errors recorded", errors.len())]
    MaxErrorsExceeded {
        max: usize,
        errors: Vec<RecordError>,
    },

    /// Quoted text does not follow the quoting rules (missing or unbalanced quotes).
    #[error("malformed quoted text: {message}")]
    Format { message: String },

    /// A fixed-width field was asked to hold more text than its width allows.
    #[error("cannot pad text of length {len} into width {width}")]
    IndexOutOfBounds { width: usize, len: usize },

    /// A numeric comparison was requested for a cell without a numeric value.
    #[error("cell '{cell}' does not hold a numeric value ({cell_type:?})")]
    NotNumeric {
        cell: String,
        cell_type: crate::types::CellType,
    },

    /// A value payload does not agree with the declared cell type.
    #[error("cell '{cell}' is declared {expected:?} but was given a {actual:?} value")]
    TypeMismatch {
        cell: String,
        expected: crate::types::CellType,
        actual: crate::types::CellType,
    },
}

impl CodecError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        CodecError::FormatConfig {
            message: message.into(),
        }
    }

    /// The recorded errors carried by this failure, if any.
    ///
    /// For [`CodecError::MaxErrorsExceeded`] this is the full diagnostic list; for
    /// [`CodecError::Record`] it is the single escalated error.
    pub fn record_errors(&self) -> &[RecordError] {
        match self {
            CodecError::MaxErrorsExceeded { errors, .. } => errors,
            CodecError::Record(err) => std::slice::from_ref(err),
            _ => &[],
        }
    }
}

impl From<RecordError> for CodecError {
    fn from(err: RecordError) -> Self {
        CodecError::Record(err)
    }
}

/// A text value did not match the format a format provider expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (expected {expected})")]
pub struct ConversionError {
    /// Human readable description of the expected format.
    pub expected: String,
    /// What went wrong.
    pub message: String,
}

impl ConversionError {
    pub(crate) fn new(expected: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            message: message.into(),
        }
    }
}

/// The condition a [`RecordError`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Cell text does not match the declared type or pattern (or a value cannot be
    /// rendered with the cell format while composing).
    Conversion,
    /// A mandatory cell is empty or absent.
    MissingMandatoryCell,
    /// No schema line matches a physical input line.
    NoMatchingLineType,
    /// No schema line is declared for the line type of a line being composed.
    NoMatchingSchemaLine,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Conversion => "conversion error",
            ErrorKind::MissingMandatoryCell => "missing mandatory cell",
            ErrorKind::NoMatchingLineType => "no matching line type",
            ErrorKind::NoMatchingSchemaLine => "no matching schema line",
        };
        f.write_str(s)
    }
}

/// One recoverable problem detected while parsing or composing a line.
///
/// Line-level problems leave `cell_name`, `raw` and `expected` unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub kind: ErrorKind,
    /// 1-based line number of the offending line.
    pub line_number: usize,
    pub line_type: Option<String>,
    pub cell_name: Option<String>,
    /// The raw cell (or line) text, if any.
    pub raw: Option<String>,
    /// Description of the expected format.
    pub expected: Option<String>,
    pub message: String,
}

impl RecordError {
    /// Create a line-level error.
    pub fn line(kind: ErrorKind, line_number: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line_number,
            line_type: None,
            cell_name: None,
            raw: None,
            expected: None,
            message: message.into(),
        }
    }

    /// Create a cell-level conversion error from a format provider failure.
    pub fn conversion(
        line_number: usize,
        line_type: &str,
        cell_name: &str,
        raw: &str,
        err: ConversionError,
    ) -> Self {
        Self {
            kind: ErrorKind::Conversion,
            line_number,
            line_type: Some(line_type.to_owned()),
            cell_name: Some(cell_name.to_owned()),
            raw: Some(raw.to_owned()),
            expected: Some(err.expected),
            message: err.message,
        }
    }

    /// Create a missing-mandatory-cell error.
    pub fn missing_mandatory(line_number: usize, line_type: &str, cell_name: &str) -> Self {
        Self {
            kind: ErrorKind::MissingMandatoryCell,
            line_number,
            line_type: Some(line_type.to_owned()),
            cell_name: Some(cell_name.to_owned()),
            raw: None,
            expected: None,
            message: format!("mandatory cell '{cell_name}' has no value"),
        }
    }

    pub fn with_line_type(mut self, line_type: impl Into<String>) -> Self {
        self.line_type = Some(line_type.into());
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.kind, self.line_number)?;
        if let Some(line_type) = &self.line_type {
            write!(f, " (type '{line_type}')")?;
        }
        if let Some(cell) = &self.cell_name {
            write!(f, " cell '{cell}'")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(expected) = &self.expected {
            write!(f, "; expected {expected}")?;
        }
        if let Some(raw) = &self.raw {
            write!(f, " (raw='{raw}')")?;
        }
        Ok(())
    }
}

impl std::error::Error for RecordError {}
