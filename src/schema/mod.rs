//! The immutable schema shared by the parse and compose engines.
//!
//! A [`Schema`] is built in code with the `with_*` builders or deserialized from JSON with
//! [`Schema::from_json_str`]. Engines take it behind an [`std::sync::Arc`] and never mutate it.
//!
//! ```
//! use flatcodec::schema::{Schema, SchemaCell, SchemaLine};
//! use flatcodec::types::CellType;
//!
//! let schema = Schema::delimited().with_line(
//!     SchemaLine::new("person")
//!         .with_delimiter(';')
//!         .with_cell(SchemaCell::new("name", CellType::String).mandatory())
//!         .with_cell(SchemaCell::new("age", CellType::Integer)),
//! );
//! schema.validate().unwrap();
//! ```

pub(crate) mod plan;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};
use crate::format::FormatSpec;
use crate::text::{PadPolicy, QuoteMode};
use crate::types::CellType;

/// Physical encoding of the lines of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Cells separated by a delimiter character.
    #[default]
    Delimited,
    /// Cells at fixed column offsets.
    FixedWidth,
}

/// How a physical line is assigned to a [`SchemaLine`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTyping {
    /// The first readable schema line applies to every line.
    #[default]
    Single,
    /// The raw text at `cell_index` is compared to each line's `control_value`.
    ControlCell { cell_index: usize },
    /// The first line whose `line_condition` cells all match is selected.
    ByCondition,
}

/// Quoting of delimited cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quoting {
    pub mode: QuoteMode,
    pub quote: char,
    /// Ignored unless `mode` is [`QuoteMode::Always`].
    pub escape: char,
}

impl Default for Quoting {
    fn default() -> Self {
        Self {
            mode: QuoteMode::AsNeeded,
            quote: '"',
            escape: '\\',
        }
    }
}

impl Quoting {
    pub fn new(mode: QuoteMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }
}

/// Alignment of a fixed-width cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub policy: PadPolicy,
    pub fill: char,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            policy: PadPolicy::RightPad,
            fill: ' ',
        }
    }
}

/// Definition of one cell of a [`SchemaLine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaCell {
    pub name: String,
    pub cell_type: CellType,
    pub format: Option<FormatSpec>,
    /// Overrides the schema locale for this cell.
    pub locale: Option<String>,
    /// Column width; required for fixed-width schemas.
    pub width: Option<usize>,
    /// Upper bound on the composed text of a delimited cell, quotes included.
    pub max_length: Option<usize>,
    pub padding: Padding,
    /// External text used when the cell is empty on parse or missing on compose.
    pub default_value: Option<String>,
    pub mandatory: bool,
    pub ignore_read: bool,
    pub ignore_write: bool,
    /// Regex the raw cell text must match for [`LineTyping::ByCondition`].
    pub line_condition: Option<String>,
}

impl Default for SchemaCell {
    fn default() -> Self {
        Self {
            name: String::new(),
            cell_type: CellType::String,
            format: None,
            locale: None,
            width: None,
            max_length: None,
            padding: Padding::default(),
            default_value: None,
            mandatory: false,
            ignore_read: false,
            ignore_write: false,
            line_condition: None,
        }
    }
}

impl SchemaCell {
    pub fn new(name: impl Into<String>, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            cell_type,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: FormatSpec) -> Self {
        self.format = Some(format);
        self
    }

    /// Shorthand for `with_format(FormatSpec::Pattern(..))`.
    pub fn with_pattern(self, pattern: impl Into<String>) -> Self {
        self.with_format(FormatSpec::Pattern(pattern.into()))
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_padding(mut self, policy: PadPolicy, fill: char) -> Self {
        self.padding = Padding { policy, fill };
        self
    }

    /// Text used for an empty cell on parse and a missing cell on compose. A mandatory cell
    /// is still reported first; the default applies when the action keeps the cell.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn ignore_read(mut self) -> Self {
        self.ignore_read = true;
        self
    }

    pub fn ignore_write(mut self) -> Self {
        self.ignore_write = true;
        self
    }

    pub fn with_line_condition(mut self, regex: impl Into<String>) -> Self {
        self.line_condition = Some(regex.into());
        self
    }
}

/// Definition of one line type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaLine {
    pub line_type: String,
    pub cells: Vec<SchemaCell>,
    pub delimiter: char,
    pub quoting: Quoting,
    pub first_line_as_header: bool,
    /// Total length of a fixed-width line; shorter composed lines are filled with `line_fill`.
    pub line_length: Option<usize>,
    pub line_fill: char,
    /// Deliver input columns beyond the schema as extra string cells.
    pub keep_extra_cells: bool,
    /// Lines of this type are recognized but not delivered by the parser.
    pub ignore_read: bool,
    /// Lines of this type are accepted but not written by the composer.
    pub ignore_write: bool,
    /// Text of the control cell selecting this line under [`LineTyping::ControlCell`].
    pub control_value: Option<String>,
}

impl Default for SchemaLine {
    fn default() -> Self {
        Self {
            line_type: String::new(),
            cells: Vec::new(),
            delimiter: ',',
            quoting: Quoting::default(),
            first_line_as_header: false,
            line_length: None,
            line_fill: ' ',
            keep_extra_cells: false,
            ignore_read: false,
            ignore_write: false,
            control_value: None,
        }
    }
}

impl SchemaLine {
    pub fn new(line_type: impl Into<String>) -> Self {
        Self {
            line_type: line_type.into(),
            ..Self::default()
        }
    }

    pub fn with_cell(mut self, cell: SchemaCell) -> Self {
        self.cells.push(cell);
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn with_header(mut self, first_line_as_header: bool) -> Self {
        self.first_line_as_header = first_line_as_header;
        self
    }

    pub fn with_line_length(mut self, line_length: usize, fill: char) -> Self {
        self.line_length = Some(line_length);
        self.line_fill = fill;
        self
    }

    pub fn with_keep_extra_cells(mut self, keep: bool) -> Self {
        self.keep_extra_cells = keep;
        self
    }

    pub fn with_control_value(mut self, value: impl Into<String>) -> Self {
        self.control_value = Some(value.into());
        self
    }

    pub fn ignore_read(mut self) -> Self {
        self.ignore_read = true;
        self
    }

    pub fn ignore_write(mut self) -> Self {
        self.ignore_write = true;
        self
    }

    pub fn cell(&self, name: &str) -> Option<&SchemaCell> {
        self.cells.iter().find(|c| c.name == name)
    }

    /// Column names, in order, of the cells written by the composer.
    pub fn header_names(&self) -> Vec<&str> {
        self.cells
            .iter()
            .filter(|c| !c.ignore_write)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// An ordered set of line definitions plus schema-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub kind: SchemaKind,
    /// Separator between physical lines. An empty separator on a fixed-width schema reads
    /// records of `line_length` characters.
    pub line_separator: String,
    pub line_typing: LineTyping,
    /// Default locale tag for numeric cells.
    pub locale: String,
    pub lines: Vec<SchemaLine>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            kind: SchemaKind::Delimited,
            line_separator: "\n".to_owned(),
            line_typing: LineTyping::Single,
            locale: String::new(),
            lines: Vec::new(),
        }
    }
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn delimited() -> Self {
        Self::new(SchemaKind::Delimited)
    }

    pub fn fixed_width() -> Self {
        Self::new(SchemaKind::FixedWidth)
    }

    /// Load a schema from its JSON representation.
    ///
    /// Only the shape is checked here; call [`Schema::validate`] (or construct an engine) to
    /// check formats and layout.
    pub fn from_json_str(json: &str) -> CodecResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> CodecResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_line(mut self, line: SchemaLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn with_line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }

    pub fn with_line_typing(mut self, typing: LineTyping) -> Self {
        self.line_typing = typing;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn line(&self, line_type: &str) -> Option<&SchemaLine> {
        self.lines.iter().find(|l| l.line_type == line_type)
    }

    /// Check the schema eagerly: layout rules, locales, regexes and every cell format.
    pub fn validate(&self) -> CodecResult<()> {
        plan::SchemaPlan::compile(self).map(|_| ())
    }

    pub(crate) fn fixed_record_length(&self) -> CodecResult<Option<usize>> {
        if self.kind != SchemaKind::FixedWidth || !self.line_separator.is_empty() {
            return Ok(None);
        }
        let mut lengths = self.lines.iter().map(|l| l.line_length);
        let first = lengths.next().flatten();
        match first {
            Some(len) if len > 0 && lengths.all(|l| l == Some(len)) => Ok(Some(len)),
            _ => Err(CodecError::config(
                "fixed-size records need the same non-zero line_length on every line",
            )),
        }
    }
}
